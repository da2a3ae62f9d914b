//! Paths binding a block to a location inside its parent's data.

use std::fmt;

use crate::error::{BlockError, Result};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    /// `foo` or `.foo`
    Property(String),
    /// `[foo]` or `[0]`
    Index(String),
}

/// A parsed path such as `address.lines[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    path: String,
    elements: Vec<PathElement>,
}

impl PropertyPath {
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            BlockError::InvalidArgument(format!("invalid property path \"{path}\": {reason}"))
        };

        if path.is_empty() {
            return Err(invalid("the path must not be empty"));
        }

        let mut elements = Vec::new();
        let mut rest = path;
        let mut first = true;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let end = after.find(']').ok_or_else(|| invalid("unclosed \"[\""))?;
                let index = &after[..end];
                if index.is_empty() {
                    return Err(invalid("empty index"));
                }
                elements.push(PathElement::Index(index.to_string()));
                rest = &after[end + 1..];
            } else {
                let body = if first {
                    rest
                } else {
                    rest.strip_prefix('.')
                        .ok_or_else(|| invalid("expected \".\" or \"[\""))?
                };
                let end = body.find(['.', '[']).unwrap_or(body.len());
                let name = &body[..end];
                if name.is_empty() || name.contains(']') {
                    return Err(invalid("empty or malformed property name"));
                }
                elements.push(PathElement::Property(name.to_string()));
                rest = &body[end..];
            }
            first = false;
        }

        Ok(Self {
            path: path.to_string(),
            elements,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Read the value at this path, if every step exists.
    pub fn get_value<'v>(&self, data: &'v Value) -> Option<&'v Value> {
        let mut current = data;
        for element in &self.elements {
            current = match (element, current) {
                (PathElement::Property(key) | PathElement::Index(key), Value::Map(map)) => {
                    map.get(key)?
                }
                (PathElement::Index(index), Value::List(items)) => {
                    items.get(index.parse::<usize>().ok()?)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
