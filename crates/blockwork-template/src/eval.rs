//! Expression evaluation and template node rendering.

use std::collections::BTreeMap;

use blockwork_engine::util::block_name;
use blockwork_engine::{BlockBuilder, BlockError, BlockView, Options, Value};
use blockwork_syntax::{Expr, Node, SBLOCK, SHORTHAND_PREFIX, SuperblockNode};
use log::{debug, trace};

use crate::error::{RenderError, Result};
use crate::extension::TemplateExtension;
use crate::renderer::{ASSETS_ROLE, WIDGET_ROLE, escape, humanize};

/// Renders a named theme fragment: `block_fragment_render(name, vars)`.
const FRAGMENT_RENDER: &str = "block_fragment_render";

/// Roles reachable through the `block_<role>` functions.
const RENDER_ROLES: [&str; 4] = ["widget", "label", "row", "component"];

/// Evaluation state for one render call: template variables plus the view
/// being rendered, when inside a fragment or a block body.
pub(crate) struct Scope<'a> {
    env: &'a TemplateExtension,
    vars: &'a BTreeMap<String, Value>,
    view: Option<&'a mut BlockView>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        env: &'a TemplateExtension,
        vars: &'a BTreeMap<String, Value>,
        view: Option<&'a mut BlockView>,
    ) -> Self {
        Self { env, vars, view }
    }

    pub(crate) fn render_nodes(&mut self, nodes: &[Node], out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Print { expr, .. } => {
                    let value = self.eval(expr)?.to_canonical_string();
                    if is_safe(expr) {
                        out.push_str(&value);
                    } else {
                        out.push_str(&escape(&value));
                    }
                }
                Node::Superblock(superblock) => self.render_superblock(superblock, out)?,
            }
        }
        Ok(())
    }

    /// Build the block tree of an invocation, render its bodies, then its
    /// widget and assets.
    fn render_superblock(&mut self, node: &SuperblockNode, out: &mut String) -> Result<()> {
        let (mut builder, plan) = self.plan(node)?;
        let block = builder.get_block()?;
        let mut view = block.create_view()?;
        debug!(
            "Rendering \"{}\" invocation at line {} as block \"{}\"",
            node.tag,
            node.line,
            block.name()
        );

        for child in &plan.children {
            self.prepare_child(child, &mut view)?;
        }
        self.render_body(node, &mut view)?;

        let variables = to_map(self.eval(&node.variables)?, node.line)?;
        let renderer = self.env.renderer();
        out.push_str(&renderer.search_and_render_block(self.env, &mut view, WIDGET_ROLE, &variables)?);
        self.render_assets(&plan, &mut view, &variables, out)
    }

    /// Evaluate an invocation and its children into builders, remembering
    /// the names the blocks received.
    fn plan<'n>(&mut self, node: &'n SuperblockNode) -> Result<(BlockBuilder, Planned<'n>)> {
        let block_type = match self.eval(&node.block_type)? {
            Value::String(name) => name,
            other => {
                return Err(BlockError::InvalidConfiguration(format!(
                    "The block type of \"{}\" at line {} must be a string, got {}",
                    node.tag,
                    node.line,
                    other.kind()
                ))
                .into());
            }
        };
        let options = to_options(self.eval(&node.options)?, node.line)?;
        let name = block_name(&options);

        let mut builder =
            self.env
                .factory()
                .create_named_builder(&name, &block_type, None, options)?;
        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let (child_builder, child_plan) = self.plan(child)?;
            builder.add(child_builder)?;
            children.push(child_plan);
        }

        Ok((
            builder,
            Planned {
                node,
                name,
                children,
            },
        ))
    }

    /// Merge a child invocation's variables into its view and render its
    /// body, deepest children first.
    fn prepare_child(&mut self, plan: &Planned<'_>, parent: &mut BlockView) -> Result<()> {
        let variables = to_map(self.eval(&plan.node.variables)?, plan.node.line)?;
        let Some(view) = parent.child_mut(&plan.name) else {
            debug!("Block \"{}\" has no child view \"{}\"", parent.name(), plan.name);
            return Ok(());
        };
        view.merge_vars(variables);

        for child in &plan.children {
            self.prepare_child(child, view)?;
        }
        self.render_body(plan.node, view)
    }

    fn render_body(&mut self, node: &SuperblockNode, view: &mut BlockView) -> Result<()> {
        let Some(body) = &node.body else {
            return Ok(());
        };

        let mut html = String::new();
        Scope::new(self.env, self.vars, Some(&mut *view)).render_nodes(body, &mut html)?;
        view.set_var("body", html);
        Ok(())
    }

    fn render_assets(
        &mut self,
        plan: &Planned<'_>,
        view: &mut BlockView,
        variables: &BTreeMap<String, Value>,
        out: &mut String,
    ) -> Result<()> {
        if self.eval(&plan.node.render_assets)?.is_truthy() {
            let renderer = self.env.renderer();
            out.push_str(&renderer.search_and_render_block(self.env, view, ASSETS_ROLE, variables)?);
        }

        let none = BTreeMap::new();
        for child in &plan.children {
            if let Some(child_view) = view.child_mut(&child.name) {
                self.render_assets(child, child_view, &none, out)?;
            }
        }
        Ok(())
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value> {
        Ok(match expr {
            Expr::Null => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(i) => Value::Int(*i),
            Expr::Float(f) => Value::Float(*f),
            Expr::Str(s) => Value::String(s.clone()),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => Value::List(self.eval_all(items)?),
            Expr::Hash(pairs) => {
                let mut map = BTreeMap::new();
                for (key, value) in pairs {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Value::Map(map)
            }
            Expr::Attr { target, name } => self.eval(target)?.get(name).cloned().unwrap_or_default(),
            Expr::Call { name, args, line } => self.call(name, args, *line)?,
            Expr::Filter {
                input,
                name,
                args,
                line,
            } => {
                let value = self.eval(input)?;
                let args = self.eval_all(args)?;
                self.filter(name, value, args, *line)?
            }
        })
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn lookup(&self, name: &str) -> Value {
        if let Some(value) = self.vars.get(name) {
            return value.clone();
        }
        if let Some(value) = self.view.as_deref().and_then(|v| v.var(name)) {
            return value.clone();
        }
        trace!("Undefined template variable \"{name}\"");
        Value::Null
    }

    fn call(&mut self, name: &str, args: &[Expr], line: usize) -> Result<Value> {
        if name == SBLOCK {
            let mut args = self.eval_all(args)?.into_iter();
            let block_type = args.next().unwrap_or_default();
            return self.create_and_render(block_type, args, line);
        }

        if name == FRAGMENT_RENDER {
            let mut args = self.eval_all(args)?.into_iter();
            let Value::String(fragment) = args.next().unwrap_or_default() else {
                return Err(RenderError::Evaluation {
                    message: format!("The \"{FRAGMENT_RENDER}\" function expects a fragment name"),
                    line,
                });
            };
            let variables = to_map(args.next().unwrap_or_default(), line)?;
            return self.env.render_fragment(&fragment, &variables).map(Value::String);
        }

        if let Some(implied) = self.env.tags().shorthand_type(name) {
            let block_type = Value::from(implied);
            let args = self.eval_all(args)?.into_iter();
            return self.create_and_render(block_type, args, line);
        }

        if let Some(role) = name.strip_prefix("block_")
            && RENDER_ROLES.contains(&role)
        {
            return self.render_role(name, role, args, line);
        }

        Err(RenderError::UnknownFunction {
            name: name.to_string(),
            line,
        })
    }

    fn create_and_render(
        &mut self,
        block_type: Value,
        mut args: impl Iterator<Item = Value>,
        line: usize,
    ) -> Result<Value> {
        let Value::String(block_type) = block_type else {
            return Err(BlockError::InvalidConfiguration(format!(
                "The block type passed to \"{SBLOCK}\" at line {line} must be a string, got {}",
                block_type.kind()
            ))
            .into());
        };
        let options = to_options(args.next().unwrap_or_default(), line)?;
        let variables = to_map(args.next().unwrap_or_default(), line)?;
        let render_assets = args.next().is_none_or(|v| v.is_truthy());

        self.env
            .create_and_render_superblock(&block_type, options, &variables, render_assets)
            .map(Value::String)
    }

    /// `block_<role>()` renders the current view, `block_<role>('child')`
    /// one of its children.
    fn render_role(&mut self, function: &str, role: &str, args: &[Expr], line: usize) -> Result<Value> {
        let mut args = self.eval_all(args)?.into_iter();
        let target = args.next().unwrap_or_default();
        let variables = to_map(args.next().unwrap_or_default(), line)?;

        let env = self.env;
        let Some(view) = self.view.as_deref_mut() else {
            return Err(RenderError::Evaluation {
                message: format!("The \"{function}\" function can only be used while rendering a block"),
                line,
            });
        };

        let renderer = env.renderer();
        let html = match target {
            Value::Null => renderer.render_fragment(env, view, role, &variables)?,
            Value::String(child) => match view.child_mut(&child) {
                Some(child_view) => renderer.search_and_render_block(env, child_view, role, &variables)?,
                None => {
                    return Err(BlockError::ChildNotFound {
                        parent: view.name().to_string(),
                        name: child,
                    }
                    .into());
                }
            },
            other => {
                return Err(RenderError::Evaluation {
                    message: format!("The \"{function}\" function expects a child name, got {}", other.kind()),
                    line,
                });
            }
        };
        Ok(Value::String(html))
    }

    fn filter(&mut self, name: &str, value: Value, args: Vec<Value>, line: usize) -> Result<Value> {
        match name {
            "raw" => Ok(value),
            "escape" | "e" => Ok(Value::String(escape(&value.to_canonical_string()))),
            "block_humanize" => Ok(Value::String(humanize(&value.to_canonical_string()))),
            "raw_closure" => match self.view.as_deref() {
                Some(view) => Ok(TemplateExtension::raw_closure(value, view)),
                None if !matches!(value, Value::Callable(_)) => Ok(value),
                None => Err(RenderError::Evaluation {
                    message: "The \"raw_closure\" filter needs a block view to call a closure".to_string(),
                    line,
                }),
            },
            "block_formatter" => {
                let mut args = args.into_iter();
                let Some(Value::String(block_type)) = args.next() else {
                    return Err(RenderError::Evaluation {
                        message: "The \"block_formatter\" filter expects a block type name".to_string(),
                        line,
                    });
                };
                let options = to_options(args.next().unwrap_or_default(), line)?;
                self.env.formatter(value, &block_type, options)
            }
            _ => Err(RenderError::UnknownFilter {
                name: name.to_string(),
                line,
            }),
        }
    }
}

/// An invocation paired with the name its block received.
struct Planned<'n> {
    node: &'n SuperblockNode,
    name: String,
    children: Vec<Planned<'n>>,
}

/// Expressions whose output is already HTML and must not be escaped again.
fn is_safe(expr: &Expr) -> bool {
    match expr {
        Expr::Call { name, .. } => {
            name == SBLOCK
                || name == FRAGMENT_RENDER
                || name.starts_with(SHORTHAND_PREFIX)
                || name
                    .strip_prefix("block_")
                    .is_some_and(|role| RENDER_ROLES.contains(&role))
        }
        Expr::Filter { name, .. } => {
            matches!(name.as_str(), "raw" | "escape" | "e" | "block_formatter")
        }
        _ => false,
    }
}

fn to_options(value: Value, line: usize) -> Result<Options> {
    to_map(value, line).map(Options::from)
}

fn to_map(value: Value, line: usize) -> Result<BTreeMap<String, Value>> {
    match value {
        Value::Map(map) => Ok(map),
        Value::Null => Ok(BTreeMap::new()),
        other => Err(RenderError::Evaluation {
            message: format!("Expected a hash, got {}", other.kind()),
            line,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn call(name: &str) -> Expr {
        Expr::Call {
            name: name.to_string(),
            args: vec![],
            line: 1,
        }
    }

    fn filter(name: &str) -> Expr {
        Expr::Filter {
            input: Box::new(Expr::Null),
            name: name.to_string(),
            args: vec![],
            line: 1,
        }
    }

    #[rstest]
    #[case(call("sblock"), true)]
    #[case(call("sblock_text"), true)]
    #[case(call("block_row"), true)]
    #[case(call("block_assets"), false)]
    #[case(filter("raw"), true)]
    #[case(filter("block_formatter"), true)]
    #[case(filter("block_humanize"), false)]
    #[case(Expr::Name("html".to_string()), false)]
    fn safe_expressions(#[case] expr: Expr, #[case] safe: bool) {
        assert_eq!(is_safe(&expr), safe);
    }

    #[test]
    fn hashes_become_option_maps() {
        let value = Value::map([("label", Value::from("Name"))]);
        let options = to_options(value, 1).unwrap();
        assert_eq!(options.get_str("label"), Some("Name"));
        assert!(to_options(Value::Null, 1).unwrap().is_empty());
    }

    #[test]
    fn non_hash_options_fail_with_line() {
        assert_eq!(
            to_map(Value::from(3), 7).unwrap_err(),
            RenderError::Evaluation {
                message: "Expected a hash, got int".to_string(),
                line: 7,
            }
        );
    }
}
