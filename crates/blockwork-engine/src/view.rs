//! The renderable tree produced from a block.

use std::collections::BTreeMap;

use crate::error::{BlockError, Result};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockView {
    name: String,
    vars: BTreeMap<String, Value>,
    children: Vec<BlockView>,
    rendered: bool,
    rerender_allowed: bool,
}

impl BlockView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vars(&self) -> &BTreeMap<String, Value> {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.vars
    }

    pub fn var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// String variable, or `""` when absent or not a string.
    pub fn var_str(&self, key: &str) -> &str {
        self.vars.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Overlay `vars` on the existing variables.
    pub fn merge_vars(&mut self, vars: BTreeMap<String, Value>) {
        self.vars.extend(vars);
    }

    pub fn children(&self) -> &[BlockView] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&BlockView> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut BlockView> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn add_child(&mut self, child: BlockView) -> Result<()> {
        if self.child(&child.name).is_some() {
            return Err(BlockError::DuplicateChildName {
                parent: self.name.clone(),
                name: child.name,
            });
        }
        self.children.push(child);
        Ok(())
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Record that the view was rendered. A second render fails unless
    /// re-rendering was allowed.
    pub fn set_rendered(&mut self) -> Result<()> {
        if self.rendered && !self.rerender_allowed {
            return Err(BlockError::AlreadyRendered(self.name.clone()));
        }
        self.rendered = true;
        Ok(())
    }

    pub fn allow_rerender(&mut self, allowed: bool) {
        self.rerender_allowed = allowed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn view_is_not_rendered_by_default() {
        assert!(!BlockView::new("foo").is_rendered());
    }

    #[test]
    fn second_render_fails_unless_allowed() {
        let mut view = BlockView::new("foo");
        view.set_rendered().unwrap();
        assert_eq!(
            view.set_rendered(),
            Err(BlockError::AlreadyRendered("foo".to_string()))
        );

        view.allow_rerender(true);
        assert!(view.set_rendered().is_ok());
    }

    #[test]
    fn children_keep_insertion_order_and_unique_names() {
        let mut view = BlockView::new("root");
        view.add_child(BlockView::new("b")).unwrap();
        view.add_child(BlockView::new("a")).unwrap();
        assert!(view.add_child(BlockView::new("a")).is_err());

        let names: Vec<&str> = view.children().iter().map(BlockView::name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn merge_overrides_existing_vars() {
        let mut view = BlockView::new("foo");
        view.set_var("label", "Old");
        view.set_var("id", "foo");
        view.merge_vars(BTreeMap::from([("label".to_string(), Value::from("New"))]));

        assert_eq!(view.var_str("label"), "New");
        assert_eq!(view.var_str("id"), "foo");
        assert_eq!(view.var_str("missing"), "");
    }
}
