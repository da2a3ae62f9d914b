//! The template-facing side of blocks: tags, functions and filters.

use std::collections::BTreeMap;
use std::sync::Arc;

use blockwork_engine::util::block_name;
use blockwork_engine::{Block, BlockFactory, BlockView, Options, Value};
use blockwork_syntax::{TagSet, TemplateError};
use log::debug;

use crate::error::Result;
use crate::eval::Scope;
use crate::renderer::{ASSETS_ROLE, BlockRenderer, WIDGET_ROLE};
use crate::template::CompiledTemplate;

/// Ties a block factory to a renderer and knows the template tags of every
/// registered block type.
#[derive(Clone)]
pub struct TemplateExtension {
    factory: BlockFactory,
    renderer: Arc<dyn BlockRenderer>,
    tags: TagSet,
}

impl TemplateExtension {
    pub fn new(factory: BlockFactory, renderer: Arc<dyn BlockRenderer>) -> Self {
        let tags = TagSet::new(factory.registry().list_registered_type_names());
        debug!("Template tags: {}", tags.tag_names().join(", "));
        Self {
            factory,
            renderer,
            tags,
        }
    }

    pub fn factory(&self) -> &BlockFactory {
        &self.factory
    }

    pub fn renderer(&self) -> &dyn BlockRenderer {
        self.renderer.as_ref()
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// `sblock` followed by one `sblock_<type>` tag per registered type.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.tag_names()
    }

    pub fn compile(&self, source: &str) -> Result<CompiledTemplate, TemplateError> {
        CompiledTemplate::compile(source, &self.tags)
    }

    pub fn render(&self, template: &CompiledTemplate, vars: &BTreeMap<String, Value>) -> Result<String> {
        let mut out = String::new();
        Scope::new(self, vars, None).render_nodes(&template.template().nodes, &mut out)?;
        Ok(out)
    }

    /// Compile and render in one go.
    pub fn render_str(&self, source: &str, vars: &BTreeMap<String, Value>) -> Result<String> {
        let template = self.compile(source)?;
        self.render(&template, vars)
    }

    /// Create a block named after its `block_name` or `id` option.
    pub fn create_named(&self, block_type: &str, options: Options) -> Result<Block> {
        let name = block_name(&options);
        Ok(self.factory.create_named(&name, block_type, None, options)?)
    }

    /// Create a block of `block_type` and render its widget, followed by its
    /// assets when `render_assets` is set.
    pub fn create_and_render_superblock(
        &self,
        block_type: &str,
        options: Options,
        variables: &BTreeMap<String, Value>,
        render_assets: bool,
    ) -> Result<String> {
        let block = self.create_named(block_type, options)?;
        debug!("Rendering block \"{}\" of type \"{block_type}\"", block.name());

        let mut view = block.create_view()?;
        let mut html = self
            .renderer
            .search_and_render_block(self, &mut view, WIDGET_ROLE, variables)?;
        if render_assets {
            html.push_str(&self.renderer.search_and_render_block(self, &mut view, ASSETS_ROLE, variables)?);
        }
        Ok(html)
    }

    /// Render the theme fragment `name` with `variables`, outside of any block.
    pub fn render_fragment(&self, name: &str, variables: &BTreeMap<String, Value>) -> Result<String> {
        self.renderer.render_named_fragment(self, name, variables)
    }

    /// Call `value` with the view when it is a callable, else return it.
    pub fn raw_closure(value: Value, view: &BlockView) -> Value {
        match value {
            Value::Callable(callable) => callable.call(view),
            other => other,
        }
    }

    /// The view data of a throwaway block holding `value`.
    pub fn formatter(&self, value: Value, block_type: &str, mut options: Options) -> Result<Value> {
        options.insert("data", value);
        let block = self.create_named(block_type, options)?;
        Ok(block.view_data().clone())
    }
}

impl std::fmt::Debug for TemplateExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateExtension")
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwork_engine::{BlockRegistry, Callable, core_extension};
    use pretty_assertions::assert_eq;

    use crate::renderer::ThemeRenderer;

    fn extension() -> TemplateExtension {
        let registry = BlockRegistry::new(vec![Box::new(core_extension())]).unwrap();
        TemplateExtension::new(
            BlockFactory::new(Arc::new(registry)),
            Arc::new(ThemeRenderer::with_default_theme()),
        )
    }

    #[test]
    fn tags_follow_registered_types() {
        assert_eq!(extension().tag_names(), vec!["sblock", "sblock_block", "sblock_raw"]);
    }

    #[test]
    fn raw_closure_calls_callables_with_the_view() {
        let view = BlockView::new("title");
        let label = Value::Callable(Callable::new(|view: &BlockView| Value::from(view.name().to_uppercase())));
        assert_eq!(TemplateExtension::raw_closure(label, &view), Value::from("TITLE"));
        assert_eq!(TemplateExtension::raw_closure(Value::from(3), &view), Value::from(3));
    }

    #[test]
    fn formatter_returns_view_data() {
        let formatted = extension()
            .formatter(Value::from(42), "raw", Options::new())
            .unwrap();
        assert_eq!(formatted, Value::from(42));
    }

    #[test]
    fn created_blocks_take_their_name_from_options() {
        let block = extension()
            .create_named("raw", Options::new().with("id", "price"))
            .unwrap();
        assert_eq!(block.name(), "price");
    }
}
