use std::sync::Arc;

use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::Result;
use crate::options::Options;
use crate::registry::BlockRegistry;
use crate::value::Value;

/// Entry point for creating blocks and builders by type name.
#[derive(Clone)]
pub struct BlockFactory {
    registry: Arc<BlockRegistry>,
}

impl BlockFactory {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Create a block named after its type.
    pub fn create(&self, type_name: &str, data: Option<Value>, options: Options) -> Result<Block> {
        self.create_builder(type_name, data, options)?.get_block()
    }

    pub fn create_named(
        &self,
        name: &str,
        type_name: &str,
        data: Option<Value>,
        options: Options,
    ) -> Result<Block> {
        self.create_named_builder(name, type_name, data, options)?
            .get_block()
    }

    pub fn create_builder(
        &self,
        type_name: &str,
        data: Option<Value>,
        options: Options,
    ) -> Result<BlockBuilder> {
        let block_type = self.registry.resolve_type(type_name)?;
        let name = block_type.name().to_string();
        self.create_named_builder(&name, type_name, data, options)
    }

    /// `data`, when given, becomes the `data` option.
    pub fn create_named_builder(
        &self,
        name: &str,
        type_name: &str,
        data: Option<Value>,
        mut options: Options,
    ) -> Result<BlockBuilder> {
        let block_type = self.registry.resolve_type(type_name)?;
        if let Some(data) = data {
            options.insert("data", data);
        }
        block_type.create_builder(self, name, &options)
    }
}
