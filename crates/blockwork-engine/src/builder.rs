//! Mutable configuration of a block before it is finalized.

use std::sync::Arc;

use log::debug;

use crate::block::{Block, BlockConfig};
use crate::error::{BlockError, Result};
use crate::event::{BlockEvent, BlockEvents, EventDispatcher};
use crate::factory::BlockFactory;
use crate::options::Options;
use crate::property_path::PropertyPath;
use crate::resolved::ResolvedBlockType;
use crate::transformer::{DataTransformer, SharedTransformer};
use crate::value::Value;

pub struct BlockBuilder {
    name: String,
    block_type: Arc<ResolvedBlockType>,
    factory: BlockFactory,
    options: Options,
    children: Vec<BlockBuilder>,
    data: Option<Value>,
    model_transformers: Vec<SharedTransformer>,
    view_transformers: Vec<SharedTransformer>,
    dispatcher: EventDispatcher,
    mapped: bool,
    property_path: Option<PropertyPath>,
    hooks_applied: bool,
    locked: bool,
}

impl BlockBuilder {
    pub(crate) fn new(
        name: &str,
        block_type: Arc<ResolvedBlockType>,
        factory: BlockFactory,
        options: Options,
    ) -> Self {
        Self {
            name: name.to_string(),
            block_type,
            factory,
            options,
            children: Vec::new(),
            data: None,
            model_transformers: Vec::new(),
            view_transformers: Vec::new(),
            dispatcher: EventDispatcher::default(),
            mapped: true,
            property_path: None,
            hooks_applied: false,
            locked: false,
        }
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(BlockError::AlreadyFinalized(self.name.clone()));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block_type(&self) -> &Arc<ResolvedBlockType> {
        &self.block_type
    }

    pub fn factory(&self) -> &BlockFactory {
        &self.factory
    }

    /// The resolved options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Add a child builder. Names must be unique among siblings.
    pub fn add(&mut self, child: BlockBuilder) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        if self.has(&child.name) {
            return Err(BlockError::DuplicateChildName {
                parent: self.name.clone(),
                name: child.name,
            });
        }
        self.children.push(child);
        Ok(self)
    }

    /// Create a child builder of `type_name` through the factory and add it.
    pub fn add_type(&mut self, name: &str, type_name: &str, options: Options) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        let child = self
            .factory
            .create_named_builder(name, type_name, None, options)?;
        self.add(child)
    }

    pub fn remove(&mut self, name: &str) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        let index = self
            .children
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| BlockError::ChildNotFound {
                parent: self.name.clone(),
                name: name.to_string(),
            })?;
        self.children.remove(index);
        Ok(self)
    }

    pub fn has(&self, name: &str) -> bool {
        self.children.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&BlockBuilder> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut BlockBuilder> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn children(&self) -> &[BlockBuilder] {
        &self.children
    }

    pub fn set_data(&mut self, data: impl Into<Value>) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.data = Some(data.into());
        Ok(self)
    }

    /// Whether data was set explicitly, including an explicit null.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn add_model_transformer<T: DataTransformer + 'static>(
        &mut self,
        transformer: T,
    ) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.model_transformers.push(Arc::new(transformer));
        Ok(self)
    }

    pub fn add_view_transformer<T: DataTransformer + 'static>(
        &mut self,
        transformer: T,
    ) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.view_transformers.push(Arc::new(transformer));
        Ok(self)
    }

    pub fn add_event_listener<F>(
        &mut self,
        event: BlockEvents,
        priority: i32,
        listener: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&mut BlockEvent<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.ensure_unlocked()?;
        self.dispatcher.add_listener(event, priority, Arc::new(listener));
        Ok(self)
    }

    pub fn set_mapped(&mut self, mapped: bool) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.mapped = mapped;
        Ok(self)
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn set_property_path(&mut self, path: Option<PropertyPath>) -> Result<&mut Self> {
        self.ensure_unlocked()?;
        self.property_path = path;
        Ok(self)
    }

    /// Run the build hooks and produce the block with all of its children.
    /// The builder tree is locked once the whole block is built; after a
    /// failure it stays usable and the build hooks are not run again.
    pub fn get_block(&mut self) -> Result<Block> {
        let block = self.finalize()?;
        self.lock();

        debug!(
            "finalized block \"{}\" of type \"{}\" with {} child(ren)",
            block.name(),
            block.config().block_type().name(),
            block.children().len()
        );
        Ok(block)
    }

    fn finalize(&mut self) -> Result<Block> {
        self.ensure_unlocked()?;

        let block_type = Arc::clone(&self.block_type);
        let options = self.options.clone();
        if !self.hooks_applied {
            block_type.build_block(self, &options)?;
            self.hooks_applied = true;
        }

        let config = Arc::new(BlockConfig::new(
            self.name.clone(),
            block_type,
            options,
            self.model_transformers.clone(),
            self.view_transformers.clone(),
            self.dispatcher.clone(),
            self.mapped,
            self.property_path.clone(),
        ));

        let mut block = Block::new(config);
        block.set_data(self.data.clone().unwrap_or_default())?;

        for child in &mut self.children {
            let child_block = child.finalize()?;
            block.add(child_block)?;
        }
        Ok(block)
    }

    fn lock(&mut self) {
        self.locked = true;
        for child in &mut self.children {
            child.lock();
        }
    }
}
