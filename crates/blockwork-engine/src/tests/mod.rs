//! Shared fixtures and cross-module tests of the build pipeline.

use std::sync::{Arc, Mutex};

use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::Result;
use crate::factory::BlockFactory;
use crate::options::{Options, OptionsResolver};
use crate::registry::{BlockExtension, BlockRegistry, PreloadedExtension};
use crate::types::{BlockHooks, BlockType, BlockTypeExtension, core_extension};
use crate::view::BlockView;


/// A type with no behaviour of its own.
pub struct NamedType {
    name: String,
    parent: Option<String>,
}

impl NamedType {
    pub fn new(name: &str, parent: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
        }
    }
}

impl BlockHooks for NamedType {}

impl BlockType for NamedType {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

impl From<NamedType> for Arc<dyn BlockType> {
    fn from(value: NamedType) -> Self {
        Arc::new(value)
    }
}

/// Registry with the core types plus `types`.
pub fn core_registry(types: Vec<Arc<dyn BlockType>>) -> BlockRegistry {
    let extra = types
        .into_iter()
        .fold(PreloadedExtension::new(), PreloadedExtension::add_shared_type);
    BlockRegistry::new(vec![Box::new(core_extension()), Box::new(extra)]).unwrap()
}

pub fn factory_with(extension: PreloadedExtension) -> BlockFactory {
    let extensions: Vec<Box<dyn BlockExtension>> =
        vec![Box::new(core_extension()), Box::new(extension)];
    BlockFactory::new(Arc::new(BlockRegistry::new(extensions).unwrap()))
}

pub type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: String) {
    journal.lock().unwrap().push(entry);
}

/// Type that logs each hook call as `label:hook`.
pub struct RecordingType {
    name: &'static str,
    parent: &'static str,
    journal: Journal,
}

impl RecordingType {
    pub fn new(name: &'static str, parent: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            parent,
            journal: Arc::clone(journal),
        }
    }
}

impl BlockHooks for RecordingType {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver.set_default("size", self.name);
    }

    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<()> {
        record(&self.journal, format!("{}:build_block", self.name));
        Ok(())
    }

    fn build_view(
        &self,
        _view: &mut BlockView,
        _block: &Block,
        _parent: Option<&BlockView>,
        _options: &Options,
    ) -> Result<()> {
        record(&self.journal, format!("{}:build_view", self.name));
        Ok(())
    }

    fn finish_view(&self, _view: &mut BlockView, _block: &Block, _options: &Options) -> Result<()> {
        record(&self.journal, format!("{}:finish_view", self.name));
        Ok(())
    }

    fn add_child(&self, child: &Block, _block: &Block, _options: &Options) -> Result<()> {
        record(&self.journal, format!("{}:add_child:{}", self.name, child.name()));
        Ok(())
    }

    fn remove_child(&self, child: &Block, _block: &Block, _options: &Options) -> Result<()> {
        record(
            &self.journal,
            format!("{}:remove_child:{}", self.name, child.name()),
        );
        Ok(())
    }
}

impl BlockType for RecordingType {
    fn name(&self) -> &str {
        self.name
    }

    fn parent(&self) -> Option<&str> {
        Some(self.parent)
    }
}

pub struct RecordingExtension {
    label: &'static str,
    extended: &'static str,
    journal: Journal,
}

impl RecordingExtension {
    pub fn new(label: &'static str, extended: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            extended,
            journal: Arc::clone(journal),
        }
    }
}

impl BlockHooks for RecordingExtension {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        let label = self.label;
        resolver.add_validator("size", &format!("rejected by {label}"), |v| {
            v.as_str() != Some("forbidden")
        });
    }

    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<()> {
        record(&self.journal, format!("{}:build_block", self.label));
        Ok(())
    }

    fn build_view(
        &self,
        _view: &mut BlockView,
        _block: &Block,
        _parent: Option<&BlockView>,
        _options: &Options,
    ) -> Result<()> {
        record(&self.journal, format!("{}:build_view", self.label));
        Ok(())
    }

    fn finish_view(&self, _view: &mut BlockView, _block: &Block, _options: &Options) -> Result<()> {
        record(&self.journal, format!("{}:finish_view", self.label));
        Ok(())
    }
}

impl BlockTypeExtension for RecordingExtension {
    fn extended_type(&self) -> &str {
        self.extended
    }
}
