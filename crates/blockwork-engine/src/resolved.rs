//! A type bound to its resolved parent chain and extensions.

use std::fmt;
use std::sync::{Arc, OnceLock};

use log::trace;

use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::Result;
use crate::factory::BlockFactory;
use crate::options::{Options, OptionsResolver};
use crate::types::{BlockHooks, BlockType, BlockTypeExtension};
use crate::view::BlockView;

/// Which implementation a hook entry came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookSource {
    Type(String),
    Extension { extended_type: String, index: usize },
}

#[derive(Clone)]
struct HookEntry {
    source: HookSource,
    hooks: Arc<dyn BlockHooks>,
}

/// Immutable after creation; shared between every block of the type.
pub struct ResolvedBlockType {
    inner: Arc<dyn BlockType>,
    parent: Option<Arc<ResolvedBlockType>>,
    extensions: Vec<Arc<dyn BlockTypeExtension>>,
    // root first, each level's type before its extensions
    chain: Vec<HookEntry>,
    prefixes: Vec<String>,
    resolver: OnceLock<OptionsResolver>,
}

impl ResolvedBlockType {
    pub fn new(
        inner: Arc<dyn BlockType>,
        parent: Option<Arc<ResolvedBlockType>>,
        extensions: Vec<Arc<dyn BlockTypeExtension>>,
    ) -> Self {
        let name = inner.name().to_string();

        let mut chain = parent
            .as_ref()
            .map(|p| p.chain.clone())
            .unwrap_or_default();
        let mut prefixes = parent
            .as_ref()
            .map(|p| p.prefixes.clone())
            .unwrap_or_default();

        let own: Arc<dyn BlockHooks> = inner.clone();
        chain.push(HookEntry {
            source: HookSource::Type(name.clone()),
            hooks: own,
        });
        for (index, extension) in extensions.iter().enumerate() {
            let hooks: Arc<dyn BlockHooks> = extension.clone();
            chain.push(HookEntry {
                source: HookSource::Extension {
                    extended_type: name.clone(),
                    index,
                },
                hooks,
            });
        }
        prefixes.push(name);

        Self {
            inner,
            parent,
            extensions,
            chain,
            prefixes,
            resolver: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn parent(&self) -> Option<&Arc<ResolvedBlockType>> {
        self.parent.as_ref()
    }

    pub fn inner_type(&self) -> &Arc<dyn BlockType> {
        &self.inner
    }

    pub fn type_extensions(&self) -> &[Arc<dyn BlockTypeExtension>] {
        &self.extensions
    }

    /// Type names from the root down to this type.
    pub fn block_prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// The order in which build hooks run.
    pub fn hook_sources(&self) -> Vec<&HookSource> {
        self.chain.iter().map(|e| &e.source).collect()
    }

    /// Whether `name` is this type or one of its ancestors.
    pub fn is_a(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| p == name)
    }

    /// The option schema of the whole chain, built on first use.
    pub fn options_resolver(&self) -> &OptionsResolver {
        self.resolver.get_or_init(|| {
            let mut resolver = OptionsResolver::new();
            for entry in &self.chain {
                entry.hooks.configure_options(&mut resolver);
            }
            resolver
        })
    }

    pub fn create_builder(
        self: &Arc<Self>,
        factory: &BlockFactory,
        name: &str,
        options: &Options,
    ) -> Result<BlockBuilder> {
        let resolved = self.options_resolver().resolve(options)?;
        Ok(BlockBuilder::new(
            name,
            Arc::clone(self),
            factory.clone(),
            resolved,
        ))
    }

    pub fn create_view(&self, block: &Block, _parent: Option<&BlockView>) -> BlockView {
        BlockView::new(block.name())
    }

    pub fn build_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<()> {
        for entry in &self.chain {
            trace!("build_block {:?} for \"{}\"", entry.source, builder.name());
            entry.hooks.build_block(builder, options)?;
        }
        Ok(())
    }

    pub fn build_view(
        &self,
        view: &mut BlockView,
        block: &Block,
        parent: Option<&BlockView>,
        options: &Options,
    ) -> Result<()> {
        for entry in &self.chain {
            entry.hooks.build_view(view, block, parent, options)?;
        }
        Ok(())
    }

    /// Runs the chain in reverse: extensions before their type, leaf before root.
    pub fn finish_view(&self, view: &mut BlockView, block: &Block, options: &Options) -> Result<()> {
        for entry in self.chain.iter().rev() {
            entry.hooks.finish_view(view, block, options)?;
        }
        Ok(())
    }

    pub fn add_child(&self, child: &Block, block: &Block, options: &Options) -> Result<()> {
        for entry in &self.chain {
            entry.hooks.add_child(child, block, options)?;
        }
        Ok(())
    }

    pub fn remove_child(&self, child: &Block, block: &Block, options: &Options) -> Result<()> {
        for entry in &self.chain {
            entry.hooks.remove_child(child, block, options)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ResolvedBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBlockType")
            .field("name", &self.name())
            .field("prefixes", &self.prefixes)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
