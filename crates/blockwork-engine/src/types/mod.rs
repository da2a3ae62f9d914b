//! Block type and type extension contracts.
//!
//! Both share the [`BlockHooks`] shape. A resolved type flattens its parent
//! chain and extensions into one ordered list of hook implementations, so
//! nothing here relies on inheritance between types.

mod core;
mod guess;

pub use self::core::{BASE_TYPE, BaseType, RawType, core_extension};
pub use guess::{Confidence, TypeGuess, TypeGuesser, TypeGuesserChain};

use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::Result;
use crate::options::{Options, OptionsResolver};
use crate::view::BlockView;

/// Lifecycle hooks shared by types and type extensions. All hooks default to
/// doing nothing.
pub trait BlockHooks: Send + Sync {
    /// Contribute defaults, kinds and validators to the option schema.
    fn configure_options(&self, _resolver: &mut OptionsResolver) {}

    /// Configure a builder while it is being finalized.
    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<()> {
        Ok(())
    }

    /// Called before the children of the view are built. `parent` is the
    /// already-built parent view, if any.
    fn build_view(
        &self,
        _view: &mut BlockView,
        _block: &Block,
        _parent: Option<&BlockView>,
        _options: &Options,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after all child views exist.
    fn finish_view(&self, _view: &mut BlockView, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn add_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn remove_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }
}

/// A named, reusable block definition.
pub trait BlockType: BlockHooks {
    fn name(&self) -> &str;

    /// Name of the parent type; `None` only for the root type.
    fn parent(&self) -> Option<&str> {
        Some(BASE_TYPE)
    }
}

/// Behaviour bound to an existing type without modifying it.
pub trait BlockTypeExtension: BlockHooks {
    fn extended_type(&self) -> &str;
}
