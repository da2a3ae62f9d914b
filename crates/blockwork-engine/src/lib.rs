pub mod block;
pub mod builder;
pub mod error;
pub mod event;
pub mod factory;
pub mod options;
pub mod property_path;
pub mod registration;
pub mod registry;
pub mod resolved;
pub mod transformer;
pub mod types;
pub mod util;
pub mod value;
pub mod view;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use block::{Block, BlockConfig};
pub use builder::BlockBuilder;
pub use error::{BlockError, Result, TransformDirection};
pub use event::{BlockEvent, BlockEvents};
pub use factory::BlockFactory;
pub use options::{Options, OptionsResolver};
pub use property_path::PropertyPath;
pub use registry::{BlockExtension, BlockRegistry, PreloadedExtension};
pub use resolved::{HookSource, ResolvedBlockType};
pub use transformer::{CallbackTransformer, DataTransformer, TransformError};
pub use types::{BlockHooks, BlockType, BlockTypeExtension, core_extension};
pub use value::{Callable, Value, ValueKind};
pub use view::BlockView;
