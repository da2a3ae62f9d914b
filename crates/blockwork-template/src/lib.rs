//! # blockwork-template
//!
//! Renders templates that invoke blocks. A [`TemplateExtension`] compiles
//! template source with the tags of every registered block type, builds the
//! block tree of each invocation through the engine and hands the resulting
//! views to a [`BlockRenderer`].
//!
//! ```text
//! source → CompiledTemplate → Scope (eval) → BlockFactory → BlockView
//!                                                  ↓
//!                                 BlockRenderer (theme fragments) → HTML
//! ```
//!
//! [`ThemeRenderer`] looks fragments up by `<prefix>_<role>`, where the
//! prefixes come from the view's `block_prefixes`. Fragments are either Rust
//! closures or templates themselves, which may call `block_widget`,
//! `block_label`, `block_row` and `block_component` on the view they render.

pub mod error;
mod eval;
pub mod extension;
pub mod renderer;
pub mod template;

pub use error::{RenderError, Result};
pub use extension::TemplateExtension;
pub use renderer::{
    ASSETS_ROLE, BlockRenderer, COMPONENT_ROLE, Fragment, FragmentContext, LABEL_ROLE, ROW_ROLE,
    ThemeRenderer, WIDGET_ROLE, escape, humanize,
};
pub use template::CompiledTemplate;
