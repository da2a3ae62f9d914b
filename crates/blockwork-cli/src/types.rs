//! Block types and theme fragments shipped with the command-line renderer.

use std::sync::Arc;

use blockwork_engine::types::{Confidence, TypeGuess, TypeGuesser};
use blockwork_engine::{
    Block, BlockHooks, BlockType, BlockTypeExtension, BlockView, Options, OptionsResolver, Result,
    Value, ValueKind,
};
use blockwork_template::{Fragment, ThemeRenderer, escape};

/// A single-line text value.
pub struct TextType;

impl BlockHooks for TextType {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver.set_default("compound", false);
    }
}

impl BlockType for TextType {
    fn name(&self) -> &str {
        "text"
    }
}

/// A checkbox: a text block whose value is either checked or not.
pub struct CheckboxType;

impl BlockHooks for CheckboxType {
    fn build_view(
        &self,
        view: &mut BlockView,
        block: &Block,
        _parent: Option<&BlockView>,
        _options: &Options,
    ) -> Result<()> {
        view.set_var("checked", block.view_data().is_truthy());
        Ok(())
    }
}

impl BlockType for CheckboxType {
    fn name(&self) -> &str {
        "checkbox"
    }

    fn parent(&self) -> Option<&str> {
        Some("text")
    }
}

/// A group of blocks with an optional legend.
pub struct PanelType;

impl BlockHooks for PanelType {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver
            .set_default("legend", Value::Null)
            .set_allowed_kinds("legend", &[ValueKind::Null, ValueKind::String]);
    }

    fn build_view(
        &self,
        view: &mut BlockView,
        _block: &Block,
        _parent: Option<&BlockView>,
        options: &Options,
    ) -> Result<()> {
        view.set_var("legend", options.value("legend").clone());
        Ok(())
    }
}

impl BlockType for PanelType {
    fn name(&self) -> &str {
        "panel"
    }
}

/// Adds a `help` text to text blocks and everything built on them.
pub struct HelpExtension;

impl BlockHooks for HelpExtension {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver
            .set_default("help", Value::Null)
            .set_allowed_kinds("help", &[ValueKind::Null, ValueKind::String]);
    }

    fn build_view(
        &self,
        view: &mut BlockView,
        _block: &Block,
        _parent: Option<&BlockView>,
        options: &Options,
    ) -> Result<()> {
        view.set_var("help", options.value("help").clone());
        Ok(())
    }
}

impl BlockTypeExtension for HelpExtension {
    fn extended_type(&self) -> &str {
        "text"
    }
}

/// Guesses a type from the property name alone.
pub struct PropertyNameGuesser;

impl TypeGuesser for PropertyNameGuesser {
    fn guess_type(&self, _class: &str, property: &str) -> Option<TypeGuess> {
        if property.starts_with("is_") || property.starts_with("has_") {
            return Some(TypeGuess::new("checkbox", Options::new(), Confidence::High));
        }
        Some(TypeGuess::new("text", Options::new(), Confidence::Low))
    }
}

pub enum Builtin {
    Type(Arc<dyn BlockType>),
    Extension(Arc<dyn BlockTypeExtension>),
    Guesser(Arc<dyn TypeGuesser>),
}

/// The built-in service implementing `class`.
pub fn builtin(class: &str) -> Option<Builtin> {
    Some(match class {
        "text" => Builtin::Type(Arc::new(TextType)),
        "checkbox" => Builtin::Type(Arc::new(CheckboxType)),
        "panel" => Builtin::Type(Arc::new(PanelType)),
        "help" => Builtin::Extension(Arc::new(HelpExtension)),
        "property_name_guesser" => Builtin::Guesser(Arc::new(PropertyNameGuesser)),
        _ => return None,
    })
}

/// The default theme plus fragments for the built-in types.
pub fn theme() -> ThemeRenderer {
    let mut theme = ThemeRenderer::with_default_theme();
    theme
        .add_fragment(
            "checkbox_widget",
            Fragment::native(|ctx| {
                let checked = if ctx.var("checked").is_some_and(Value::is_truthy) {
                    " checked"
                } else {
                    ""
                };
                Ok(format!(
                    "<input type=\"checkbox\" id=\"{}\"{checked}>",
                    escape(&ctx.var_str("id"))
                ))
            }),
        )
        .add_fragment(
            "panel_widget",
            Fragment::native(|ctx| {
                let mut html = format!("<fieldset id=\"{}\">", escape(&ctx.var_str("id")));
                let legend = ctx.var_str("legend");
                if !legend.is_empty() {
                    html.push_str(&format!("<legend>{}</legend>", escape(&legend)));
                }
                html.push_str(&ctx.var_str("body"));
                for child in ctx.unrendered_children() {
                    html.push_str(&ctx.render_child(&child, "row")?);
                }
                html.push_str("</fieldset>");
                Ok(html)
            }),
        )
        .add_fragment(
            "text_row",
            Fragment::native(|ctx| {
                let label = ctx.render_role("label")?;
                let widget = ctx.render_role("widget")?;
                let help = ctx.var_str("help");
                let help = if help.is_empty() {
                    String::new()
                } else {
                    format!("<small>{}</small>", escape(&help))
                };
                Ok(format!("<div>{label}{widget}{help}</div>"))
            }),
        );
    theme
}
