//! Rendering block views through theme fragments.
//!
//! A fragment is named `<prefix>_<role>`. To render a role of a view, the
//! theme tries the view's `block_prefixes` from the most specific (the
//! unique prefix of that very block) down to the root type `block`, and
//! renders the first fragment it finds.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use blockwork_engine::{BlockView, Value};
use blockwork_syntax::{TagSet, TemplateError};
use log::{trace, warn};
use regex::Regex;

use crate::error::{RenderError, Result};
use crate::eval::Scope;
use crate::extension::TemplateExtension;
use crate::template::CompiledTemplate;

pub const WIDGET_ROLE: &str = "widget";
pub const LABEL_ROLE: &str = "label";
pub const ROW_ROLE: &str = "row";
pub const COMPONENT_ROLE: &str = "component";
pub const ASSETS_ROLE: &str = "assets";

/// Roles that consume a view; each view may be rendered in one of them once.
const MARKING_ROLES: [&str; 3] = [WIDGET_ROLE, ROW_ROLE, COMPONENT_ROLE];

pub trait BlockRenderer: Send + Sync {
    /// Render `role` of `view` without touching its rendered flag.
    fn render_fragment(
        &self,
        env: &TemplateExtension,
        view: &mut BlockView,
        role: &str,
        variables: &BTreeMap<String, Value>,
    ) -> Result<String>;

    /// Render `role` of `view`. Widget, row and component renders mark the
    /// view rendered and fail with `AlreadyRendered` the second time, unless
    /// the view allows re-rendering.
    fn search_and_render_block(
        &self,
        env: &TemplateExtension,
        view: &mut BlockView,
        role: &str,
        variables: &BTreeMap<String, Value>,
    ) -> Result<String> {
        let marks = MARKING_ROLES.contains(&role);
        if marks && view.is_rendered() {
            view.set_rendered()?;
        }

        let html = self.render_fragment(env, view, role, variables)?;

        if marks {
            view.set_rendered()?;
        }
        Ok(html)
    }

    /// Render the fragment called `name` on its own, with `variables` only.
    fn render_named_fragment(
        &self,
        _env: &TemplateExtension,
        name: &str,
        _variables: &BTreeMap<String, Value>,
    ) -> Result<String> {
        Err(RenderError::UnknownFragment(name.to_string()))
    }
}

pub type NativeFragment = dyn Fn(&mut FragmentContext<'_>) -> Result<String> + Send + Sync;

#[derive(Clone)]
pub enum Fragment {
    Native(Arc<NativeFragment>),
    Template(Arc<CompiledTemplate>),
}

impl Fragment {
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&mut FragmentContext<'_>) -> Result<String> + Send + Sync + 'static,
    {
        Fragment::Native(Arc::new(f))
    }
}

impl std::fmt::Debug for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fragment::Native(_) => f.write_str("Fragment::Native"),
            Fragment::Template(t) => f.debug_tuple("Fragment::Template").field(t).finish(),
        }
    }
}

/// What a native fragment sees: the view, its variables overlaid with the
/// render variables, and a way to render other roles.
pub struct FragmentContext<'a> {
    env: &'a TemplateExtension,
    view: &'a mut BlockView,
    variables: BTreeMap<String, Value>,
}

impl FragmentContext<'_> {
    pub fn view(&self) -> &BlockView {
        self.view
    }

    pub fn var(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Canonical string of a variable, `""` when absent.
    pub fn var_str(&self, key: &str) -> String {
        self.var(key).map(Value::to_canonical_string).unwrap_or_default()
    }

    pub fn is_compound(&self) -> bool {
        self.var("compound").is_some_and(Value::is_truthy)
    }

    /// Render another role of the same view.
    pub fn render_role(&mut self, role: &str) -> Result<String> {
        self.env
            .renderer()
            .render_fragment(self.env, self.view, role, &self.variables)
    }

    /// Render a role of a child view.
    pub fn render_child(&mut self, name: &str, role: &str) -> Result<String> {
        let env = self.env;
        match self.view.child_mut(name) {
            Some(child) => env
                .renderer()
                .search_and_render_block(env, child, role, &BTreeMap::new()),
            None => Err(blockwork_engine::BlockError::ChildNotFound {
                parent: self.view.name().to_string(),
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Names of the children that were not rendered yet, in order.
    pub fn unrendered_children(&self) -> Vec<String> {
        self.view
            .children()
            .iter()
            .filter(|c| !c.is_rendered())
            .map(|c| c.name().to_string())
            .collect()
    }
}

/// Renders views from a table of named fragments.
#[derive(Debug, Clone, Default)]
pub struct ThemeRenderer {
    fragments: HashMap<String, Fragment>,
}

impl ThemeRenderer {
    /// A theme without any fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in fragments for the `block` and `raw` types.
    pub fn with_default_theme() -> Self {
        let mut theme = Self::new();
        theme
            .add_fragment("block_widget", Fragment::native(block_widget))
            .add_fragment("block_label", Fragment::native(block_label))
            .add_fragment("block_row", Fragment::native(block_row))
            .add_fragment("block_component", Fragment::native(|ctx| ctx.render_role(WIDGET_ROLE)))
            .add_fragment("block_assets", Fragment::native(|_| Ok(String::new())))
            .add_fragment("raw_widget", Fragment::native(raw_widget));
        theme
    }

    pub fn add_fragment(&mut self, name: impl Into<String>, fragment: Fragment) -> &mut Self {
        let name = name.into();
        if self.fragments.insert(name.clone(), fragment).is_some() {
            warn!("Theme fragment \"{name}\" was replaced");
        }
        self
    }

    /// Compile `source` and register it as fragment `name`.
    pub fn add_template_fragment(
        &mut self,
        name: impl Into<String>,
        source: &str,
        tags: &TagSet,
    ) -> Result<&mut Self, TemplateError> {
        let template = CompiledTemplate::compile(source, tags)?;
        Ok(self.add_fragment(name, Fragment::Template(Arc::new(template))))
    }

    pub fn has_fragment(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    fn candidates(view: &BlockView, role: &str) -> Vec<String> {
        view.var("block_prefixes")
            .and_then(Value::as_list)
            .unwrap_or_default()
            .iter()
            .rev()
            .filter_map(Value::as_str)
            .map(|prefix| format!("{prefix}_{role}"))
            .collect()
    }
}

impl BlockRenderer for ThemeRenderer {
    fn render_fragment(
        &self,
        env: &TemplateExtension,
        view: &mut BlockView,
        role: &str,
        variables: &BTreeMap<String, Value>,
    ) -> Result<String> {
        let candidates = Self::candidates(view, role);
        let Some((name, fragment)) = candidates
            .iter()
            .find_map(|name| self.fragments.get(name).map(|f| (name, f)))
        else {
            return Err(RenderError::MissingFragment {
                block: view.name().to_string(),
                role: role.to_string(),
                candidates,
            });
        };
        trace!("Rendering block \"{}\" with fragment \"{name}\"", view.name());

        let mut merged = view.vars().clone();
        merged.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));

        match fragment {
            Fragment::Native(f) => f(&mut FragmentContext {
                env,
                view,
                variables: merged,
            }),
            Fragment::Template(template) => {
                let mut html = String::new();
                Scope::new(env, &merged, Some(view)).render_nodes(template.template().nodes.as_slice(), &mut html)?;
                Ok(html)
            }
        }
    }

    /// Native fragments see a detached view named after the fragment;
    /// template fragments are rendered outside of any block.
    fn render_named_fragment(
        &self,
        env: &TemplateExtension,
        name: &str,
        variables: &BTreeMap<String, Value>,
    ) -> Result<String> {
        let fragment = self
            .fragments
            .get(name)
            .ok_or_else(|| RenderError::UnknownFragment(name.to_string()))?;
        trace!("Rendering theme fragment \"{name}\"");

        match fragment {
            Fragment::Native(f) => {
                let mut view = BlockView::new(name);
                f(&mut FragmentContext {
                    env,
                    view: &mut view,
                    variables: variables.clone(),
                })
            }
            Fragment::Template(template) => {
                let mut html = String::new();
                Scope::new(env, variables, None).render_nodes(template.template().nodes.as_slice(), &mut html)?;
                Ok(html)
            }
        }
    }
}

fn block_widget(ctx: &mut FragmentContext<'_>) -> Result<String> {
    let body = ctx.var_str("body");
    if !ctx.is_compound() {
        return Ok(format!("{}{body}", escape(&ctx.var_str("value"))));
    }

    let mut html = format!("<div id=\"{}\">{body}", escape(&ctx.var_str("id")));
    for child in ctx.unrendered_children() {
        html.push_str(&ctx.render_child(&child, ROW_ROLE)?);
    }
    html.push_str("</div>");
    Ok(html)
}

fn block_label(ctx: &mut FragmentContext<'_>) -> Result<String> {
    let label = match ctx.var("label") {
        Some(value) => TemplateExtension::raw_closure(value.clone(), ctx.view()),
        None => Value::Null,
    };
    let text = if label.is_empty() {
        humanize(ctx.view().name())
    } else {
        label.to_canonical_string()
    };
    Ok(format!(
        "<label for=\"{}\">{}</label>",
        escape(&ctx.var_str("id")),
        escape(&text)
    ))
}

fn block_row(ctx: &mut FragmentContext<'_>) -> Result<String> {
    let label = ctx.render_role(LABEL_ROLE)?;
    let widget = ctx.render_role(WIDGET_ROLE)?;
    Ok(format!("<div>{label}{widget}</div>"))
}

fn raw_widget(ctx: &mut FragmentContext<'_>) -> Result<String> {
    Ok(format!("{}{}", ctx.var_str("value"), ctx.var_str("body")))
}

/// Escape text for HTML output.
pub fn escape(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Turn an identifier into a label: `"fooBar_baz"` becomes `"Foo bar baz"`.
pub fn humanize(text: &str) -> String {
    static UPPER: OnceLock<Regex> = OnceLock::new();
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let upper = UPPER.get_or_init(|| Regex::new(r"([A-Z])").expect("Invalid uppercase regex"));
    let separators =
        SEPARATORS.get_or_init(|| Regex::new(r"[_\s]+").expect("Invalid separator regex"));

    let split = upper.replace_all(text, "_$1");
    let spaced = separators.replace_all(&split, " ");
    let lower = spaced.trim().to_lowercase();

    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
