use std::collections::BTreeMap;
use std::sync::Arc;

use blockwork_engine::{
    BlockError, BlockFactory, BlockHooks, BlockRegistry, BlockType, Callable, OptionsResolver,
    PreloadedExtension, Value, core_extension,
};
use blockwork_syntax::{TagSet, TemplateError};
use blockwork_template::{Fragment, RenderError, TemplateExtension, ThemeRenderer};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// A type that only changes the `compound` default.
struct Widget {
    name: &'static str,
    compound: bool,
}

impl BlockHooks for Widget {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver.set_default("compound", self.compound);
    }
}

impl BlockType for Widget {
    fn name(&self) -> &str {
        self.name
    }
}

fn registry() -> Arc<BlockRegistry> {
    let types = PreloadedExtension::new()
        .add_type(Widget {
            name: "text",
            compound: false,
        })
        .add_type(Widget {
            name: "panel",
            compound: true,
        });
    Arc::new(BlockRegistry::new(vec![Box::new(core_extension()), Box::new(types)]).unwrap())
}

fn tags() -> TagSet {
    TagSet::new(registry().list_registered_type_names())
}

fn extension_with(theme: ThemeRenderer) -> TemplateExtension {
    TemplateExtension::new(BlockFactory::new(registry()), Arc::new(theme))
}

fn render(source: &str) -> Result<String, RenderError> {
    render_with(ThemeRenderer::with_default_theme(), source, BTreeMap::new())
}

fn render_with(
    theme: ThemeRenderer,
    source: &str,
    vars: BTreeMap<String, Value>,
) -> Result<String, RenderError> {
    extension_with(theme).render_str(source, &vars)
}

fn vars(pairs: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[test]
fn raw_blocks_render_their_value_unescaped() {
    assert_eq!(render("{% sblock_raw data='<b>hi</b>' :%}").unwrap(), "<b>hi</b>");
}

#[test]
fn simple_blocks_escape_their_value() {
    assert_eq!(
        render("{% sblock 'text', {data: '<b>hi</b>'} :%}").unwrap(),
        "&lt;b&gt;hi&lt;/b&gt;"
    );
}

#[test]
fn compound_blocks_render_a_row_per_child() {
    let source = "{% sblock_panel id='form' %}\n  \
                  {% sblock_text block_name='first_name' data='Ada' :%}\n  \
                  {% sblock_text block_name='age' data=36 label='Age (years)' :%}\n\
                  {% endsblock_panel %}";

    assert_eq!(
        render(source).unwrap(),
        "<div id=\"form\">\
         <div><label for=\"form_first_name\">First name</label>Ada</div>\
         <div><label for=\"form_age\">Age (years)</label>36</div>\
         </div>"
    );
}

#[test]
fn with_variables_override_view_variables() {
    assert_eq!(
        render("{% sblock_text data='x' with {value: 'override'} :%}").unwrap(),
        "override"
    );
}

#[test]
fn child_variables_reach_the_child_view() {
    let source = "{% sblock_panel id='p' %}{% sblock_text block_name='a' with {label: 'Given'} :%}{% endsblock %}";
    assert_eq!(
        render(source).unwrap(),
        "<div id=\"p\"><div><label for=\"p_a\">Given</label></div></div>"
    );
}

#[test]
fn body_is_rendered_into_the_widget() {
    let output = render_with(
        ThemeRenderer::with_default_theme(),
        "{% sblock_panel id='p' %}<p>{{ title }}</p>{% endsblock_panel %}",
        vars(vec![("title", Value::from("A & B"))]),
    )
    .unwrap();

    assert_eq!(output, "<div id=\"p\"><p>A &amp; B</p></div>");
}

#[test]
fn children_rendered_in_the_body_are_not_rendered_again() {
    let source = "{% sblock_panel id='p' %}<em>{{ block_widget('name') }}</em>\
                  {% sblock_text block_name='name' data='Ada' :%}\
                  {% sblock_text block_name='other' data='B' :%}{% endsblock %}";

    assert_eq!(
        render(source).unwrap(),
        "<div id=\"p\"><em>Ada</em><div><label for=\"p_other\">Other</label>B</div></div>"
    );
}

#[test]
fn rendering_a_child_twice_fails() {
    let source = "{% sblock_panel id='p' %}{{ block_row('a') }}{{ block_row('a') }}\
                  {% sblock_text block_name='a' :%}{% endsblock %}";

    assert_eq!(
        render(source).unwrap_err(),
        RenderError::Block(BlockError::AlreadyRendered("a".to_string()))
    );
}

#[test]
fn rendering_an_unknown_child_fails() {
    assert_eq!(
        render("{% sblock_panel id='p' %}{{ block_widget('ghost') }}{% endsblock %}").unwrap_err(),
        RenderError::Block(BlockError::ChildNotFound {
            parent: "p".to_string(),
            name: "ghost".to_string(),
        })
    );
}

#[test]
fn template_fragments_override_the_default_theme() {
    let mut theme = ThemeRenderer::with_default_theme();
    theme
        .add_template_fragment("text_widget", "<input id=\"{{ id }}\" value=\"{{ value }}\">", &tags())
        .unwrap();

    assert_eq!(
        render_with(theme, "{% sblock_text id='n' data='\"q\"' :%}", BTreeMap::new()).unwrap(),
        "<input id=\"n\" value=\"&quot;q&quot;\">"
    );
}

#[test]
fn template_fragments_render_roles_of_their_view() {
    let mut theme = ThemeRenderer::with_default_theme();
    theme
        .add_template_fragment("text_row", "<li>{{ block_label() }}{{ block_widget() }}</li>", &tags())
        .unwrap();

    assert_eq!(
        render_with(
            theme,
            "{% sblock_panel id='p' %}{% sblock_text block_name='a' data='x' :%}{% endsblock %}",
            BTreeMap::new()
        )
        .unwrap(),
        "<div id=\"p\"><li><label for=\"p_a\">A</label>x</li></div>"
    );
}

#[test]
fn unique_block_prefix_fragments_win() {
    let mut theme = ThemeRenderer::with_default_theme();
    theme.add_fragment("_special_widget", Fragment::native(|_| Ok("special".to_string())));

    assert_eq!(
        render_with(
            theme,
            "{% sblock_text id='special' :%}{% sblock_text id='plain' data='p' :%}",
            BTreeMap::new()
        )
        .unwrap(),
        "specialp"
    );
}

#[rstest]
#[case("{% sblock_text id='n' data='v' :%}", "v<script src=\"n.js\"></script>")]
#[case("{% sblock_text id='n' data='v' with noassets :%}", "v")]
#[case("{% sblock_text id='n' data='v' with {}, noassets :%}", "v")]
#[case("{{ sblock_text({id: 'n', data: 'v'}) }}", "v<script src=\"n.js\"></script>")]
#[case("{{ sblock('text', {id: 'n', data: 'v'}, {}, false) }}", "v")]
fn assets_follow_the_widget_unless_disabled(#[case] source: &str, #[case] expected: &str) {
    let mut theme = ThemeRenderer::with_default_theme();
    theme.add_fragment(
        "text_assets",
        Fragment::native(|ctx| Ok(format!("<script src=\"{}.js\"></script>", ctx.var_str("id")))),
    );

    assert_eq!(render_with(theme, source, BTreeMap::new()).unwrap(), expected);
}

#[test]
fn sblock_function_outputs_html_without_double_escaping() {
    assert_eq!(render("<p>{{ sblock('text', {data: 'a<'}) }}</p>").unwrap(), "<p>a&lt;</p>");
}

#[test]
fn callable_labels_are_resolved_against_the_view() {
    let labeler = Callable::new(|view| Value::from(view.var_str("id").to_uppercase()));
    let output = render_with(
        ThemeRenderer::with_default_theme(),
        "{% sblock_panel id='p' %}{% sblock_text block_name='a' label=labeler :%}{% endsblock %}",
        vars(vec![("labeler", Value::Callable(labeler))]),
    )
    .unwrap();

    assert_eq!(output, "<div id=\"p\"><div><label for=\"p_a\">P_A</label></div></div>");
}

#[rstest]
#[case("{{ html }}", "&lt;i&gt;")]
#[case("{{ html|raw }}", "<i>")]
#[case("{{ html|e }}", "&lt;i&gt;")]
#[case("{{ 'fooBar_baz'|block_humanize }}", "Foo bar baz")]
#[case("{{ 42|block_formatter('text') }}", "42")]
#[case("{{ 'plain'|raw_closure }}", "plain")]
#[case("{{ missing }}", "")]
#[case("{{ user.name }}", "Ada")]
fn expressions_and_filters(#[case] source: &str, #[case] expected: &str) {
    let vars = vars(vec![
        ("html", Value::from("<i>")),
        ("user", Value::map([("name", Value::from("Ada"))])),
    ]);
    assert_eq!(
        render_with(ThemeRenderer::with_default_theme(), source, vars).unwrap(),
        expected
    );
}

#[rstest]
#[case(
    "{% sblock 1 :%}",
    RenderError::Block(BlockError::InvalidConfiguration(
        "The block type of \"sblock\" at line 1 must be a string, got int".to_string()
    ))
)]
#[case("{% sblock 'nope' :%}", RenderError::Block(BlockError::UnknownType("nope".to_string())))]
#[case("\n{{ nope() }}", RenderError::UnknownFunction { name: "nope".to_string(), line: 2 })]
#[case("{{ 'a'|upper }}", RenderError::UnknownFilter { name: "upper".to_string(), line: 1 })]
#[case(
    "{{ block_widget() }}",
    RenderError::Evaluation {
        message: "The \"block_widget\" function can only be used while rendering a block".to_string(),
        line: 1,
    }
)]
#[case(
    "{% sblock_text 'label' :%}",
    RenderError::Evaluation { message: "Expected a hash, got string".to_string(), line: 1 }
)]
#[case(
    "{{ sblock() }}",
    RenderError::Template(TemplateError::InvalidConfiguration {
        message: "The block type must be present in the \"sblock\" function".to_string(),
        line: 1,
    })
)]
fn render_errors(#[case] source: &str, #[case] expected: RenderError) {
    assert_eq!(render(source).unwrap_err(), expected);
}

#[test]
fn missing_fragments_list_every_candidate() {
    assert_eq!(
        render_with(ThemeRenderer::new(), "{% sblock_text id='t' :%}", BTreeMap::new()).unwrap_err(),
        RenderError::MissingFragment {
            block: "t".to_string(),
            role: "widget".to_string(),
            candidates: vec![
                "_t_widget".to_string(),
                "text_widget".to_string(),
                "block_widget".to_string(),
            ],
        }
    );
}

#[test]
fn compiled_templates_render_repeatedly() {
    let extension = extension_with(ThemeRenderer::with_default_theme());
    let template = extension.compile("{% sblock_text data=name :%}").unwrap();

    for name in ["Ada", "Grace"] {
        let vars = vars(vec![("name", Value::from(name))]);
        assert_eq!(extension.render(&template, &vars).unwrap(), name);
    }
}

fn fragment_theme() -> ThemeRenderer {
    let mut theme = ThemeRenderer::with_default_theme();
    theme
        .add_template_fragment("greeting", "<p>Hello {{ who }}</p>", &tags())
        .unwrap()
        .add_fragment(
            "badge",
            Fragment::native(|ctx| Ok(format!("<b>{}</b>", ctx.var_str("count")))),
        );
    theme
}

#[rstest]
#[case("{{ block_fragment_render('greeting', {who: 'A&B'}) }}", "<p>Hello A&amp;B</p>")]
#[case("{{ block_fragment_render('greeting') }}", "<p>Hello </p>")]
#[case("{{ block_fragment_render('badge', {count: 3}) }}", "<b>3</b>")]
fn named_fragments_render_with_their_variables(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(
        render_with(fragment_theme(), source, BTreeMap::new()).unwrap(),
        expected
    );
}

#[test]
fn named_fragments_render_from_the_extension() {
    let extension = extension_with(fragment_theme());
    assert_eq!(
        extension
            .render_fragment("greeting", &vars(vec![("who", Value::from("Ada"))]))
            .unwrap(),
        "<p>Hello Ada</p>"
    );
    assert_eq!(
        extension.render_fragment("missing", &BTreeMap::new()).unwrap_err(),
        RenderError::UnknownFragment("missing".to_string())
    );
}
