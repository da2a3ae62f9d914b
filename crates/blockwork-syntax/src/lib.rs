//! # blockwork-syntax
//!
//! Parses templates that invoke blocks through the `sblock` tag family,
//! using [Logos] for lexing and a [Rowan] concrete syntax tree.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Parser → Events → Sink → Rowan CST → Lowering → AST
//!          (Logos)          (Grammar)        (GreenNodeBuilder)  (superblock trees)
//! ```
//!
//! The CST keeps every byte of the source. Lowering turns it into the
//! [`ast::Template`] consumed by the renderer, nesting block invocations found
//! in a block body as that block's children.
//!
//! ## Template Language
//!
//! ```text
//! text {{ expr }} {# comment #}
//! {% sblock 'checkbox', {data: true} with {x: 1}, noassets :%}
//! {% sblock_panel label='Details' %} ... {% endsblock_panel %}
//! ```
//!
//! - `sblock` takes a type expression, `sblock_<type>` implies the type
//! - options are either one expression or `name=expr` attributes
//! - `with vars` adds render variables, `noassets` turns off asset rendering
//! - `:%}` closes the invocation without a body
//! - bodies end at `{% end<tag> %}` or `{% endsblock %}`
//!
//! ## Module Structure
//!
//! ```text
//! blockwork-syntax/
//! ├── lib.rs           # This file - public API and parsing tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes)
//! ├── lexer.rs         # Logos-based tokenizer with text and code modes
//! ├── tags.rs          # Known block tags
//! ├── ast.rs           # Typed template tree
//! ├── lower.rs         # CST → AST
//! ├── error.rs         # TemplateError
//! └── parser/
//!     ├── mod.rs       # Parser struct, Marker API
//!     ├── event.rs     # Event enum
//!     ├── sink.rs      # Events → Rowan tree
//!     └── grammar/     # Superblock and expression rules
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod syntax_kind;
pub mod tags;

pub use ast::{Expr, Node, SuperblockNode, Template};
pub use error::TemplateError;
pub use parser::{Parse, SyntaxError, parse};
pub use syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken, TemplateLang};
pub use tags::{SBLOCK, SHORTHAND_PREFIX, TagSet};

/// Parse and lower a template. The first syntax error wins.
pub fn parse_template(source: &str, tags: &TagSet) -> Result<Template, TemplateError> {
    let parse = parse(source, tags);
    if let Some(err) = parse.errors().first() {
        return Err(err.clone().into());
    }
    lower::lower(&parse.syntax(), tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tags() -> TagSet {
        TagSet::new(["checkbox", "text", "panel"])
    }

    fn hash(pairs: Vec<(&str, Expr)>) -> Expr {
        Expr::Hash(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn single_superblock(source: &str) -> SuperblockNode {
        let template = parse_template(source, &tags()).unwrap();
        match template.nodes.as_slice() {
            [Node::Superblock(node)] => node.clone(),
            other => panic!("expected one superblock, got {other:?}"),
        }
    }

    #[test]
    fn self_closing_generic_tag() {
        let node = single_superblock(
            r#"{% sblock 'checkbox', {data: true, label: "Bar"} with {x: 1}, noassets :%}"#,
        );

        assert_eq!(
            node,
            SuperblockNode {
                tag: "sblock".to_string(),
                line: 1,
                block_type: Expr::str("checkbox"),
                options: hash(vec![("data", Expr::Bool(true)), ("label", Expr::str("Bar"))]),
                variables: hash(vec![("x", Expr::Int(1))]),
                render_assets: Expr::Bool(false),
                children: vec![],
                body: None,
            }
        );
    }

    #[test]
    fn block_form_extracts_nested_invocations() {
        let source = "{% sblock 'panel', {label: 'Outer'} %}\n  \
                      {% sblock_checkbox data=true label='Bar' :%}\n  \
                      {{ sblock_text({data: 'x'}) }}\n\
                      {% endsblock %}";
        let node = single_superblock(source);

        assert_eq!(node.block_type, Expr::str("panel"));
        assert_eq!(node.options, hash(vec![("label", Expr::str("Outer"))]));
        assert_eq!(node.body, None);
        assert_eq!(
            node.children,
            vec![
                SuperblockNode {
                    tag: "sblock_checkbox".to_string(),
                    line: 2,
                    block_type: Expr::str("checkbox"),
                    options: hash(vec![("data", Expr::Bool(true)), ("label", Expr::str("Bar"))]),
                    variables: Expr::empty_hash(),
                    render_assets: Expr::Bool(true),
                    children: vec![],
                    body: None,
                },
                SuperblockNode {
                    tag: "sblock_text".to_string(),
                    line: 3,
                    block_type: Expr::str("text"),
                    options: hash(vec![("data", Expr::str("x"))]),
                    variables: Expr::empty_hash(),
                    render_assets: Expr::Bool(true),
                    children: vec![],
                    body: None,
                },
            ]
        );
    }

    #[test]
    fn body_with_content_is_kept() {
        let node = single_superblock(
            "{% sblock_panel %}<p>{{ title }}</p>{% sblock_text :%}{% endsblock_panel %}",
        );

        assert_eq!(node.children.len(), 1);
        assert_eq!(
            node.body,
            Some(vec![
                Node::Text("<p>".to_string()),
                Node::Print {
                    expr: Expr::Name("title".to_string()),
                    line: 1,
                },
                Node::Text("</p>".to_string()),
            ])
        );
    }

    #[test]
    fn with_noassets_alone_keeps_default_variables() {
        let node = single_superblock("{% sblock_checkbox with noassets :%}");
        assert_eq!(node.variables, Expr::empty_hash());
        assert_eq!(node.render_assets, Expr::Bool(false));
        assert_eq!(node.options, Expr::empty_hash());
    }

    #[test]
    fn single_options_expression() {
        let node = single_superblock("{% sblock_checkbox options :%}");
        assert_eq!(node.options, Expr::Name("options".to_string()));
    }

    #[test]
    fn attribute_names_may_be_strings_and_commas_are_optional() {
        let node = single_superblock("{% sblock_checkbox 'data'=1, label='A' block_name='b' :%}");
        assert_eq!(
            node.options,
            hash(vec![
                ("data", Expr::Int(1)),
                ("label", Expr::str("A")),
                ("block_name", Expr::str("b")),
            ])
        );
    }

    #[test]
    fn generic_call_inside_body_is_extracted() {
        let node = single_superblock(
            "{% sblock 'panel' %}{{ sblock('text', {}, {y: 2}, false) }}{% endsblock %}",
        );
        let child = &node.children[0];
        assert_eq!(child.block_type, Expr::str("text"));
        assert_eq!(child.variables, hash(vec![("y", Expr::Int(2))]));
        assert_eq!(child.render_assets, Expr::Bool(false));
    }

    #[test]
    fn other_calls_stay_in_the_body() {
        let node = single_superblock("{% sblock_panel %}{{ block_widget('x') }}{% endsblock %}");
        assert!(node.children.is_empty());
        assert_eq!(
            node.body,
            Some(vec![Node::Print {
                expr: Expr::Call {
                    name: "block_widget".to_string(),
                    args: vec![Expr::str("x")],
                    line: 1,
                },
                line: 1,
            }])
        );
    }

    #[test]
    fn expressions() {
        let template =
            parse_template("{{ (user.name|block_humanize)|default('x', [1, 2.5, null]) }}", &tags())
                .unwrap();
        let [Node::Print { expr, .. }] = template.nodes.as_slice() else {
            panic!("expected one print");
        };
        assert_eq!(
            *expr,
            Expr::Filter {
                input: Box::new(Expr::Filter {
                    input: Box::new(Expr::Attr {
                        target: Box::new(Expr::Name("user".to_string())),
                        name: "name".to_string(),
                    }),
                    name: "block_humanize".to_string(),
                    args: vec![],
                    line: 1,
                }),
                name: "default".to_string(),
                args: vec![
                    Expr::str("x"),
                    Expr::List(vec![Expr::Int(1), Expr::Float(2.5), Expr::Null]),
                ],
                line: 1,
            }
        );
    }

    #[test]
    fn text_and_comments() {
        let template = parse_template("a { b{# gone #}c", &tags()).unwrap();
        assert_eq!(template.nodes, vec![Node::Text("a { bc".to_string())]);
    }

    #[test]
    fn generic_call_without_type_fails() {
        let err = parse_template("\n\n{{ sblock() }}", &tags()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::InvalidConfiguration {
                message: "The block type must be present in the \"sblock\" function".to_string(),
                line: 3,
            }
        );
    }

    #[rstest]
    #[case("{% sblock_checkbox 1=2 :%}", "The attribute name \"1\" must be a string or a name", 1)]
    #[case(
        "{% sblock_checkbox data=true label 'x' :%}",
        "The attribute must be followed by the \"=\" operator",
        1
    )]
    #[case(
        "{% sblock 'panel' %}\nbody",
        "Unclosed \"sblock\" tag, expected \"endsblock\"",
        2
    )]
    #[case("{% if x %}", "Unknown \"if\" tag", 1)]
    #[case("x\n{% endsblock %}", "Unexpected \"endsblock\" tag", 2)]
    #[case("{% sblock_unknown :%}", "Unknown \"sblock_unknown\" tag", 1)]
    #[case("{{ a b }}", "Unexpected token \"b\", expected \"}}\"", 1)]
    #[case("{% sblock_checkbox {a: } :%}", "Unexpected token \"}\", expected an expression", 1)]
    fn syntax_errors(#[case] source: &str, #[case] message: &str, #[case] line: usize) {
        assert_eq!(
            parse_template(source, &tags()).unwrap_err(),
            TemplateError::Syntax {
                message: message.to_string(),
                line,
            }
        );
    }

    #[test]
    fn parse_keeps_lossless_tree_even_with_errors() {
        let input = "{% sblock 'a' with %}{{ [1, ? }}";
        let parse = parse(input, &tags());
        assert!(!parse.ok());
        assert_eq!(parse.syntax().text().to_string(), input);
    }
}
