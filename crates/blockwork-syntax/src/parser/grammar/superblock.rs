//! Block invocation tags.
//!
//! ```text
//! {% sblock 'checkbox', {data: true} with {x: 1}, noassets :%}
//! {% sblock_checkbox data=true label='Bar' %} ... {% endsblock_checkbox %}
//! ```

use super::{element, expr, recover_until};
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;
use crate::tags::SBLOCK;

pub(super) fn superblock(p: &mut Parser<'_, '_>) {
    let m = p.start();
    let tag = p.nth_text(1);

    let self_closing = opening_tag(p, tag);
    if !self_closing {
        body(p, tag);
        end_tag(p, tag);
    }

    m.complete(p, SyntaxKind::SUPERBLOCK);
}

/// Parse the opening tag. Returns true when it ends with `:%}`.
fn opening_tag(p: &mut Parser<'_, '_>, tag: &str) -> bool {
    let m = p.start();
    p.bump(); // {%
    p.bump(); // tag name

    if tag == SBLOCK {
        let t = p.start();
        expr::expr(p);
        t.complete(p, SyntaxKind::TYPE_ARG);
        p.eat(SyntaxKind::COMMA);
    }

    if p.nth(1) == SyntaxKind::EQ {
        attr_list(p);
    } else if !at_clause_end(p) {
        let o = p.start();
        expr::expr(p);
        o.complete(p, SyntaxKind::OPTIONS);
    }

    if p.at_name("with") {
        with_clause(p);
    }

    let self_closing = p.eat(SyntaxKind::COLON);

    recover_until(p, SyntaxKind::TAG_CLOSE, "\"%}\"");
    p.expect(SyntaxKind::TAG_CLOSE, "\"%}\"");

    m.complete(p, SyntaxKind::SUPERBLOCK_OPEN);
    self_closing
}

fn at_clause_end(p: &Parser<'_, '_>) -> bool {
    p.at_name("with") || p.at(SyntaxKind::COLON) || p.at(SyntaxKind::TAG_CLOSE) || p.at_end()
}

/// `name=expr` pairs, optionally separated by commas.
fn attr_list(p: &mut Parser<'_, '_>) {
    let m = p.start();

    loop {
        let a = p.start();

        if !p.at(SyntaxKind::NAME) && !p.at(SyntaxKind::STRING) {
            let found = p.describe_current();
            p.error(format!("The attribute name {found} must be a string or a name"));
            a.abandon(p);
            break;
        }
        p.bump();

        if !p.eat(SyntaxKind::EQ) {
            p.error("The attribute must be followed by the \"=\" operator");
            a.complete(p, SyntaxKind::ATTR);
            break;
        }

        expr::expr(p);
        a.complete(p, SyntaxKind::ATTR);

        p.eat(SyntaxKind::COMMA);
        if at_clause_end(p) {
            break;
        }
    }

    m.complete(p, SyntaxKind::ATTR_LIST);
}

/// `with vars`, `with vars, noassets` or `with noassets`.
fn with_clause(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // with

    if !p.at_name("noassets") {
        let v = p.start();
        expr::expr(p);
        v.complete(p, SyntaxKind::VARIABLES);
        p.eat(SyntaxKind::COMMA);
    }

    if p.at_name("noassets") {
        p.bump();
    }

    m.complete(p, SyntaxKind::WITH_CLAUSE);
}

fn at_end_tag(p: &Parser<'_, '_>, tag: &str) -> bool {
    if !p.at(SyntaxKind::TAG_OPEN) || p.nth(1) != SyntaxKind::NAME {
        return false;
    }
    let name = p.nth_text(1);
    name.strip_prefix("end")
        .is_some_and(|ended| ended == SBLOCK || ended == tag)
}

fn body(p: &mut Parser<'_, '_>, tag: &str) {
    let m = p.start();

    while !p.at_end() && !at_end_tag(p, tag) {
        element(p);
    }

    m.complete(p, SyntaxKind::BODY);
}

fn end_tag(p: &mut Parser<'_, '_>, tag: &str) {
    if p.at_end() {
        let expected = if tag == SBLOCK {
            format!("\"end{SBLOCK}\"")
        } else {
            format!("\"end{tag}\" or \"end{SBLOCK}\"")
        };
        p.error(format!("Unclosed \"{tag}\" tag, expected {expected}"));
        return;
    }

    let m = p.start();
    p.bump(); // {%
    p.bump(); // end name
    recover_until(p, SyntaxKind::TAG_CLOSE, "\"%}\"");
    p.expect(SyntaxKind::TAG_CLOSE, "\"%}\"");
    m.complete(p, SyntaxKind::SUPERBLOCK_END);
}
