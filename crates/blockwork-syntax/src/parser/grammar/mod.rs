//! # Grammar Rules
//!
//! Each function takes a `&mut Parser` and uses its methods to inspect the
//! current token (`p.current()`, `p.at()`, `p.nth()`), consume tokens
//! (`p.bump()`, `p.eat()`) and build tree structure (`p.start()` then
//! `complete()`/`abandon()`).
//!
//! ## Module Structure
//!
//! - [`superblock`] - `{% sblock %}` tags, their clauses, bodies and end tags
//! - [`expr`] - expressions inside `{{ }}` and tag arguments
//!
//! ## Error Recovery
//!
//! Every problem is reported through `p.error()`. The grammar then skips to
//! the closer of the current code region, wrapping the skipped tokens in an
//! ERROR node, so the tree still preserves all input bytes.

mod expr;
mod superblock;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse the whole template.
pub fn template(p: &mut Parser<'_, '_>) {
    let m = p.start();

    while !p.at_end() {
        element(p);
    }
    // whitespace left behind by an unterminated code region
    p.bump_trivia();

    m.complete(p, SyntaxKind::TEMPLATE);
}

/// Parse one text run, print, comment or tag.
fn element(p: &mut Parser<'_, '_>) {
    match p.current() {
        SyntaxKind::TEXT | SyntaxKind::COMMENT => p.bump(),
        SyntaxKind::PRINT_OPEN => print(p),
        SyntaxKind::TAG_OPEN => tag(p),
        _ => {
            // Leftovers of a code region whose closer never came
            let found = p.describe_current();
            p.error(format!("Unexpected token {found}"));
            let m = p.start();
            p.bump();
            m.complete(p, SyntaxKind::ERROR);
        }
    }
}

/// `{{ expr }}`
fn print(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump();

    expr::expr(p);
    recover_until(p, SyntaxKind::PRINT_CLOSE, "\"}}\"");
    p.expect(SyntaxKind::PRINT_CLOSE, "\"}}\"");

    m.complete(p, SyntaxKind::PRINT);
}

/// `{% name ... %}`
fn tag(p: &mut Parser<'_, '_>) {
    let name = if p.nth(1) == SyntaxKind::NAME {
        p.nth_text(1)
    } else {
        ""
    };

    if p.tags().contains(name) {
        superblock::superblock(p);
        return;
    }

    if name.is_empty() {
        p.error("A tag must start with a name");
    } else if name.starts_with("end") {
        p.error(format!("Unexpected \"{name}\" tag"));
    } else {
        p.error(format!("Unknown \"{name}\" tag"));
    }

    let m = p.start();
    while !p.at_end() && !p.at(SyntaxKind::TAG_CLOSE) {
        p.bump();
    }
    p.eat(SyntaxKind::TAG_CLOSE);
    m.complete(p, SyntaxKind::ERROR);
}

/// Report and skip everything up to `closer` (exclusive).
fn recover_until(p: &mut Parser<'_, '_>, closer: SyntaxKind, what: &str) {
    if p.at(closer) || p.at_end() {
        return;
    }

    let found = p.describe_current();
    p.error(format!("Unexpected token {found}, expected {what}"));

    let m = p.start();
    while !p.at(closer) && !p.at_end() {
        p.bump();
    }
    m.complete(p, SyntaxKind::ERROR);
}
