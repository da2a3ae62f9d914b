//! Expressions.
//!
//! ```text
//! expr    = postfix ("|" NAME args?)*
//! postfix = atom ("." NAME)*
//! atom    = literal | NAME | NAME args | list | hash | "(" expr ")"
//! ```

use crate::parser::{CompletedMarker, Parser};
use crate::syntax_kind::SyntaxKind;

const KEYWORDS: [&str; 4] = ["null", "none", "true", "false"];

/// Parse one expression. Reports an error and returns `None` when the
/// current token cannot start one.
pub(super) fn expr(p: &mut Parser<'_, '_>) -> Option<CompletedMarker> {
    let mut lhs = postfix(p)?;

    while p.at(SyntaxKind::PIPE) {
        let m = lhs.precede(p);
        p.bump();
        p.expect(SyntaxKind::NAME, "a filter name");
        if p.at(SyntaxKind::LPAREN) {
            arg_list(p);
        }
        lhs = m.complete(p, SyntaxKind::FILTER_EXPR);
    }

    Some(lhs)
}

fn postfix(p: &mut Parser<'_, '_>) -> Option<CompletedMarker> {
    let mut lhs = atom(p)?;

    while p.at(SyntaxKind::DOT) {
        let m = lhs.precede(p);
        p.bump();
        p.expect(SyntaxKind::NAME, "an attribute name");
        lhs = m.complete(p, SyntaxKind::ATTR_EXPR);
    }

    Some(lhs)
}

fn atom(p: &mut Parser<'_, '_>) -> Option<CompletedMarker> {
    let kind = match p.current() {
        SyntaxKind::INT | SyntaxKind::FLOAT | SyntaxKind::STRING => {
            let m = p.start();
            p.bump();
            return Some(m.complete(p, SyntaxKind::LITERAL));
        }
        SyntaxKind::NAME if KEYWORDS.contains(&p.current_text()) => SyntaxKind::LITERAL,
        SyntaxKind::NAME if p.nth(1) == SyntaxKind::LPAREN => {
            let m = p.start();
            p.bump();
            arg_list(p);
            return Some(m.complete(p, SyntaxKind::CALL_EXPR));
        }
        SyntaxKind::NAME => SyntaxKind::NAME_REF,
        SyntaxKind::LBRACKET => return Some(list(p)),
        SyntaxKind::LBRACE => return Some(hash(p)),
        SyntaxKind::LPAREN => {
            let m = p.start();
            p.bump();
            expr(p);
            p.expect(SyntaxKind::RPAREN, "\")\"");
            return Some(m.complete(p, SyntaxKind::PAREN_EXPR));
        }
        _ => {
            let found = p.describe_current();
            p.error(format!("Unexpected token {found}, expected an expression"));
            if p.at(SyntaxKind::ERROR_TOKEN) {
                let m = p.start();
                p.bump();
                m.complete(p, SyntaxKind::ERROR);
            }
            return None;
        }
    };

    let m = p.start();
    p.bump();
    Some(m.complete(p, kind))
}

/// `(a, b)`
fn arg_list(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump();
    separated(p, SyntaxKind::RPAREN, |p| expr(p).is_some());
    p.expect(SyntaxKind::RPAREN, "\")\"");
    m.complete(p, SyntaxKind::ARG_LIST);
}

/// `[a, b]`
fn list(p: &mut Parser<'_, '_>) -> CompletedMarker {
    let m = p.start();
    p.bump();
    separated(p, SyntaxKind::RBRACKET, |p| expr(p).is_some());
    p.expect(SyntaxKind::RBRACKET, "\"]\"");
    m.complete(p, SyntaxKind::LIST_EXPR)
}

/// `{key: value, 'other key': value}`
fn hash(p: &mut Parser<'_, '_>) -> CompletedMarker {
    let m = p.start();
    p.bump();
    separated(p, SyntaxKind::RBRACE, hash_entry);
    p.expect(SyntaxKind::RBRACE, "\"}\"");
    m.complete(p, SyntaxKind::HASH_EXPR)
}

fn hash_entry(p: &mut Parser<'_, '_>) -> bool {
    if !matches!(
        p.current(),
        SyntaxKind::NAME | SyntaxKind::STRING | SyntaxKind::INT
    ) {
        let found = p.describe_current();
        p.error(format!("Unexpected token {found}, expected a hash key"));
        return false;
    }

    let m = p.start();
    p.bump();
    let ok = p.expect(SyntaxKind::COLON, "\":\"") && expr(p).is_some();
    m.complete(p, SyntaxKind::HASH_ENTRY);
    ok
}

/// Comma separated items up to `closer`, trailing comma allowed.
fn separated(p: &mut Parser<'_, '_>, closer: SyntaxKind, mut item: impl FnMut(&mut Parser<'_, '_>) -> bool) {
    while !p.at(closer) && !p.at_end() {
        if !item(p) || !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
}
