//! # Parser - Event-Based Tree Construction
//!
//! Grammar functions never build the tree directly. They emit a flat list of
//! [`Event`]s through [`Marker`]s, and the [`Sink`] turns the events into a
//! Rowan tree afterwards.
//!
//! ```ignore
//! let m = p.start();
//! p.bump();
//! m.complete(p, SyntaxKind::NAME_REF);
//! ```
//!
//! A marker dropped without `complete()` or `abandon()` panics.
//! `CompletedMarker::precede()` wraps an already parsed node in a new parent,
//! which is how filters and calls are parsed after their operand.
//!
//! Whitespace inside code regions is trivia: lookahead skips it and `bump()`
//! attaches it to the tree before the next significant token.
//!
//! Unlike a lenient document parser, template errors are reported: each
//! problem is recorded as a [`SyntaxError`] with its 1-based line while the
//! parser recovers and keeps building a complete tree.

pub mod event;
pub mod sink;

mod grammar;

use rowan::GreenNode;

use crate::lexer::{Token, lex};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use crate::tags::TagSet;
use event::Event;
use sink::Sink;

/// A syntax problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
}

/// Result of parsing: a complete tree plus any errors found on the way.
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
}

impl Parse {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    /// 1-based line on which each token starts
    lines: Vec<usize>,
    /// Line on which the input ends
    end_line: usize,
    pos: usize,
    events: Vec<Event>,
    errors: Vec<SyntaxError>,
    tags: &'t TagSet,
}

impl<'t, 'input> Parser<'t, 'input> {
    pub fn new(tokens: &'t [Token<'input>], tags: &'t TagSet) -> Self {
        let mut line = 1;
        let lines = tokens
            .iter()
            .map(|t| {
                let start = line;
                line += t.text.matches('\n').count();
                start
            })
            .collect();

        Self {
            tokens,
            lines,
            end_line: line,
            pos: 0,
            events: Vec::new(),
            errors: Vec::new(),
            tags,
        }
    }

    pub fn parse(mut self) -> Parse {
        grammar::template(&mut self);
        let green = Sink::new(self.tokens, self.events).finish();
        Parse {
            green,
            errors: self.errors,
        }
    }

    pub fn tags(&self) -> &TagSet {
        self.tags
    }

    /// Start a new node and return a marker. Pending trivia stays outside it.
    pub fn start(&mut self) -> Marker {
        self.bump_trivia();
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Index of the n-th significant token from the current position.
    fn nth_index(&self, n: usize) -> Option<usize> {
        self.tokens
            .iter()
            .enumerate()
            .skip(self.pos)
            .filter(|(_, t)| !t.kind.is_trivia())
            .nth(n)
            .map(|(i, _)| i)
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n significant tokens.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.nth_index(n)
            .map(|i| self.tokens[i].kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    pub fn nth_text(&self, n: usize) -> &'input str {
        self.nth_index(n).map(|i| self.tokens[i].text).unwrap_or("")
    }

    pub fn current_text(&self) -> &'input str {
        self.nth_text(0)
    }

    pub fn at_end(&self) -> bool {
        self.nth_index(0).is_none()
    }

    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// At a NAME token with the given text.
    pub fn at_name(&self, name: &str) -> bool {
        self.at(SyntaxKind::NAME) && self.current_text() == name
    }

    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume pending trivia and the current token.
    pub fn bump(&mut self) {
        self.bump_trivia();
        if let Some(token) = self.tokens.get(self.pos) {
            self.events.push(Event::token(token.kind));
            self.pos += 1;
        }
    }

    pub(crate) fn bump_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos)
            && token.kind.is_trivia()
        {
            self.events.push(Event::token(token.kind));
            self.pos += 1;
        }
    }

    /// Line of the current token, or the last line at the end.
    pub fn current_line(&self) -> usize {
        self.nth_index(0)
            .map(|i| self.lines[i])
            .unwrap_or(self.end_line)
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let line = self.current_line();
        self.errors.push(SyntaxError {
            message: message.into(),
            line,
        });
    }

    /// Describe the current token for error messages.
    pub fn describe_current(&self) -> String {
        if self.at_end() {
            "end of template".to_string()
        } else {
            format!("\"{}\"", self.current_text())
        }
    }

    /// Eat `kind` or report what was found instead.
    pub fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        let found = self.describe_current();
        self.error(format!("Unexpected token {found}, expected {what}"));
        false
    }
}

/// A marker for a node being constructed.
#[must_use = "Markers must be completed or abandoned, dropping them is a bug"]
pub struct Marker {
    pos: usize,
    completed: bool,
}

impl Marker {
    pub fn complete(mut self, p: &mut Parser<'_, '_>, kind: SyntaxKind) -> CompletedMarker {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::Start {
            kind,
            forward_parent: None,
        };
        p.events.push(Event::Finish);
        CompletedMarker { pos: self.pos }
    }

    /// Drop the node; its tokens stay in the enclosing node.
    pub fn abandon(mut self, p: &mut Parser<'_, '_>) {
        self.completed = true;
        if self.pos == p.events.len() - 1 {
            match p.events.pop() {
                Some(Event::Placeholder) => {}
                _ => unreachable!(),
            }
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be either completed or abandoned");
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    pos: usize,
}

impl CompletedMarker {
    /// Start a node that will become the parent of this one.
    pub fn precede(self, p: &mut Parser<'_, '_>) -> Marker {
        let new_pos = p.events.len();
        p.events.push(Event::Placeholder);

        if let Event::Start { forward_parent, .. } = &mut p.events[self.pos] {
            *forward_parent = Some(new_pos);
        }

        Marker {
            pos: new_pos,
            completed: false,
        }
    }
}

/// Parse template source into a syntax tree. `tags` decides which
/// `sblock_<type>` tags exist.
pub fn parse(source: &str, tags: &TagSet) -> Parse {
    let tokens = lex(source);
    Parser::new(&tokens, tags).parse()
}
