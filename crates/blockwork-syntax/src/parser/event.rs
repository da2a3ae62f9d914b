//! Parser events: the flat description of a tree that the sink turns into a
//! Rowan green tree.
//!
//! ```text
//! Start(PRINT)
//!   Token(PRINT_OPEN)
//!   Start(NAME_REF)
//!     Token(NAME)
//!   Finish
//!   Token(PRINT_CLOSE)
//! Finish
//! ```

use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new composite node. `forward_parent` points at the `Start` of
    /// a node created later with `precede()` that must wrap this one.
    Start {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },

    /// Add the next lexer token to the current node.
    Token { kind: SyntaxKind },

    Finish,

    /// Reserved by `start()`; replaced on completion, ignored if abandoned.
    Placeholder,
}

impl Event {
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start {
            kind,
            forward_parent: None,
        }
    }

    pub fn token(kind: SyntaxKind) -> Self {
        Event::Token { kind }
    }
}
