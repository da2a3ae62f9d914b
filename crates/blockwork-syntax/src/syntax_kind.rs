//! SyntaxKind enum for all tokens and nodes in the template CST.
//!
//! Tokens and nodes share a single enum. Every byte of the source appears as
//! a token in the tree.

/// All syntax kinds for the template CST.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// Spaces, tabs and line endings inside `{{ }}` and `{% %}`
    WHITESPACE,
    /// Literal template text
    TEXT,
    /// `{# ... #}`
    COMMENT,
    /// `{{`
    PRINT_OPEN,
    /// `}}`
    PRINT_CLOSE,
    /// `{%`
    TAG_OPEN,
    /// `%}`
    TAG_CLOSE,
    NAME,
    INT,
    FLOAT,
    /// Single or double quoted string, quotes included
    STRING,
    LPAREN,
    RPAREN,
    LBRACKET,
    RBRACKET,
    LBRACE,
    RBRACE,
    COMMA,
    COLON,
    DOT,
    PIPE,
    EQ,
    /// A character the code lexer does not understand
    ERROR_TOKEN,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    TEMPLATE,
    /// `{{ expr }}`
    PRINT,
    /// A block invocation, from its opening tag to its end tag
    SUPERBLOCK,
    SUPERBLOCK_OPEN,
    SUPERBLOCK_END,
    /// Type expression of the generic `sblock` tag
    TYPE_ARG,
    /// `name=expr` pairs
    ATTR_LIST,
    ATTR,
    /// A single options expression
    OPTIONS,
    /// `with vars, noassets`
    WITH_CLAUSE,
    VARIABLES,
    BODY,
    LITERAL,
    NAME_REF,
    /// `expr.name`
    ATTR_EXPR,
    /// `name(args)`
    CALL_EXPR,
    ARG_LIST,
    /// `expr|name(args)`
    FILTER_EXPR,
    LIST_EXPR,
    HASH_EXPR,
    HASH_ENTRY,
    PAREN_EXPR,

    /// Error recovery node
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE)
    }

    /// Returns true for nodes produced by the expression grammar.
    pub fn is_expr(self) -> bool {
        matches!(
            self,
            Self::LITERAL
                | Self::NAME_REF
                | Self::ATTR_EXPR
                | Self::CALL_EXPR
                | Self::FILTER_EXPR
                | Self::LIST_EXPR
                | Self::HASH_EXPR
                | Self::PAREN_EXPR
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemplateLang {}

impl rowan::Language for TemplateLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<TemplateLang>;
pub type SyntaxToken = rowan::SyntaxToken<TemplateLang>;
pub type SyntaxElement = rowan::SyntaxElement<TemplateLang>;

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::Language;

    #[test]
    fn token_kinds_are_tokens() {
        assert!(SyntaxKind::WHITESPACE.is_token());
        assert!(SyntaxKind::TAG_CLOSE.is_token());
        assert!(SyntaxKind::EOF.is_token());
    }

    #[test]
    fn node_kinds_are_nodes() {
        assert!(SyntaxKind::TEMPLATE.is_node());
        assert!(SyntaxKind::SUPERBLOCK.is_node());
        assert!(SyntaxKind::ERROR.is_node());
    }

    #[test]
    fn expression_nodes() {
        assert!(SyntaxKind::CALL_EXPR.is_expr());
        assert!(!SyntaxKind::ARG_LIST.is_expr());
        assert!(!SyntaxKind::NAME.is_expr());
    }

    #[test]
    fn rowan_conversion_roundtrip() {
        let kind = SyntaxKind::HASH_ENTRY;
        let raw: rowan::SyntaxKind = kind.into();
        let back = TemplateLang::kind_from_raw(raw);
        assert_eq!(kind, back);
    }
}
