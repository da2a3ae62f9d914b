//! # Lexer - Tokenizing Template Source
//!
//! Templates mix literal text with code regions, so lexing runs in two modes:
//!
//! - **text mode** splits the source into `TEXT`, comments and the openers
//!   `{{` and `{%`
//! - **code mode** tokenizes expressions until the matching `}}` or `%}`
//!
//! Both modes use a [Logos] lexer. Every byte of the input appears in exactly
//! one token, so the text of a parsed tree equals its source:
//!
//! ```
//! use blockwork_syntax::lexer::lex;
//!
//! let input = "Hi {{ name }}!";
//! let tokens = lex(input);
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! Inside `{{ }}` the lexer tracks bracket depth: `{{ {a: {b: 1}} }}` closes
//! the inner hashes with two `}` tokens before the final `}}`.
//!
//! [Logos]: https://docs.rs/logos

use logos::Logos;

use crate::syntax_kind::SyntaxKind;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum TextToken {
    #[token("{{")]
    PrintOpen,

    #[token("{%")]
    TagOpen,

    #[token("{#")]
    CommentOpen,

    #[regex(r"[^{]+")]
    Text,

    /// A lone `{` is plain text
    #[token("{")]
    Brace,
}

/// Token kinds inside `{{ }}` and `{% %}`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub enum TokenKind {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("%}")]
    TagClose,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Name,

    #[regex(r"-?[0-9]+")]
    Int,

    #[regex(r"-?[0-9]+\.[0-9]+")]
    Float,

    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(".")]
    Dot,

    #[token("|")]
    Pipe,

    #[token("=")]
    Eq,
}

impl TokenKind {
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TokenKind::Whitespace => SyntaxKind::WHITESPACE,
            TokenKind::TagClose => SyntaxKind::TAG_CLOSE,
            TokenKind::Name => SyntaxKind::NAME,
            TokenKind::Int => SyntaxKind::INT,
            TokenKind::Float => SyntaxKind::FLOAT,
            TokenKind::String => SyntaxKind::STRING,
            TokenKind::LParen => SyntaxKind::LPAREN,
            TokenKind::RParen => SyntaxKind::RPAREN,
            TokenKind::LBracket => SyntaxKind::LBRACKET,
            TokenKind::RBracket => SyntaxKind::RBRACKET,
            TokenKind::LBrace => SyntaxKind::LBRACE,
            TokenKind::RBrace => SyntaxKind::RBRACE,
            TokenKind::Comma => SyntaxKind::COMMA,
            TokenKind::Colon => SyntaxKind::COLON,
            TokenKind::Dot => SyntaxKind::DOT,
            TokenKind::Pipe => SyntaxKind::PIPE,
            TokenKind::Eq => SyntaxKind::EQ,
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    Print,
    Tag,
}

/// Lex the input into a sequence of tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input).into_iter().map(|(t, _)| t).collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < input.len() {
        let (next, closer) = lex_text(input, offset, &mut tokens);
        offset = match closer {
            Some(closer) => lex_code(input, next, closer, &mut tokens),
            None => next,
        };
    }

    tokens
}

type Spanned<'a> = (Token<'a>, std::ops::Range<usize>);

fn push<'a>(tokens: &mut Vec<Spanned<'a>>, kind: SyntaxKind, input: &'a str, span: std::ops::Range<usize>) {
    tokens.push((
        Token {
            kind,
            text: &input[span.clone()],
        },
        span,
    ));
}

/// Lex text until a code opener. Returns the offset after the opener.
fn lex_text<'a>(input: &'a str, start: usize, tokens: &mut Vec<Spanned<'a>>) -> (usize, Option<Closer>) {
    let mut lexer = TextToken::lexer(&input[start..]);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (from, to) = (start + span.start, start + span.end);
        match result {
            Ok(TextToken::PrintOpen) => {
                push(tokens, SyntaxKind::PRINT_OPEN, input, from..to);
                return (to, Some(Closer::Print));
            }
            Ok(TextToken::TagOpen) => {
                push(tokens, SyntaxKind::TAG_OPEN, input, from..to);
                return (to, Some(Closer::Tag));
            }
            Ok(TextToken::CommentOpen) => {
                let rest = lexer.remainder();
                let extra = rest.find("#}").map(|i| i + 2).unwrap_or(rest.len());
                lexer.bump(extra);
                push(tokens, SyntaxKind::COMMENT, input, from..to + extra);
            }
            Ok(TextToken::Text | TextToken::Brace) | Err(()) => {
                push(tokens, SyntaxKind::TEXT, input, from..to);
            }
        }
    }

    (input.len(), None)
}

/// Lex code until `closer`. Returns the offset after the closer.
fn lex_code<'a>(input: &'a str, start: usize, closer: Closer, tokens: &mut Vec<Spanned<'a>>) -> usize {
    let mut lexer = TokenKind::lexer(&input[start..]);
    let mut depth = 0usize;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (from, to) = (start + span.start, start + span.end);
        let kind = match result {
            Ok(TokenKind::TagClose) if closer == Closer::Tag => {
                push(tokens, SyntaxKind::TAG_CLOSE, input, from..to);
                return to;
            }
            Ok(TokenKind::RBrace)
                if closer == Closer::Print && depth == 0 && lexer.remainder().starts_with('}') =>
            {
                push(tokens, SyntaxKind::PRINT_CLOSE, input, from..to + 1);
                return to + 1;
            }
            Ok(kind @ (TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace)) => {
                depth += 1;
                kind.to_syntax_kind()
            }
            Ok(kind @ (TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace)) => {
                depth = depth.saturating_sub(1);
                kind.to_syntax_kind()
            }
            Ok(kind) => kind.to_syntax_kind(),
            Err(()) => SyntaxKind::ERROR_TOKEN,
        };
        push(tokens, kind, input, from..to);
    }

    input.len()
}
