//! Typed template tree produced by lowering the CST.
//!
//! Unlike the CST, the AST drops comments and whitespace inside code regions
//! and nests superblock invocations as [`SuperblockNode::children`].

/// A compiled template: text, prints and block invocations in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Print { expr: Expr, line: usize },
    Superblock(SuperblockNode),
}

/// One block invocation, from a `{% sblock %}` tag or an extracted
/// `{{ sblock(...) }}` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperblockNode {
    /// Tag or function name that produced the node
    pub tag: String,
    pub line: usize,
    pub block_type: Expr,
    pub options: Expr,
    pub variables: Expr,
    pub render_assets: Expr,
    pub children: Vec<SuperblockNode>,
    /// Kept only when it holds more than whitespace
    pub body: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    List(Vec<Expr>),
    Hash(Vec<(String, Expr)>),
    Attr {
        target: Box<Expr>,
        name: String,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        line: usize,
    },
    Filter {
        input: Box<Expr>,
        name: String,
        args: Vec<Expr>,
        line: usize,
    },
}

impl Expr {
    pub fn empty_hash() -> Self {
        Expr::Hash(Vec::new())
    }

    pub fn str(s: impl Into<String>) -> Self {
        Expr::Str(s.into())
    }
}
