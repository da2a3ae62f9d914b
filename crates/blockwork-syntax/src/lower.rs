//! CST to AST lowering.
//!
//! Runs only on trees without syntax errors. A superblock body is lowered in
//! two steps: first into a flat node list, then nested invocations and
//! `{{ sblock(...) }}` / `{{ sblock_<type>(...) }}` prints are pulled out of
//! it as children. What remains becomes the body, unless it is only
//! whitespace.

use rowan::TextSize;

use crate::ast::{Expr, Node, SuperblockNode, Template};
use crate::error::TemplateError;
use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};
use crate::tags::{SBLOCK, SHORTHAND_PREFIX, TagSet};

type Result<T> = std::result::Result<T, TemplateError>;

pub fn lower(root: &SyntaxNode, tags: &TagSet) -> Result<Template> {
    let lowerer = Lowerer {
        newlines: newline_offsets(&root.text().to_string()),
        tags,
    };
    Ok(Template {
        nodes: lowerer.elements(root)?,
    })
}

fn newline_offsets(source: &str) -> Vec<TextSize> {
    source
        .match_indices('\n')
        .map(|(i, _)| TextSize::from(i as u32))
        .collect()
}

struct Lowerer<'a> {
    newlines: Vec<TextSize>,
    tags: &'a TagSet,
}

impl Lowerer<'_> {
    fn line(&self, node: &SyntaxNode) -> usize {
        let offset = node.text_range().start();
        self.newlines.partition_point(|nl| *nl < offset) + 1
    }

    fn malformed(&self, node: &SyntaxNode, what: &str) -> TemplateError {
        TemplateError::Syntax {
            message: format!("Malformed {what}"),
            line: self.line(node),
        }
    }

    fn elements(&self, parent: &SyntaxNode) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        for element in parent.children_with_tokens() {
            match element {
                rowan::NodeOrToken::Token(token) if token.kind() == SyntaxKind::TEXT => {
                    if let Some(Node::Text(text)) = nodes.last_mut() {
                        text.push_str(token.text());
                    } else {
                        nodes.push(Node::Text(token.text().to_string()));
                    }
                }
                rowan::NodeOrToken::Token(_) => {}
                rowan::NodeOrToken::Node(node) => match node.kind() {
                    SyntaxKind::PRINT => {
                        let expr = first_expr(&node)
                            .ok_or_else(|| self.malformed(&node, "print"))?;
                        nodes.push(Node::Print {
                            expr: self.expr(&expr)?,
                            line: self.line(&node),
                        });
                    }
                    SyntaxKind::SUPERBLOCK => nodes.push(Node::Superblock(self.superblock(&node)?)),
                    _ => {}
                },
            }
        }

        Ok(nodes)
    }

    fn superblock(&self, node: &SyntaxNode) -> Result<SuperblockNode> {
        let open = child(node, SyntaxKind::SUPERBLOCK_OPEN)
            .ok_or_else(|| self.malformed(node, "block tag"))?;
        let tag = first_token(&open, SyntaxKind::NAME)
            .map(|t| t.text().to_string())
            .ok_or_else(|| self.malformed(node, "block tag"))?;

        let block_type = if tag == SBLOCK {
            child(&open, SyntaxKind::TYPE_ARG)
                .and_then(|t| first_expr(&t))
                .map(|e| self.expr(&e))
                .transpose()?
                .ok_or_else(|| self.malformed(node, "block type"))?
        } else {
            Expr::str(tag.strip_prefix(SHORTHAND_PREFIX).unwrap_or(&tag))
        };

        let options = if let Some(attrs) = child(&open, SyntaxKind::ATTR_LIST) {
            self.attributes(&attrs)?
        } else if let Some(options) = child(&open, SyntaxKind::OPTIONS).and_then(|o| first_expr(&o)) {
            self.expr(&options)?
        } else {
            Expr::empty_hash()
        };

        let mut variables = Expr::empty_hash();
        let mut render_assets = true;
        if let Some(with) = child(&open, SyntaxKind::WITH_CLAUSE) {
            if let Some(vars) = child(&with, SyntaxKind::VARIABLES).and_then(|v| first_expr(&v)) {
                variables = self.expr(&vars)?;
            }
            render_assets = !tokens(&with).any(|t| t.kind() == SyntaxKind::NAME && t.text() == "noassets");
        }

        let mut superblock = SuperblockNode {
            tag,
            line: self.line(node),
            block_type,
            options,
            variables,
            render_assets: Expr::Bool(render_assets),
            children: Vec::new(),
            body: None,
        };

        if let Some(body) = child(node, SyntaxKind::BODY) {
            self.extract_children(&mut superblock, self.elements(&body)?);
        }

        Ok(superblock)
    }

    /// Move nested invocations out of a flat body into `children`.
    fn extract_children(&self, superblock: &mut SuperblockNode, flat: Vec<Node>) {
        let mut body = Vec::new();

        for node in flat {
            match node {
                Node::Superblock(child) => superblock.children.push(child),
                Node::Print {
                    expr: Expr::Call { name, args, line },
                    ..
                } if self.is_block_function(&name) => {
                    superblock.children.push(call_to_superblock(name, args, line));
                }
                other => body.push(other),
            }
        }

        let has_content = body.iter().any(|node| match node {
            Node::Text(text) => !text.trim().is_empty(),
            _ => true,
        });
        if has_content {
            superblock.body = Some(body);
        }
    }

    fn is_block_function(&self, name: &str) -> bool {
        name == SBLOCK || self.tags.shorthand_type(name).is_some()
    }

    fn attributes(&self, attrs: &SyntaxNode) -> Result<Expr> {
        let mut pairs = Vec::new();
        for attr in attrs.children().filter(|n| n.kind() == SyntaxKind::ATTR) {
            let key = tokens(&attr)
                .next()
                .map(|t| key_text(&t))
                .ok_or_else(|| self.malformed(&attr, "attribute"))?;
            let value = first_expr(&attr).ok_or_else(|| self.malformed(&attr, "attribute"))?;
            pairs.push((key, self.expr(&value)?));
        }
        Ok(Expr::Hash(pairs))
    }

    fn expr(&self, node: &SyntaxNode) -> Result<Expr> {
        match node.kind() {
            SyntaxKind::LITERAL => {
                let token = tokens(node)
                    .next()
                    .ok_or_else(|| self.malformed(node, "literal"))?;
                self.literal(node, &token)
            }
            SyntaxKind::NAME_REF => first_token(node, SyntaxKind::NAME)
                .map(|t| Expr::Name(t.text().to_string()))
                .ok_or_else(|| self.malformed(node, "name")),
            SyntaxKind::ATTR_EXPR => {
                let target = first_expr(node).ok_or_else(|| self.malformed(node, "attribute access"))?;
                let name = last_token(node, SyntaxKind::NAME)
                    .ok_or_else(|| self.malformed(node, "attribute access"))?;
                Ok(Expr::Attr {
                    target: Box::new(self.expr(&target)?),
                    name: name.text().to_string(),
                })
            }
            SyntaxKind::CALL_EXPR => {
                let name = first_token(node, SyntaxKind::NAME)
                    .map(|t| t.text().to_string())
                    .ok_or_else(|| self.malformed(node, "function call"))?;
                let args = self.args(node)?;
                let line = self.line(node);
                if name == SBLOCK && args.is_empty() {
                    return Err(TemplateError::InvalidConfiguration {
                        message: format!("The block type must be present in the \"{SBLOCK}\" function"),
                        line,
                    });
                }
                Ok(Expr::Call { name, args, line })
            }
            SyntaxKind::FILTER_EXPR => {
                let input = first_expr(node).ok_or_else(|| self.malformed(node, "filter"))?;
                let name = last_token(node, SyntaxKind::NAME)
                    .ok_or_else(|| self.malformed(node, "filter"))?;
                Ok(Expr::Filter {
                    input: Box::new(self.expr(&input)?),
                    name: name.text().to_string(),
                    args: self.args(node)?,
                    line: self.line(node),
                })
            }
            SyntaxKind::LIST_EXPR => Ok(Expr::List(
                exprs(node).map(|e| self.expr(&e)).collect::<Result<_>>()?,
            )),
            SyntaxKind::HASH_EXPR => {
                let mut pairs = Vec::new();
                for entry in node.children().filter(|n| n.kind() == SyntaxKind::HASH_ENTRY) {
                    let key = tokens(&entry)
                        .next()
                        .map(|t| key_text(&t))
                        .ok_or_else(|| self.malformed(&entry, "hash entry"))?;
                    let value = first_expr(&entry).ok_or_else(|| self.malformed(&entry, "hash entry"))?;
                    pairs.push((key, self.expr(&value)?));
                }
                Ok(Expr::Hash(pairs))
            }
            SyntaxKind::PAREN_EXPR => {
                let inner = first_expr(node).ok_or_else(|| self.malformed(node, "expression"))?;
                self.expr(&inner)
            }
            _ => Err(self.malformed(node, "expression")),
        }
    }

    fn args(&self, node: &SyntaxNode) -> Result<Vec<Expr>> {
        match child(node, SyntaxKind::ARG_LIST) {
            Some(list) => exprs(&list).map(|e| self.expr(&e)).collect(),
            None => Ok(Vec::new()),
        }
    }

    fn literal(&self, node: &SyntaxNode, token: &SyntaxToken) -> Result<Expr> {
        let text = token.text();
        match token.kind() {
            SyntaxKind::INT => text
                .parse()
                .map(Expr::Int)
                .map_err(|_| self.malformed(node, "integer")),
            SyntaxKind::FLOAT => text
                .parse()
                .map(Expr::Float)
                .map_err(|_| self.malformed(node, "number")),
            SyntaxKind::STRING => Ok(Expr::Str(unquote(text))),
            SyntaxKind::NAME => match text {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                _ => Ok(Expr::Null),
            },
            _ => Err(self.malformed(node, "literal")),
        }
    }
}

/// Turn an extracted `sblock(type, options, variables, assets)` or
/// `sblock_<type>(options, variables, assets)` call into a node.
fn call_to_superblock(name: String, args: Vec<Expr>, line: usize) -> SuperblockNode {
    let mut args = args.into_iter();

    let block_type = match name.strip_prefix(SHORTHAND_PREFIX) {
        Some(implied) => Expr::str(implied),
        None => args.next().unwrap_or(Expr::Null),
    };

    SuperblockNode {
        block_type,
        options: args.next().unwrap_or_else(Expr::empty_hash),
        variables: args.next().unwrap_or_else(Expr::empty_hash),
        render_assets: args.next().unwrap_or(Expr::Bool(true)),
        tag: name,
        line,
        children: Vec::new(),
        body: None,
    }
}

fn child(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxNode> {
    node.children().find(|n| n.kind() == kind)
}

fn first_expr(node: &SyntaxNode) -> Option<SyntaxNode> {
    exprs(node).next()
}

fn exprs(node: &SyntaxNode) -> impl Iterator<Item = SyntaxNode> {
    node.children().filter(|n| n.kind().is_expr())
}

/// Direct child tokens, trivia excluded.
fn tokens(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| !t.kind().is_trivia())
}

fn first_token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    tokens(node).find(|t| t.kind() == kind)
}

fn last_token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    tokens(node).filter(|t| t.kind() == kind).last()
}

fn key_text(token: &SyntaxToken) -> String {
    if token.kind() == SyntaxKind::STRING {
        unquote(token.text())
    } else {
        token.text().to_string()
    }
}

/// Strip the quotes of a string literal and resolve backslash escapes.
fn unquote(literal: &str) -> String {
    let inner = literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default();

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
