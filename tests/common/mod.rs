// Shared builders for parsed-corpus fixtures.
#![allow(dead_code)]

use dupscan::core::ast::{AstNode, ClassDecl, FunctionDecl, NodeKind, ParsedFile, Span};

pub fn ident(name: &str, line: usize) -> AstNode {
    AstNode::new(NodeKind::Identifier, Span::lines(line, line)).with_value(name)
}

pub fn literal(line: usize) -> AstNode {
    AstNode::new(NodeKind::Literal, Span::lines(line, line))
}

/// An accumulation loop body: `acc = acc + item` inside a loop, then
/// `return acc`. Identifier names are caller-chosen so tests can exercise
/// rename-insensitivity.
pub fn sum_loop_body(acc: &str, item: &str, start: usize) -> Vec<AstNode> {
    vec![
        AstNode::new(NodeKind::Loop, Span::lines(start, start + 2)).with_children(vec![
            AstNode::new(NodeKind::Assign, Span::lines(start + 1, start + 1)).with_children(vec![
                ident(acc, start + 1),
                AstNode::new(NodeKind::BinaryOp, Span::lines(start + 1, start + 1))
                    .with_value("+")
                    .with_children(vec![ident(acc, start + 1), ident(item, start + 1)]),
            ]),
        ]),
        AstNode::new(NodeKind::Return, Span::lines(start + 3, start + 3))
            .with_children(vec![ident(acc, start + 3)]),
    ]
}

pub fn function(name: &str, params: &[&str], start: usize, body: Vec<AstNode>) -> FunctionDecl {
    let end = body
        .iter()
        .map(|n| n.span.end_line)
        .max()
        .unwrap_or(start)
        .max(start);
    FunctionDecl {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        is_async: false,
        return_type: None,
        span: Span::lines(start, end + 1),
        body,
    }
}

pub fn class(name: &str, start: usize, methods: Vec<FunctionDecl>) -> ClassDecl {
    let end = methods
        .iter()
        .map(|m| m.span.end_line)
        .max()
        .unwrap_or(start)
        .max(start);
    ClassDecl {
        name: name.to_string(),
        extends: None,
        methods,
        fields: Vec::new(),
        inherited: Vec::new(),
        span: Span::lines(start, end + 1),
    }
}

pub fn file(path: &str, functions: Vec<FunctionDecl>, classes: Vec<ClassDecl>) -> ParsedFile {
    ParsedFile {
        path: path.into(),
        functions,
        classes,
    }
}

/// A getter-shaped body: `return this.field`.
pub fn accessor_body(field: &str, start: usize) -> Vec<AstNode> {
    vec![
        AstNode::new(NodeKind::Return, Span::lines(start, start)).with_children(vec![
            AstNode::new(NodeKind::FieldAccess, Span::lines(start, start))
                .with_value(field)
                .with_children(vec![ident("this", start)]),
        ]),
    ]
}

/// A long flat data-transform body: `n` assignments of binary expressions.
pub fn transform_body(n: usize, start: usize) -> Vec<AstNode> {
    (0..n)
        .map(|i| {
            let line = start + i;
            AstNode::new(NodeKind::Assign, Span::lines(line, line)).with_children(vec![
                ident(&format!("out{i}"), line),
                AstNode::new(NodeKind::BinaryOp, Span::lines(line, line))
                    .with_value("*")
                    .with_children(vec![ident(&format!("in{i}"), line), literal(line)]),
            ])
        })
        .collect()
}
