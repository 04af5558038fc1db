//! Input-boundary types for parsed source files.
//!
//! The external parser front end hands the core a corpus of `ParsedFile`
//! records, typically deserialized from JSON. The core never reads raw
//! source bytes; everything it needs (function/class boundaries, node
//! structure, spans) is already present here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source span, 1-based lines and columns.
///
/// The derived ordering is (start_line, start_column, end_line, end_column),
/// which is the position order used for deterministic output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Span covering whole lines, columns zeroed.
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self::new(start_line, 0, end_line, 0)
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// A span is well formed when its end does not precede its start.
    pub fn is_well_formed(&self) -> bool {
        self.end_line > self.start_line
            || (self.end_line == self.start_line && self.end_column >= self.start_column)
    }
}

/// Node taxonomy exposed by the external parser.
///
/// Constructs outside this taxonomy arrive as `Other`; the core never
/// inspects raw node text beyond `AstNode::value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    If,
    Loop,
    Switch,
    Try,
    Call,
    Assign,
    BinaryOp,
    UnaryOp,
    Return,
    Throw,
    Await,
    ArrayLit,
    ObjectLit,
    Literal,
    Identifier,
    FieldAccess,
    Block,
    Other,
}

impl NodeKind {
    /// Stable label used for fingerprinting.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::If => "if",
            NodeKind::Loop => "loop",
            NodeKind::Switch => "switch",
            NodeKind::Try => "try",
            NodeKind::Call => "call",
            NodeKind::Assign => "assign",
            NodeKind::BinaryOp => "binary-op",
            NodeKind::UnaryOp => "unary-op",
            NodeKind::Return => "return",
            NodeKind::Throw => "throw",
            NodeKind::Await => "await",
            NodeKind::ArrayLit => "array-lit",
            NodeKind::ObjectLit => "object-lit",
            NodeKind::Literal => "literal",
            NodeKind::Identifier => "identifier",
            NodeKind::FieldAccess => "field-access",
            NodeKind::Block => "block",
            NodeKind::Other => "other",
        }
    }

    /// Kinds that delimit an extractable sub-block.
    pub fn is_block_like(&self) -> bool {
        matches!(
            self,
            NodeKind::If | NodeKind::Loop | NodeKind::Switch | NodeKind::Try | NodeKind::Block
        )
    }
}

/// A single node of the parsed representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: NodeKind,
    /// Identifier name, literal text, operator, or callee, where applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub span: Span,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            value: None,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<AstNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, including self.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(AstNode::subtree_size)
            .sum::<usize>()
    }
}

/// A function or method declaration with its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub span: Span,
    #[serde(default)]
    pub body: Vec<AstNode>,
}

/// A class field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_private: bool,
    pub span: Span,
}

/// A class declaration.
///
/// `methods` and `fields` carry every member the parser resolved for the
/// class, including members flattened down from ancestors; `inherited`
/// names the members that were inherited unchanged so that class analysis
/// can exclude them from comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub methods: Vec<FunctionDecl>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub inherited: Vec<String>,
    pub span: Span,
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub path: PathBuf,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}
