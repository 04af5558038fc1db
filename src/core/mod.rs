pub mod ast;
pub mod errors;

use crate::core::ast::{NodeKind, Span};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Index of a pattern in the current run's universe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PatternId(pub usize);

impl PatternId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What kind of source construct a pattern was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    Function,
    Method,
    Block,
    Field,
}

/// One element of a normalized token sequence.
///
/// Identifiers are replaced with positional placeholders (first occurrence
/// gets index 0, and so on) and literal values are erased, so naming never
/// drives similarity. Operator and callee choices are kept verbatim as
/// `Word` tokens because they are part of what a block does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Token {
    Shape(NodeKind),
    Ident(u32),
    Lit,
    Word(String),
}

impl Token {
    /// Structural kind of the token, ignoring placeholder indices and
    /// retained words. This is the view fingerprints and structural
    /// comparison operate on.
    pub fn kind(&self) -> NodeKind {
        match self {
            Token::Shape(kind) => *kind,
            Token::Ident(_) => NodeKind::Identifier,
            Token::Lit => NodeKind::Literal,
            Token::Word(_) => NodeKind::Other,
        }
    }
}

/// The entity a pattern belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternOwner {
    /// Function, method, or field name.
    pub name: String,
    /// Enclosing class, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// A normalized, position-tagged representation of a candidate source
/// block. Created once per extraction pass; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub file: PathBuf,
    pub span: Span,
    pub kind: PatternKind,
    pub owner: PatternOwner,
    /// Parameter count of the owning callable; 0 for blocks and fields.
    pub param_count: usize,
    pub tokens: Vec<Token>,
    /// Shape-only hash over the token kind sequence, ignoring identifier
    /// and literal values.
    pub fingerprint: u64,
    pub node_count: usize,
    pub line_span: usize,
}

impl Pattern {
    /// Iterate the structural shape of the token sequence.
    pub fn shape(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.tokens.iter().map(Token::kind)
    }

    /// Class identity the pattern belongs to, if it is a class member.
    /// Classes with the same name in different files are distinct.
    pub fn class_identity(&self) -> Option<(&std::path::Path, &str)> {
        self.owner
            .class
            .as_deref()
            .map(|class| (self.file.as_path(), class))
    }
}

/// Coarse structural classification of a pattern.
///
/// Declaration order is the category's ordinal order, used for
/// deterministic group emission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Loop,
    ConditionalChain,
    CallSequence,
    DataTransform,
    Accessor,
    Other,
}

impl Category {
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Loop => "loop",
            Category::ConditionalChain => "conditional-chain",
            Category::CallSequence => "call-sequence",
            Category::DataTransform => "data-transform",
            Category::Accessor => "accessor",
            Category::Other => "other",
        }
    }
}

/// A category assignment with the confidence of the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub confidence: f64,
}

/// A pattern together with its classification; one entry of the run's
/// pattern universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub pattern: Pattern,
    pub classification: Classification,
}

/// Similarity between two same-category patterns, with the sub-scores
/// that produced it. Always in [0, 1] and symmetric in its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub value: f64,
    pub structural: f64,
    pub token: f64,
}

impl SimilarityScore {
    /// The short-circuit score for pairs that are never meaningful
    /// duplicates.
    pub fn zero() -> Self {
        Self {
            value: 0.0,
            structural: 0.0,
            token: 0.0,
        }
    }
}

/// Which stage produced a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupOrigin {
    MainPipeline,
    ClassAnalyzer,
}

/// A cluster of mutually similar patterns within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub category: Category,
    /// Member ids, sorted ascending. Always at least two.
    pub members: Vec<PatternId>,
    /// Minimum pairwise similarity within the group - the weakest link.
    pub aggregate_similarity: f64,
    /// First member by (file path, position); the universe is sorted that
    /// way, so this is the smallest member id.
    pub representative: PatternId,
    pub origin: GroupOrigin,
    /// Originating classes for class-analyzer groups; empty for the main
    /// pipeline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: PatternId) -> bool {
        self.members.binary_search(&id).is_ok()
    }
}

/// How a duplicate group could be refactored away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefactoringStrategy {
    ExtractFunction,
    ExtractSuperclass,
    Parameterize,
    MergeAccessor,
}

impl RefactoringStrategy {
    pub fn display_name(&self) -> &'static str {
        match self {
            RefactoringStrategy::ExtractFunction => "extract-function",
            RefactoringStrategy::ExtractSuperclass => "extract-superclass",
            RefactoringStrategy::Parameterize => "parameterize",
            RefactoringStrategy::MergeAccessor => "merge-accessor",
        }
    }
}

/// An advisory refactoring candidate tied to one duplicate group.
/// The generator never mutates source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefactoringSuggestion {
    /// Index into `DetectionReport::groups`.
    pub group: usize,
    pub strategy: RefactoringStrategy,
    pub rationale: String,
    /// The group's aggregate similarity, unmodified.
    pub confidence: f64,
}

/// A non-fatal per-file extraction failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileWarning {
    pub file: PathBuf,
    pub message: String,
}

/// Everything one detection run produced. Self-contained: groups and
/// suggestions only ever reference patterns in this report's universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub patterns: Vec<PatternRecord>,
    pub groups: Vec<DuplicateGroup>,
    pub suggestions: Vec<RefactoringSuggestion>,
    pub warnings: Vec<FileWarning>,
    pub timestamp: DateTime<Utc>,
}

impl DetectionReport {
    pub fn record(&self, id: PatternId) -> Option<&PatternRecord> {
        self.patterns.get(id.index())
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            total_patterns: self.patterns.len(),
            total_groups: self.groups.len(),
            class_groups: self
                .groups
                .iter()
                .filter(|g| g.origin == GroupOrigin::ClassAnalyzer)
                .count(),
            total_suggestions: self.suggestions.len(),
            skipped_files: self.warnings.len(),
        }
    }
}

/// Headline counts for report writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_patterns: usize,
    pub total_groups: usize,
    pub class_groups: usize,
    pub total_suggestions: usize,
    pub skipped_files: usize,
}
