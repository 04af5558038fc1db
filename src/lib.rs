// Export modules for library usage
pub mod categorize;
pub mod classes;
pub mod cli;
pub mod config;
pub mod core;
pub mod extraction;
pub mod grouping;
pub mod io;
pub mod pipeline;
pub mod refactoring;
pub mod similarity;

// Re-export commonly used types
pub use crate::core::{
    Category, Classification, DetectionReport, DuplicateGroup, FileWarning, GroupOrigin, Pattern,
    PatternId, PatternKind, PatternRecord, RefactoringStrategy, RefactoringSuggestion,
    ReportSummary, SimilarityScore, Token,
};

pub use crate::core::ast::{
    AstNode, ClassDecl, FieldDecl, FunctionDecl, NodeKind, ParsedFile, Span,
};

pub use crate::categorize::PatternCategorizer;
pub use crate::classes::{ClassAnalyzer, ClassProfile};
pub use crate::config::DetectionConfig;
pub use crate::extraction::PatternExtractor;
pub use crate::grouping::PatternGrouper;
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::pipeline::DuplicateDetector;
pub use crate::refactoring::RefactoringGenerator;
pub use crate::similarity::SimilarityCalculator;
