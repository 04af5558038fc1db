//! Rule-based pattern categorization.
//!
//! Rules are evaluated in a fixed priority list and the first match wins.
//! Every rule is a pure function of the pattern's structural shape, so
//! identical fingerprints always yield identical categories. New rules are
//! appended to `RULES` at the right priority.

use crate::core::ast::NodeKind;
use crate::core::{Category, Classification, Pattern};

#[derive(Debug, Default, Clone, Copy)]
pub struct PatternCategorizer;

/// Counters over a pattern's shape. The only input the rules see.
#[derive(Debug, Default, Clone, Copy)]
struct ShapeSummary {
    total: usize,
    loops: usize,
    conditionals: usize,
    switches: usize,
    calls: usize,
    returns: usize,
    assigns: usize,
    binary_ops: usize,
    constructions: usize,
    field_accesses: usize,
}

impl ShapeSummary {
    fn of(pattern: &Pattern) -> Self {
        let mut summary = ShapeSummary::default();
        for kind in pattern.shape() {
            summary.total += 1;
            match kind {
                NodeKind::Loop => summary.loops += 1,
                NodeKind::If => summary.conditionals += 1,
                NodeKind::Switch => summary.switches += 1,
                NodeKind::Call => summary.calls += 1,
                NodeKind::Return => summary.returns += 1,
                NodeKind::Assign => summary.assigns += 1,
                NodeKind::BinaryOp => summary.binary_ops += 1,
                NodeKind::ArrayLit | NodeKind::ObjectLit => summary.constructions += 1,
                NodeKind::FieldAccess => summary.field_accesses += 1,
                _ => {}
            }
        }
        summary
    }

    fn branches(&self) -> usize {
        self.conditionals + self.switches
    }
}

type Matcher = fn(&ShapeSummary) -> Option<f64>;

/// Priority-ordered classification rules. Accessor shapes are claimed
/// before the loop rule so a trivial getter with no control flow never
/// lands in a broader category; loop detection runs before call-sequence
/// detection.
const RULES: &[(Category, Matcher)] = &[
    (Category::Accessor, match_accessor),
    (Category::Loop, match_loop),
    (Category::ConditionalChain, match_conditional_chain),
    (Category::CallSequence, match_call_sequence),
    (Category::DataTransform, match_data_transform),
];

/// Largest shape still considered accessor-sized.
const ACCESSOR_MAX_NODES: usize = 6;

fn match_accessor(shape: &ShapeSummary) -> Option<f64> {
    let flat = shape.loops == 0 && shape.branches() == 0 && shape.calls == 0;
    if flat && shape.returns >= 1 && shape.total <= ACCESSOR_MAX_NODES {
        Some(0.9)
    } else {
        None
    }
}

fn match_loop(shape: &ShapeSummary) -> Option<f64> {
    if shape.loops >= 1 {
        Some((0.7 + 0.1 * shape.loops as f64).min(1.0))
    } else {
        None
    }
}

fn match_conditional_chain(shape: &ShapeSummary) -> Option<f64> {
    if shape.branches() >= 2 {
        Some((0.5 + 0.1 * shape.branches() as f64).min(0.9))
    } else {
        None
    }
}

fn match_call_sequence(shape: &ShapeSummary) -> Option<f64> {
    if shape.calls < 2 || shape.total == 0 {
        return None;
    }
    let density = shape.calls as f64 / shape.total as f64;
    if density >= 0.2 {
        Some(density.clamp(0.4, 0.9))
    } else {
        None
    }
}

fn match_data_transform(shape: &ShapeSummary) -> Option<f64> {
    if shape.assigns >= 1 && (shape.binary_ops >= 1 || shape.constructions >= 1) {
        Some(0.6)
    } else {
        None
    }
}

impl PatternCategorizer {
    pub fn new() -> Self {
        Self
    }

    /// Assign exactly one category. Patterns matching no rule are tagged
    /// `Other` with confidence 0.
    pub fn classify(&self, pattern: &Pattern) -> Classification {
        let shape = ShapeSummary::of(pattern);
        for (category, matcher) in RULES {
            if let Some(confidence) = matcher(&shape) {
                return Classification {
                    category: *category,
                    confidence: confidence.clamp(0.0, 1.0),
                };
            }
        }
        Classification {
            category: Category::Other,
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ast::Span;
    use crate::core::{PatternKind, PatternOwner, Token};

    fn pattern_with_shape(kinds: &[NodeKind]) -> Pattern {
        Pattern {
            file: "a.ts".into(),
            span: Span::lines(1, 5),
            kind: PatternKind::Function,
            owner: PatternOwner {
                name: "f".to_string(),
                class: None,
            },
            param_count: 0,
            tokens: kinds.iter().map(|k| Token::Shape(*k)).collect(),
            fingerprint: 0,
            node_count: kinds.len(),
            line_span: 5,
        }
    }

    #[test]
    fn loop_shapes_are_loops() {
        let c = PatternCategorizer::new().classify(&pattern_with_shape(&[
            NodeKind::Loop,
            NodeKind::Assign,
            NodeKind::Identifier,
            NodeKind::Return,
        ]));
        assert_eq!(c.category, Category::Loop);
        assert!(c.confidence > 0.0);
    }

    #[test]
    fn loop_rule_has_priority_over_call_sequence() {
        // Loop full of calls: the loop rule must claim it first.
        let c = PatternCategorizer::new().classify(&pattern_with_shape(&[
            NodeKind::Loop,
            NodeKind::Call,
            NodeKind::Call,
            NodeKind::Call,
        ]));
        assert_eq!(c.category, Category::Loop);
    }

    #[test]
    fn small_flat_return_is_accessor() {
        let c = PatternCategorizer::new().classify(&pattern_with_shape(&[
            NodeKind::Return,
            NodeKind::FieldAccess,
            NodeKind::Identifier,
        ]));
        assert_eq!(c.category, Category::Accessor);
    }

    #[test]
    fn branch_heavy_shapes_are_conditional_chains() {
        let c = PatternCategorizer::new().classify(&pattern_with_shape(&[
            NodeKind::If,
            NodeKind::Return,
            NodeKind::If,
            NodeKind::Return,
            NodeKind::If,
            NodeKind::Return,
        ]));
        assert_eq!(c.category, Category::ConditionalChain);
    }

    #[test]
    fn call_dominated_shapes_are_call_sequences() {
        let c = PatternCategorizer::new().classify(&pattern_with_shape(&[
            NodeKind::Call,
            NodeKind::Identifier,
            NodeKind::Call,
            NodeKind::Identifier,
            NodeKind::Call,
            NodeKind::Identifier,
        ]));
        assert_eq!(c.category, Category::CallSequence);
    }

    #[test]
    fn assignment_with_arithmetic_is_data_transform() {
        let c = PatternCategorizer::new().classify(&pattern_with_shape(&[
            NodeKind::Assign,
            NodeKind::Identifier,
            NodeKind::BinaryOp,
            NodeKind::Identifier,
            NodeKind::Literal,
            NodeKind::Assign,
            NodeKind::Identifier,
            NodeKind::Literal,
        ]));
        assert_eq!(c.category, Category::DataTransform);
    }

    #[test]
    fn unmatched_shapes_fall_back_to_other_with_zero_confidence() {
        let c = PatternCategorizer::new()
            .classify(&pattern_with_shape(&[NodeKind::Other, NodeKind::Other]));
        assert_eq!(c.category, Category::Other);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn classification_is_a_pure_function_of_shape() {
        let shape = &[
            NodeKind::Loop,
            NodeKind::Assign,
            NodeKind::Identifier,
            NodeKind::BinaryOp,
        ];
        let mut a = pattern_with_shape(shape);
        let mut b = pattern_with_shape(shape);
        a.owner.name = "first".to_string();
        b.owner.name = "second".to_string();
        b.file = "elsewhere.ts".into();

        let categorizer = PatternCategorizer::new();
        assert_eq!(categorizer.classify(&a), categorizer.classify(&b));
    }
}
