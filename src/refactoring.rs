//! Refactoring suggestion generation.
//!
//! Consumes duplicate groups from both pipelines and emits ranked,
//! advisory `RefactoringSuggestion`s. The generator never mutates source;
//! it proposes a strategy with the evidence that supports it.

use crate::core::{
    Category, DuplicateGroup, Pattern, PatternKind, PatternRecord, RefactoringStrategy,
    RefactoringSuggestion,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct RefactoringGenerator;

impl RefactoringGenerator {
    pub fn new() -> Self {
        Self
    }

    /// One suggestion per group, ranked by confidence descending, then
    /// group size descending, then representative file path.
    pub fn generate(
        &self,
        records: &[PatternRecord],
        groups: &[DuplicateGroup],
    ) -> Vec<RefactoringSuggestion> {
        let mut suggestions: Vec<RefactoringSuggestion> = groups
            .iter()
            .enumerate()
            .map(|(index, group)| self.suggest(records, index, group))
            .collect();

        suggestions.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| groups[b.group].members.len().cmp(&groups[a.group].members.len()))
                .then_with(|| {
                    let path_a = &records[groups[a.group].representative.index()].pattern.file;
                    let path_b = &records[groups[b.group].representative.index()].pattern.file;
                    path_a.cmp(path_b)
                })
        });
        suggestions
    }

    fn suggest(
        &self,
        records: &[PatternRecord],
        index: usize,
        group: &DuplicateGroup,
    ) -> RefactoringSuggestion {
        let members: Vec<&Pattern> = group
            .members
            .iter()
            .map(|id| &records[id.index()].pattern)
            .collect();
        let strategy = select_strategy(group, &members);
        RefactoringSuggestion {
            group: index,
            strategy,
            rationale: rationale(group, &members, strategy),
            confidence: group.aggregate_similarity,
        }
    }
}

fn select_strategy(group: &DuplicateGroup, members: &[&Pattern]) -> RefactoringStrategy {
    if members.iter().all(|p| p.kind == PatternKind::Field) {
        // Field groups are cross-class by construction.
        return if group.classes.len() > 1 {
            RefactoringStrategy::ExtractSuperclass
        } else {
            RefactoringStrategy::MergeAccessor
        };
    }
    if group.category == Category::Accessor {
        return RefactoringStrategy::MergeAccessor;
    }

    let all_methods = members.iter().all(|p| p.kind == PatternKind::Method);
    if all_methods {
        let same_class = members
            .windows(2)
            .all(|w| w[0].class_identity() == w[1].class_identity());
        if same_class && only_value_differences(members) {
            return RefactoringStrategy::Parameterize;
        }
        if !same_class && identical_signatures(members) {
            return RefactoringStrategy::ExtractSuperclass;
        }
    }

    RefactoringStrategy::ExtractFunction
}

/// Identical normalized token sequences: the bodies differ only in
/// identifier and literal values, so the variants collapse into one
/// parameterized implementation.
fn only_value_differences(members: &[&Pattern]) -> bool {
    members.windows(2).all(|w| w[0].tokens == w[1].tokens)
}

fn identical_signatures(members: &[&Pattern]) -> bool {
    members
        .windows(2)
        .all(|w| w[0].owner.name == w[1].owner.name && w[0].param_count == w[1].param_count)
}

fn rationale(
    group: &DuplicateGroup,
    members: &[&Pattern],
    strategy: RefactoringStrategy,
) -> String {
    let evidence = format!(
        "{} {} patterns with aggregate similarity {:.2}",
        members.len(),
        group.category.display_name(),
        group.aggregate_similarity
    );
    let action = match strategy {
        RefactoringStrategy::ExtractFunction => {
            "extract the shared logic into one function and call it from each site".to_string()
        }
        RefactoringStrategy::ExtractSuperclass => format!(
            "hoist the common member into a shared superclass of {}",
            group.classes.join(", ")
        ),
        RefactoringStrategy::Parameterize => {
            "the bodies differ only in identifier and literal values; merge them into one \
             parameterized method"
                .to_string()
        }
        RefactoringStrategy::MergeAccessor => {
            "collapse the duplicated accessors into a single shared definition".to_string()
        }
    };
    format!("{evidence}: {action}")
}
