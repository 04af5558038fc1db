//! Detection pipeline orchestration.
//!
//! Strictly staged: parsed files → extraction → categorization → grouping
//! → class analysis → suggestion generation. No stage reaches backward
//! into an earlier stage's inputs, and each run's pattern universe is
//! self-contained and discarded once the report is handed back.

use crate::categorize::PatternCategorizer;
use crate::classes::ClassAnalyzer;
use crate::config::DetectionConfig;
use crate::core::ast::ParsedFile;
use crate::core::errors::{Error, Result};
use crate::core::{DetectionReport, DuplicateGroup, PatternId, PatternRecord};
use crate::extraction::PatternExtractor;
use crate::grouping::PatternGrouper;
use crate::refactoring::RefactoringGenerator;
use chrono::Utc;
use log::info;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;

pub struct DuplicateDetector {
    config: DetectionConfig,
}

impl DuplicateDetector {
    /// Build a detector, validating the configuration up front.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run the full pipeline over a parsed corpus.
    pub fn run(&self, files: &[ParsedFile]) -> Result<DetectionReport> {
        self.run_with_cancel(files, &AtomicBool::new(false))
    }

    /// Run with a cooperative cancellation flag. When raised, no further
    /// comparison shards are scheduled; the report covers whatever had
    /// been computed.
    pub fn run_with_cancel(
        &self,
        files: &[ParsedFile],
        cancel: &AtomicBool,
    ) -> Result<DetectionReport> {
        let extractor = PatternExtractor::new(&self.config);
        let (patterns, warnings) = extractor.extract_all(files);

        let categorizer = PatternCategorizer::new();
        let records: Vec<PatternRecord> = patterns
            .into_iter()
            .map(|pattern| {
                let classification = categorizer.classify(&pattern);
                PatternRecord {
                    pattern,
                    classification,
                }
            })
            .collect();

        let grouper = PatternGrouper::new(&self.config);
        let mut groups = grouper.group_patterns(&records, cancel);

        let claimed: HashSet<PatternId> = groups
            .iter()
            .flat_map(|group| group.members.iter().copied())
            .collect();
        let analyzer = ClassAnalyzer::new(&self.config);
        let (profiles, class_groups) = analyzer.analyze(files, &records, &claimed, cancel);
        groups.extend(class_groups);

        verify_run_invariants(&records, &groups)?;

        let generator = RefactoringGenerator::new();
        let suggestions = generator.generate(&records, &groups);

        info!(
            "analyzed {} files: {} patterns, {} class profiles, {} groups, {} suggestions",
            files.len(),
            records.len(),
            profiles.len(),
            groups.len(),
            suggestions.len()
        );

        Ok(DetectionReport {
            patterns: records,
            groups,
            suggestions,
            warnings,
            timestamp: Utc::now(),
        })
    }
}

/// Defensive check of run-level invariants. A failure here is a defect in
/// the pipeline, never bad input.
fn verify_run_invariants(records: &[PatternRecord], groups: &[DuplicateGroup]) -> Result<()> {
    let mut seen: HashSet<PatternId> = HashSet::new();
    for group in groups {
        if group.members.len() < 2 {
            return Err(Error::invariant("duplicate group with fewer than two members"));
        }
        if !group.members.contains(&group.representative) {
            return Err(Error::invariant(
                "group representative is not one of its members",
            ));
        }
        for &id in &group.members {
            if id.index() >= records.len() {
                return Err(Error::invariant(format!(
                    "group references pattern {} outside the run universe of {}",
                    id.index(),
                    records.len()
                )));
            }
            if records[id.index()].classification.category != group.category {
                return Err(Error::invariant(
                    "group member categorized outside the group's category",
                ));
            }
            if !seen.insert(id) {
                return Err(Error::invariant(format!(
                    "pattern {} belongs to two groups in the same run",
                    id.index()
                )));
            }
        }
    }
    Ok(())
}
