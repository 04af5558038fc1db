//! Class-level duplicate analysis.
//!
//! Builds one `ClassProfile` per class, then reuses the similarity
//! calculator and grouper restricted to same-role members (method vs
//! method, field vs field) across *different* classes. A class is never
//! compared against itself, and members inherited unchanged from an
//! ancestor are excluded so a subclass does not trivially "duplicate" its
//! own ancestor across every descendant.

use crate::config::DetectionConfig;
use crate::core::ast::ParsedFile;
use crate::core::{DuplicateGroup, GroupOrigin, PatternId, PatternKind, PatternRecord};
use crate::grouping::PatternGrouper;
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

/// A class's identity plus its comparable members.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProfile {
    pub name: String,
    pub file: PathBuf,
    pub methods: Vec<PatternId>,
    pub fields: Vec<PatternId>,
    /// Member names inherited unchanged from an ancestor; never compared.
    pub inherited: Vec<String>,
}

pub struct ClassAnalyzer<'a> {
    config: &'a DetectionConfig,
}

impl<'a> ClassAnalyzer<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Build profiles and cluster cross-class member duplicates.
    ///
    /// `claimed` holds pattern ids already consumed by main-pipeline
    /// groups; they are skipped here to keep the run's groups disjoint.
    pub fn analyze(
        &self,
        files: &[ParsedFile],
        records: &[PatternRecord],
        claimed: &HashSet<PatternId>,
        cancel: &AtomicBool,
    ) -> (Vec<ClassProfile>, Vec<DuplicateGroup>) {
        let profiles = self.build_profiles(files, records);
        let inherited = inherited_members(&profiles);

        let comparable = |id: PatternId| {
            let record = &records[id.index()];
            let owner = &record.pattern.owner;
            let class = owner.class.as_deref().unwrap_or_default();
            !claimed.contains(&id)
                && !inherited.contains(&(
                    record.pattern.file.clone(),
                    class.to_string(),
                    owner.name.clone(),
                ))
        };

        let methods: Vec<usize> = profiles
            .iter()
            .flat_map(|p| p.methods.iter().copied())
            .filter(|&id| comparable(id))
            .map(|id| id.index())
            .collect();
        let fields: Vec<usize> = profiles
            .iter()
            .flat_map(|p| p.fields.iter().copied())
            .filter(|&id| comparable(id))
            .map(|id| id.index())
            .collect();

        let grouper = PatternGrouper::new(self.config);
        let cross_class = |a: &crate::core::Pattern, b: &crate::core::Pattern| {
            a.class_identity() != b.class_identity()
        };

        let mut groups =
            grouper.cluster(records, &methods, GroupOrigin::ClassAnalyzer, cancel, cross_class);
        groups.extend(grouper.cluster(
            records,
            &fields,
            GroupOrigin::ClassAnalyzer,
            cancel,
            cross_class,
        ));
        groups.sort_by(|a, b| {
            (a.category, a.representative).cmp(&(b.category, b.representative))
        });

        debug!(
            "class analysis: {} profiles, {} groups",
            profiles.len(),
            groups.len()
        );
        (profiles, groups)
    }

    /// One profile per class declaration, in (file, class) order.
    pub fn build_profiles(
        &self,
        files: &[ParsedFile],
        records: &[PatternRecord],
    ) -> Vec<ClassProfile> {
        let mut profiles: BTreeMap<(PathBuf, String), ClassProfile> = BTreeMap::new();
        for file in files {
            for class in &file.classes {
                profiles
                    .entry((file.path.clone(), class.name.clone()))
                    .or_insert_with(|| ClassProfile {
                        name: class.name.clone(),
                        file: file.path.clone(),
                        methods: Vec::new(),
                        fields: Vec::new(),
                        inherited: class.inherited.clone(),
                    });
            }
        }

        for (index, record) in records.iter().enumerate() {
            let Some(class) = record.pattern.owner.class.clone() else {
                continue;
            };
            let Some(profile) = profiles.get_mut(&(record.pattern.file.clone(), class)) else {
                continue;
            };
            match record.pattern.kind {
                PatternKind::Method => profile.methods.push(PatternId(index)),
                PatternKind::Field => profile.fields.push(PatternId(index)),
                // Blocks nested inside methods stay in the main pipeline.
                _ => {}
            }
        }

        profiles.into_values().collect()
    }
}

/// (file, class, member-name) triples excluded from comparison.
fn inherited_members(profiles: &[ClassProfile]) -> HashSet<(PathBuf, String, String)> {
    profiles
        .iter()
        .flat_map(|p| {
            p.inherited
                .iter()
                .map(|member| (p.file.clone(), p.name.clone(), member.clone()))
        })
        .collect()
}
