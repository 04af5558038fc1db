//! Single-linkage clustering of similar patterns.
//!
//! Pairwise scores are computed per category (never across categories) on
//! the rayon pool, then merged into a union-find in a single-threaded
//! phase: qualifying pairs are edges, connected components are
//! `DuplicateGroup`s. Sharing the union-find across workers is not worth
//! the locking complexity, so mutation stays in the merge phase.
//!
//! Categories above `category_shard_cap` are first split into geometric
//! size-range buckets. Pairs separated by a bucket boundary are never
//! compared, trading some recall at extreme scale for a bounded O(n^2)
//! cost per bucket.

use crate::config::DetectionConfig;
use crate::core::{Category, DuplicateGroup, GroupOrigin, Pattern, PatternId, PatternKind, PatternRecord};
use crate::similarity::SimilarityCalculator;
use log::{debug, warn};
use petgraph::unionfind::UnionFind;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

pub struct PatternGrouper<'a> {
    config: &'a DetectionConfig,
}

impl<'a> PatternGrouper<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Cluster the main-pipeline universe.
    ///
    /// Field sub-patterns belong to the class analyzer and are skipped, as
    /// are cross-class method pairs: those comparisons are the class
    /// analyzer's job, and letting both stages claim them would break
    /// group disjointness.
    pub fn group_patterns(
        &self,
        records: &[PatternRecord],
        cancel: &AtomicBool,
    ) -> Vec<DuplicateGroup> {
        let candidates: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.pattern.kind != PatternKind::Field)
            .map(|(id, _)| id)
            .collect();

        self.cluster(
            records,
            &candidates,
            GroupOrigin::MainPipeline,
            cancel,
            |a, b| {
                !(a.kind == PatternKind::Method
                    && b.kind == PatternKind::Method
                    && a.class_identity() != b.class_identity())
            },
        )
    }

    /// Cluster an arbitrary candidate set.
    ///
    /// `pair_allowed` vetoes individual comparisons before any scoring;
    /// vetoed pairs contribute neither edges nor aggregate scores.
    pub fn cluster<F>(
        &self,
        records: &[PatternRecord],
        candidates: &[usize],
        origin: GroupOrigin,
        cancel: &AtomicBool,
        pair_allowed: F,
    ) -> Vec<DuplicateGroup>
    where
        F: Fn(&Pattern, &Pattern) -> bool + Sync,
    {
        let calculator = SimilarityCalculator::new(self.config);

        let mut by_category: BTreeMap<Category, Vec<usize>> = BTreeMap::new();
        for &id in candidates {
            by_category
                .entry(records[id].classification.category)
                .or_default()
                .push(id);
        }

        let mut groups = Vec::new();
        'categories: for (category, ids) in by_category {
            if ids.len() < 2 {
                continue;
            }
            for bucket in self.shard(records, &ids) {
                if cancel.load(Ordering::Relaxed) {
                    warn!("cancellation requested; skipping remaining comparison shards");
                    break 'categories;
                }
                groups.extend(self.cluster_bucket(
                    records,
                    &bucket,
                    category,
                    origin,
                    &calculator,
                    &pair_allowed,
                ));
            }
        }

        groups.sort_by(|a, b| {
            (a.category, a.representative).cmp(&(b.category, b.representative))
        });
        debug!("{} duplicate groups ({origin:?})", groups.len());
        groups
    }

    /// Size-range sharding for oversized categories.
    fn shard(&self, records: &[PatternRecord], ids: &[usize]) -> Vec<Vec<usize>> {
        match self.config.category_shard_cap {
            Some(cap) if ids.len() > cap => {
                let mut buckets: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
                for &id in ids {
                    let key =
                        size_bucket(records[id].pattern.node_count, self.config.max_size_ratio);
                    buckets.entry(key).or_default().push(id);
                }
                buckets.into_values().collect()
            }
            _ => vec![ids.to_vec()],
        }
    }

    fn cluster_bucket<F>(
        &self,
        records: &[PatternRecord],
        bucket: &[usize],
        category: Category,
        origin: GroupOrigin,
        calculator: &SimilarityCalculator<'_>,
        pair_allowed: &F,
    ) -> Vec<DuplicateGroup>
    where
        F: Fn(&Pattern, &Pattern) -> bool + Sync,
    {
        let n = bucket.len();
        if n < 2 {
            return Vec::new();
        }

        let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }

        let score_pair = |&(i, j): &(usize, usize)| -> Option<(usize, usize, f64)> {
            let a = &records[bucket[i]].pattern;
            let b = &records[bucket[j]].pattern;
            if !pair_allowed(a, b) {
                return None;
            }
            Some((i, j, calculator.score(a, b).value))
        };

        let scored: Vec<(usize, usize, f64)> = if self.config.parallel {
            pairs.par_iter().filter_map(score_pair).collect()
        } else {
            pairs.iter().filter_map(score_pair).collect()
        };

        // Single-threaded merge phase.
        let mut uf = UnionFind::<usize>::new(n);
        for &(i, j, value) in &scored {
            if value >= self.config.similarity_threshold {
                uf.union(i, j);
            }
        }

        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for pos in 0..n {
            by_root.entry(uf.find(pos)).or_default().push(pos);
        }

        let mut groups = Vec::new();
        for positions in by_root.into_values() {
            if positions.len() < 2 {
                continue;
            }
            let member_set: HashSet<usize> = positions.iter().copied().collect();
            let aggregate = scored
                .iter()
                .filter(|(i, j, _)| member_set.contains(i) && member_set.contains(j))
                .map(|&(_, _, value)| value)
                .fold(f64::INFINITY, f64::min);

            let mut members: Vec<PatternId> =
                positions.iter().map(|&pos| PatternId(bucket[pos])).collect();
            members.sort();
            let representative = members[0];

            let classes = if origin == GroupOrigin::ClassAnalyzer {
                let set: BTreeSet<String> = members
                    .iter()
                    .filter_map(|id| records[id.index()].pattern.owner.class.clone())
                    .collect();
                set.into_iter().collect()
            } else {
                Vec::new()
            };

            groups.push(DuplicateGroup {
                category,
                members,
                aggregate_similarity: aggregate,
                representative,
                origin,
                classes,
            });
        }
        groups
    }
}

/// Geometric bucket keyed so two patterns within `max_size_ratio` of each
/// other can only be separated at a bucket boundary.
fn size_bucket(node_count: usize, ratio: f64) -> i64 {
    if node_count == 0 {
        return i64::MIN;
    }
    if ratio <= 1.0 {
        return node_count as i64;
    }
    ((node_count as f64).ln() / ratio.ln()).floor() as i64
}
