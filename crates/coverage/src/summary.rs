use std::collections::HashSet;

use crate::model::{ClassifiedDataset, CoverageSummary, CoveredEntry, MatchTypeCounts, MissingEntry};
use crate::normalize::{normalize_identifier, normalize_keyword};
use crate::plan::TargetPlan;

/// Compute summary statistics from reconciled entries.
pub fn compute_summary(
    dataset: &ClassifiedDataset,
    plan: &TargetPlan,
    covered: &[CoveredEntry],
    missing: &[MissingEntry],
) -> CoverageSummary {
    let mut covered_by_match_type = MatchTypeCounts::default();
    let mut covered_keys = HashSet::new();
    for c in covered {
        covered_by_match_type.add(c.match_type);
        covered_keys.insert((normalize_identifier(&c.product_id), normalize_keyword(&c.target)));
    }

    let mut missing_by_match_type = MatchTypeCounts::default();
    for m in missing {
        missing_by_match_type.add(m.match_type);
    }

    let uncovered_pairs = plan
        .targets()
        .iter()
        .filter(|t| !covered_keys.contains(&(t.product_key(), t.keyword_key())))
        .count();

    CoverageSummary {
        classified_rows: dataset.records.len(),
        discarded_rows: dataset.discarded,
        desired_pairs: plan.len(),
        covered_rows: covered.len(),
        missing_rows: missing.len(),
        uncovered_pairs,
        covered_by_match_type,
        missing_by_match_type,
        unmatched_bid_campaigns: None,
    }
}
