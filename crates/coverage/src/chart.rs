//! Per-identifier match-type mix within each funnel segment.
//!
//! Chart data is read-only: it is computed from the classified dataset and
//! never feeds back into reconciliation. Precondition failures are returned
//! per identifier so one bad chart does not stop the others.

use std::fmt;

use serde::Serialize;

use crate::model::{ClassifiedDataset, FunnelSegment, MatchType};
use crate::normalize::normalize_identifier;
use crate::plan::TargetPlan;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTypeShare {
    pub match_type: MatchType,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentBar {
    pub segment: FunnelSegment,
    pub total: usize,
    /// Exact, broad and phrase shares; percentages sum to 100.
    pub shares: Vec<MatchTypeShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageChart {
    pub product_id: String,
    /// Short, Mid and Long bars, in that order.
    pub bars: Vec<SegmentBar>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    /// No keyword rows for the identifier.
    NoData { product_id: String },
    /// At least one funnel segment has no rows.
    MissingSegments {
        product_id: String,
        missing: Vec<FunnelSegment>,
    },
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData { product_id } => {
                write!(f, "no coverage data found for {product_id}")
            }
            Self::MissingSegments { product_id, missing } => {
                let names: Vec<&str> = missing.iter().map(|s| s.as_str()).collect();
                write!(f, "{product_id}: no rows in funnel segment(s) {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for ChartError {}

/// Build the chart for one identifier. Product rows carry no segment and are
/// left out.
pub fn coverage_chart(dataset: &ClassifiedDataset, product_id: &str) -> Result<CoverageChart, ChartError> {
    let key = normalize_identifier(product_id);

    // counts[segment][match type], both in declaration order
    let mut counts = [[0usize; 3]; 3];
    let mut any = false;
    for record in dataset.records.iter().filter(|r| r.product_key == key) {
        let (Some(segment), Some(mt_idx)) = (record.funnel_segment, keyword_index(record.match_type)) else {
            continue;
        };
        counts[segment_index(segment)][mt_idx] += 1;
        any = true;
    }

    if !any {
        return Err(ChartError::NoData { product_id: product_id.to_string() });
    }

    let missing: Vec<FunnelSegment> = FunnelSegment::ALL
        .iter()
        .copied()
        .filter(|s| counts[segment_index(*s)].iter().sum::<usize>() == 0)
        .collect();
    if !missing.is_empty() {
        return Err(ChartError::MissingSegments {
            product_id: product_id.to_string(),
            missing,
        });
    }

    let bars = FunnelSegment::ALL
        .iter()
        .map(|segment| {
            let row = counts[segment_index(*segment)];
            let total: usize = row.iter().sum();
            let shares = MatchType::KEYWORD
                .iter()
                .zip(row.iter())
                .map(|(mt, count)| MatchTypeShare {
                    match_type: *mt,
                    count: *count,
                    percentage: *count as f64 * 100.0 / total as f64,
                })
                .collect();
            SegmentBar { segment: *segment, total, shares }
        })
        .collect();

    Ok(CoverageChart {
        product_id: product_id.to_string(),
        bars,
    })
}

fn segment_index(segment: FunnelSegment) -> usize {
    match segment {
        FunnelSegment::Short => 0,
        FunnelSegment::Mid => 1,
        FunnelSegment::Long => 2,
    }
}

fn keyword_index(match_type: MatchType) -> Option<usize> {
    MatchType::KEYWORD.iter().position(|mt| *mt == match_type)
}

/// Chart result for one identifier as carried in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    Ready(CoverageChart),
    Unavailable { product_id: String, reason: String },
}

/// One outcome per distinct identifier of the plan, in plan order.
pub fn chart_outcomes(dataset: &ClassifiedDataset, plan: &TargetPlan) -> Vec<ChartOutcome> {
    plan.identifiers()
        .into_iter()
        .map(|id| match coverage_chart(dataset, id) {
            Ok(chart) => ChartOutcome::Ready(chart),
            Err(e) => ChartOutcome::Unavailable {
                product_id: id.to_string(),
                reason: e.to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::config::default_match_types;
    use crate::model::RawTarget;

    fn dataset(rows: &[(&str, &str, &str)]) -> ClassifiedDataset {
        let raw = rows
            .iter()
            .enumerate()
            .map(|(i, (campaign, id, target))| RawTarget {
                row: i + 2,
                product_id: id.to_string(),
                target: target.to_string(),
                campaign: campaign.to_string(),
                current_bid: None,
            })
            .collect();
        classify(raw, &default_match_types())
    }

    // word counts 1, 1, 3, 3, 5, 5 plus a 3-word product row -> mean 3, stddev ~1.63
    fn spread() -> ClassifiedDataset {
        dataset(&[
            ("exact-campaign-1", "B0ABC123XY", "mouse"),
            ("broad-campaign-1", "B0ABC123XY", "pad"),
            ("exact-campaign-1", "B0ABC123XY", "wireless gaming mouse"),
            ("phrase-campaign-1", "B0ABC123XY", "silent office mouse"),
            ("exact-campaign-1", "B0ABC123XY", "best wireless mouse for laptop"),
            ("exact-campaign-1", "B0ABC123XY", "ergonomic vertical mouse for wrists"),
            ("product-campaign-1", "B0ABC123XY", "b0xyz98765 b0aaa b0bbb"),
        ])
    }

    #[test]
    fn percentages_per_segment() {
        let chart = coverage_chart(&spread(), "b0abc123xy").unwrap();
        assert_eq!(chart.bars.len(), 3);

        let short = &chart.bars[0];
        assert_eq!(short.segment, FunnelSegment::Short);
        assert_eq!(short.total, 2);
        assert_eq!(short.shares[0].percentage, 50.0);
        assert_eq!(short.shares[1].percentage, 50.0);
        assert_eq!(short.shares[2].percentage, 0.0);

        let mid = &chart.bars[1];
        assert_eq!(mid.shares[0].count, 1);
        assert_eq!(mid.shares[2].count, 1);

        let long = &chart.bars[2];
        assert_eq!(long.shares[0].percentage, 100.0);
    }

    #[test]
    fn unknown_identifier_has_no_data() {
        let err = coverage_chart(&spread(), "B0NOTHERE0").unwrap_err();
        assert_eq!(err, ChartError::NoData { product_id: "B0NOTHERE0".into() });
    }

    #[test]
    fn absent_segment_is_reported() {
        let ds = dataset(&[
            ("exact-campaign-1", "B0ABC123XY", "mouse"),
            ("exact-campaign-1", "B0ABC123XY", "wireless mouse"),
        ]);
        // counts 1, 2 -> mean 1.5, stddev ~0.71: both Mid
        let err = coverage_chart(&ds, "B0ABC123XY").unwrap_err();
        match err {
            ChartError::MissingSegments { missing, .. } => {
                assert_eq!(missing, vec![FunnelSegment::Short, FunnelSegment::Long]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn outcomes_follow_plan_identifiers() {
        let plan = TargetPlan::from_pairs([("B0ABC123XY", "mouse"), ("B0NOTHERE0", "mouse"), ("b0abc123xy", "pad")]);
        let outcomes = chart_outcomes(&spread(), &plan);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], ChartOutcome::Ready(_)));
        assert!(matches!(outcomes[1], ChartOutcome::Unavailable { .. }));
    }
}
