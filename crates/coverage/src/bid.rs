use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::model::{BidAdjustment, CoveredEntry, EffectiveBid, PlacementMax};

/// Highest percentage per campaign, with every placement that reaches it.
pub fn summarize_adjustments(adjustments: &[BidAdjustment]) -> BTreeMap<String, PlacementMax> {
    let mut maxima: BTreeMap<String, f64> = BTreeMap::new();
    for adj in adjustments {
        maxima
            .entry(adj.campaign.clone())
            .and_modify(|m| *m = m.max(adj.percentage))
            .or_insert(adj.percentage);
    }

    let mut placements: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for adj in adjustments {
        if maxima.get(&adj.campaign) == Some(&adj.percentage) {
            placements.entry(adj.campaign.clone()).or_default().push(adj.placement.as_str());
        }
    }

    maxima
        .into_iter()
        .map(|(campaign, maximum_percentage)| {
            let maximum_placement = placements
                .get(&campaign)
                .map(|p| p.join(", "))
                .unwrap_or_default();
            let max = PlacementMax {
                campaign: campaign.clone(),
                maximum_placement,
                maximum_percentage,
            };
            (campaign, max)
        })
        .collect()
}

/// Covered entries after the bid join.
#[derive(Debug, Clone, PartialEq)]
pub struct BidJoin {
    pub entries: Vec<CoveredEntry>,
    /// Distinct campaigns of covered rows with no adjustment rows, sorted.
    pub unmatched_campaigns: Vec<String>,
}

pub fn effective_bid(current_bid: Option<f64>, maximum_percentage: f64) -> Option<f64> {
    current_bid.map(|bid| bid * (1.0 + maximum_percentage / 100.0))
}

/// Left-join placement maxima onto covered entries by exact campaign name.
///
/// Campaigns without adjustment rows keep empty bid fields; they are reported
/// in [`BidJoin::unmatched_campaigns`] rather than failing the run.
pub fn apply_bid_adjustments(entries: Vec<CoveredEntry>, maxima: &BTreeMap<String, PlacementMax>) -> BidJoin {
    let mut unmatched = BTreeSet::new();

    let entries: Vec<CoveredEntry> = entries
        .into_iter()
        .map(|mut entry| {
            entry.bid = Some(match maxima.get(&entry.campaign) {
                Some(max) => EffectiveBid {
                    maximum_placement: Some(max.maximum_placement.clone()),
                    maximum_percentage: Some(max.maximum_percentage),
                    effective_bid: effective_bid(entry.current_bid, max.maximum_percentage),
                },
                None => {
                    unmatched.insert(entry.campaign.clone());
                    EffectiveBid::default()
                }
            });
            entry
        })
        .collect();

    if !unmatched.is_empty() {
        warn!(
            campaigns = unmatched.len(),
            "covered campaigns without bid adjustments; effective bid left empty"
        );
    }

    BidJoin {
        entries,
        unmatched_campaigns: unmatched.into_iter().collect(),
    }
}
