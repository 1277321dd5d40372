use serde::{Deserialize, Serialize};

use crate::baseline::WordCountBaseline;
use crate::chart::ChartOutcome;
use crate::table::Table;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Broad,
    Phrase,
    Product,
}

impl MatchType {
    /// The keyword match types checked independently for non-product targets.
    pub const KEYWORD: [MatchType; 3] = [MatchType::Exact, MatchType::Broad, MatchType::Phrase];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Broad => "broad",
            Self::Phrase => "phrase",
            Self::Product => "product",
        }
    }

    pub fn is_keyword(&self) -> bool {
        !matches!(self, Self::Product)
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FunnelSegment {
    Short,
    Mid,
    Long,
}

impl FunnelSegment {
    pub const ALL: [FunnelSegment; 3] = [FunnelSegment::Short, FunnelSegment::Mid, FunnelSegment::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "Short",
            Self::Mid => "Mid",
            Self::Long => "Long",
        }
    }
}

impl std::fmt::Display for FunnelSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Pre-loaded tables for one run.
pub struct CoverageInput {
    pub targets: Table,
    pub bids: Option<Table>,
}

/// One row of the targets table before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTarget {
    /// 1-based spreadsheet row (header is row 1).
    pub row: usize,
    pub product_id: String,
    pub target: String,
    pub campaign: String,
    pub current_bid: Option<f64>,
}

/// A classified row of the primary dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetRecord {
    pub row: usize,
    pub product_id: String,
    pub target: String,
    pub campaign: String,
    pub current_bid: Option<f64>,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funnel_segment: Option<FunnelSegment>,
    /// Normalized identifier used for comparison.
    #[serde(skip)]
    pub product_key: String,
    /// Normalized target used for comparison.
    #[serde(skip)]
    pub target_key: String,
}

/// Surviving records of one input file plus the baseline they share.
#[derive(Debug, Clone)]
pub struct ClassifiedDataset {
    pub records: Vec<TargetRecord>,
    pub baseline: WordCountBaseline,
    /// Rows dropped because their campaign prefix was not recognized.
    pub discarded: usize,
}

impl ClassifiedDataset {
    pub fn partition(&self, match_type: MatchType) -> impl Iterator<Item = &TargetRecord> {
        self.records.iter().filter(move |r| r.match_type == match_type)
    }
}

// ---------------------------------------------------------------------------
// Coverage
// ---------------------------------------------------------------------------

/// Bid columns added to a covered row by the bid join. All `None` when the
/// campaign has no adjustment rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EffectiveBid {
    pub maximum_placement: Option<String>,
    pub maximum_percentage: Option<f64>,
    pub effective_bid: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoveredEntry {
    pub product_id: String,
    pub target: String,
    pub campaign: String,
    pub current_bid: Option<f64>,
    pub match_type: MatchType,
    pub funnel_segment: Option<FunnelSegment>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub bid: Option<EffectiveBid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub product_id: String,
    pub keyword: String,
    pub match_type: MatchType,
    pub funnel_segment: Option<FunnelSegment>,
}

/// Result of checking one desired target under one match type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverageOutcome {
    Covered(CoveredEntry),
    Missing(MissingEntry),
}

/// Covered and missing entries, partitioned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub covered: Vec<CoveredEntry>,
    pub missing: Vec<MissingEntry>,
}

impl FromIterator<CoverageOutcome> for Reconciliation {
    fn from_iter<I: IntoIterator<Item = CoverageOutcome>>(iter: I) -> Self {
        let mut out = Reconciliation::default();
        for outcome in iter {
            match outcome {
                CoverageOutcome::Covered(c) => out.covered.push(c),
                CoverageOutcome::Missing(m) => out.missing.push(m),
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Bid adjustments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BidAdjustment {
    pub campaign: String,
    pub placement: String,
    pub percentage: f64,
}

/// Highest placement modifier of one campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementMax {
    pub campaign: String,
    /// Every placement at the maximum, comma-joined in input order.
    pub maximum_placement: String,
    pub maximum_percentage: f64,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchTypeCounts {
    pub exact: usize,
    pub broad: usize,
    pub phrase: usize,
    pub product: usize,
}

impl MatchTypeCounts {
    pub fn add(&mut self, match_type: MatchType) {
        match match_type {
            MatchType::Exact => self.exact += 1,
            MatchType::Broad => self.broad += 1,
            MatchType::Phrase => self.phrase += 1,
            MatchType::Product => self.product += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageSummary {
    pub classified_rows: usize,
    pub discarded_rows: usize,
    pub desired_pairs: usize,
    pub covered_rows: usize,
    pub missing_rows: usize,
    /// Desired pairs with no covered row under any match type.
    pub uncovered_pairs: usize,
    pub covered_by_match_type: MatchTypeCounts,
    pub missing_by_match_type: MatchTypeCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched_bid_campaigns: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub baseline: WordCountBaseline,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub meta: CoverageMeta,
    pub summary: CoverageSummary,
    pub covered: Vec<CoveredEntry>,
    pub missing: Vec<MissingEntry>,
    pub charts: Vec<ChartOutcome>,
    /// Campaigns of covered rows absent from the bid adjustments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched_bid_campaigns: Vec<String>,
}
