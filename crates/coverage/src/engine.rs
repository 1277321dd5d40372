use std::collections::HashMap;

use tracing::debug;

use crate::baseline::WordCountBaseline;
use crate::bid::{apply_bid_adjustments, summarize_adjustments};
use crate::chart::chart_outcomes;
use crate::classify::classify;
use crate::config::{BidConfig, CoverageConfig};
use crate::error::CoverageError;
use crate::load::{load_bid_adjustments, load_targets};
use crate::model::{
    ClassifiedDataset, CoverageInput, CoverageMeta, CoverageOutcome, CoverageReport, CoveredEntry,
    FunnelSegment, MatchType, MissingEntry, Reconciliation, TargetRecord,
};
use crate::normalize::normalize_keyword;
use crate::plan::TargetPlan;
use crate::summary::compute_summary;

/// Load, classify, reconcile and (optionally) enrich one input file.
///
/// Any failure aborts the pass; no partial report is returned.
pub fn run(
    config: &CoverageConfig,
    plan: &TargetPlan,
    input: &CoverageInput,
) -> Result<CoverageReport, CoverageError> {
    let dataset = load_dataset(config, input)?;
    debug!(
        classified = dataset.records.len(),
        discarded = dataset.discarded,
        "classified targets"
    );

    let Reconciliation { covered, missing } = reconcile(&dataset, plan, &config.product_target_prefix);
    debug!(covered = covered.len(), missing = missing.len(), "reconciled desired targets");

    let (covered, unmatched_bid_campaigns, bids_applied) = match input.bids {
        Some(ref bids_table) => {
            let default_bids = BidConfig::default();
            let bid_config = config.bids.as_ref().unwrap_or(&default_bids);
            let adjustments = load_bid_adjustments(bids_table, bid_config)?;
            let maxima = summarize_adjustments(&adjustments);
            let join = apply_bid_adjustments(covered, &maxima);
            (join.entries, join.unmatched_campaigns, true)
        }
        None => (covered, Vec::new(), false),
    };

    let mut summary = compute_summary(&dataset, plan, &covered, &missing);
    if bids_applied {
        summary.unmatched_bid_campaigns = Some(unmatched_bid_campaigns.len());
    }

    Ok(CoverageReport {
        meta: CoverageMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            baseline: dataset.baseline,
        },
        summary,
        charts: chart_outcomes(&dataset, plan),
        covered,
        missing,
        unmatched_bid_campaigns,
    })
}

/// Load and classify the targets table of an input.
pub fn load_dataset(
    config: &CoverageConfig,
    input: &CoverageInput,
) -> Result<ClassifiedDataset, CoverageError> {
    let rows = load_targets(&input.targets, &config.input.columns)?;
    Ok(classify(rows, &config.match_types))
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Lookup from (match type, identifier key, target key) to dataset rows.
struct CoverageIndex<'a> {
    rows: HashMap<(MatchType, String, String), Vec<&'a TargetRecord>>,
}

impl<'a> CoverageIndex<'a> {
    fn build(dataset: &'a ClassifiedDataset) -> Self {
        let mut rows: HashMap<(MatchType, String, String), Vec<&'a TargetRecord>> = HashMap::new();
        for record in &dataset.records {
            rows.entry((record.match_type, record.product_key.clone(), record.target_key.clone()))
                .or_default()
                .push(record);
        }
        Self { rows }
    }

    fn lookup(&self, match_type: MatchType, product_key: &str, keyword_key: &str) -> &[&'a TargetRecord] {
        self.rows
            .get(&(match_type, product_key.to_string(), keyword_key.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Check every desired pair against the classified dataset.
///
/// Product targets (keyword starting with `product_prefix`) are checked only
/// against product rows. Other keywords are checked independently under exact,
/// broad and phrase, so one pair yields between zero and three missing entries.
pub fn reconcile(dataset: &ClassifiedDataset, plan: &TargetPlan, product_prefix: &str) -> Reconciliation {
    let index = CoverageIndex::build(dataset);
    let product_prefix = normalize_keyword(product_prefix);

    plan.targets()
        .iter()
        .flat_map(|target| {
            let product_key = target.product_key();
            let keyword_key = target.keyword_key();
            if keyword_key.starts_with(&product_prefix) {
                check_product(&index, &product_key, &keyword_key)
            } else {
                MatchType::KEYWORD
                    .iter()
                    .flat_map(|mt| check_keyword(&index, &dataset.baseline, *mt, &product_key, &keyword_key))
                    .collect()
            }
        })
        .collect()
}

fn check_product(index: &CoverageIndex<'_>, product_key: &str, keyword_key: &str) -> Vec<CoverageOutcome> {
    let rows = index.lookup(MatchType::Product, product_key, keyword_key);
    if rows.is_empty() {
        return vec![CoverageOutcome::Missing(MissingEntry {
            product_id: product_key.to_string(),
            keyword: keyword_key.to_string(),
            match_type: MatchType::Product,
            funnel_segment: None,
        })];
    }
    rows.iter()
        .map(|r| CoverageOutcome::Covered(covered_entry(r, MatchType::Product, None)))
        .collect()
}

fn check_keyword(
    index: &CoverageIndex<'_>,
    baseline: &WordCountBaseline,
    match_type: MatchType,
    product_key: &str,
    keyword_key: &str,
) -> Vec<CoverageOutcome> {
    let rows = index.lookup(match_type, product_key, keyword_key);
    if rows.is_empty() {
        return vec![CoverageOutcome::Missing(MissingEntry {
            product_id: product_key.to_string(),
            keyword: keyword_key.to_string(),
            match_type,
            funnel_segment: Some(baseline.segment_for(keyword_key)),
        })];
    }
    rows.iter()
        .map(|r| {
            let segment = baseline.segment_for(&r.target);
            CoverageOutcome::Covered(covered_entry(r, match_type, Some(segment)))
        })
        .collect()
}

fn covered_entry(
    record: &TargetRecord,
    match_type: MatchType,
    funnel_segment: Option<FunnelSegment>,
) -> CoveredEntry {
    CoveredEntry {
        product_id: record.product_id.clone(),
        target: record.target.clone(),
        campaign: record.campaign.clone(),
        current_bid: record.current_bid,
        match_type,
        funnel_segment,
        bid: None,
    }
}
