use crate::baseline::WordCountBaseline;
use crate::config::PrefixRule;
use crate::model::{ClassifiedDataset, FunnelSegment, MatchType, RawTarget, TargetRecord};
use crate::normalize::{normalize_identifier, normalize_keyword};

/// Match type of a campaign, or `None` ("other") when no prefix applies.
/// Rules are tried in order; the first matching prefix wins.
pub fn match_type_for(campaign: &str, rules: &[PrefixRule]) -> Option<MatchType> {
    rules
        .iter()
        .find(|rule| campaign.starts_with(rule.prefix.as_str()))
        .map(|rule| rule.match_type)
}

/// Bucket a word count against a dataset's mean and standard deviation.
/// Both band edges belong to `Mid`.
pub fn assign_segment(word_count: usize, mean: f64, stddev: f64) -> FunnelSegment {
    let count = word_count as f64;
    if count < mean - stddev {
        FunnelSegment::Short
    } else if count <= mean + stddev {
        FunnelSegment::Mid
    } else {
        FunnelSegment::Long
    }
}

/// Label every row, drop unrecognized campaigns, and assign funnel segments
/// against one baseline built from all surviving rows.
pub fn classify(rows: Vec<RawTarget>, rules: &[PrefixRule]) -> ClassifiedDataset {
    let total = rows.len();
    let labelled: Vec<(RawTarget, MatchType)> = rows
        .into_iter()
        .filter_map(|row| match_type_for(&row.campaign, rules).map(|mt| (row, mt)))
        .collect();
    let discarded = total - labelled.len();

    let baseline = WordCountBaseline::from_texts(labelled.iter().map(|(row, _)| row.target.as_str()));

    let records = labelled
        .into_iter()
        .map(|(row, match_type)| {
            let funnel_segment = match_type.is_keyword().then(|| baseline.segment_for(&row.target));
            TargetRecord {
                product_key: normalize_identifier(&row.product_id),
                target_key: normalize_keyword(&row.target),
                row: row.row,
                product_id: row.product_id,
                target: row.target,
                campaign: row.campaign,
                current_bid: row.current_bid,
                match_type,
                funnel_segment,
            }
        })
        .collect();

    ClassifiedDataset { records, baseline, discarded }
}
