//! Text stacked bars for `spcov run --charts`.

use spcov_coverage::chart::{ChartOutcome, SegmentBar};
use spcov_coverage::model::MatchType;

const BAR_WIDTH: usize = 40;

fn glyph(match_type: MatchType) -> char {
    match match_type {
        MatchType::Exact => 'E',
        MatchType::Broad => 'B',
        MatchType::Phrase => 'P',
        MatchType::Product => '#',
    }
}

/// Split `width` columns by cumulative percentage so the pieces always sum
/// to `width`.
fn bar(segment: &SegmentBar, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut cumulative = 0.0;
    let mut drawn = 0usize;
    for share in &segment.shares {
        cumulative += share.percentage;
        let end = ((cumulative * width as f64 / 100.0).round() as usize).min(width);
        let len = end.saturating_sub(drawn);
        out.extend(std::iter::repeat(glyph(share.match_type)).take(len));
        drawn += len;
    }
    out
}

pub fn render_chart(outcome: &ChartOutcome) -> String {
    match outcome {
        ChartOutcome::Ready(chart) => {
            let mut out = format!("{}\n", chart.product_id);
            for segment in &chart.bars {
                let labels: Vec<String> = segment
                    .shares
                    .iter()
                    .map(|s| format!("{} {:.1}%", s.match_type, s.percentage))
                    .collect();
                out.push_str(&format!(
                    "  {:<5} |{:<width$}| {} (n={})\n",
                    segment.segment.as_str(),
                    bar(segment, BAR_WIDTH),
                    labels.join("  "),
                    segment.total,
                    width = BAR_WIDTH,
                ));
            }
            out.push_str("  legend: E exact, B broad, P phrase\n");
            out
        }
        ChartOutcome::Unavailable { product_id, reason } => {
            format!("{product_id}: chart unavailable: {reason}\n")
        }
    }
}
