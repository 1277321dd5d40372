//! Tabular views of engine results, ready for the I/O crate to write.
//!
//! Identifier, target, campaign and bid columns reuse the names from the
//! input column mapping so the output reads like the input sheet.

use crate::config::ColumnMapping;
use crate::model::{ClassifiedDataset, CoveredEntry, FunnelSegment, MissingEntry};
use crate::table::{Cell, Table};

pub const MATCH_TYPE_COLUMN: &str = "Match Type";
pub const FUNNEL_SEGMENT_COLUMN: &str = "Funnel Segment";
pub const MAXIMUM_PLACEMENT_COLUMN: &str = "maximum placement";
pub const MAXIMUM_PERCENTAGE_COLUMN: &str = "maximum percentage";
pub const EFFECTIVE_BID_COLUMN: &str = "effective bid";

fn segment_cell(segment: Option<FunnelSegment>) -> Cell {
    segment.map(|s| Cell::text(s.as_str())).unwrap_or(Cell::Empty)
}

/// Covered entries. Bid columns are appended only when the bid join ran.
pub fn covered_table(entries: &[CoveredEntry], columns: &ColumnMapping) -> Table {
    let with_bids = entries.iter().any(|e| e.bid.is_some());

    let mut headers = vec![
        columns.product_id.clone(),
        columns.target.clone(),
        columns.campaign.clone(),
        columns.bid.clone(),
        MATCH_TYPE_COLUMN.to_string(),
        FUNNEL_SEGMENT_COLUMN.to_string(),
    ];
    if with_bids {
        headers.extend([
            MAXIMUM_PLACEMENT_COLUMN.to_string(),
            MAXIMUM_PERCENTAGE_COLUMN.to_string(),
            EFFECTIVE_BID_COLUMN.to_string(),
        ]);
    }

    let mut table = Table::new(headers);
    for e in entries {
        let mut row = vec![
            Cell::text(e.product_id.as_str()),
            Cell::text(e.target.as_str()),
            Cell::text(e.campaign.as_str()),
            Cell::from(e.current_bid),
            Cell::text(e.match_type.as_str()),
            segment_cell(e.funnel_segment),
        ];
        if with_bids {
            let bid = e.bid.clone().unwrap_or_default();
            row.push(Cell::from(bid.maximum_placement));
            row.push(Cell::from(bid.maximum_percentage));
            row.push(Cell::from(bid.effective_bid));
        }
        table.push_row(row);
    }
    table
}

/// Missing entries: normalized identifier and keyword.
pub fn missing_table(entries: &[MissingEntry], columns: &ColumnMapping) -> Table {
    let mut table = Table::new(vec![
        columns.product_id.clone(),
        columns.target.clone(),
        MATCH_TYPE_COLUMN.to_string(),
        FUNNEL_SEGMENT_COLUMN.to_string(),
    ]);
    for e in entries {
        table.push_row(vec![
            Cell::text(e.product_id.as_str()),
            Cell::text(e.keyword.as_str()),
            Cell::text(e.match_type.as_str()),
            segment_cell(e.funnel_segment),
        ]);
    }
    table
}

/// Every classified row with its labels, in input order.
pub fn classified_table(dataset: &ClassifiedDataset, columns: &ColumnMapping) -> Table {
    let mut table = Table::new(vec![
        columns.product_id.clone(),
        columns.target.clone(),
        columns.campaign.clone(),
        columns.bid.clone(),
        MATCH_TYPE_COLUMN.to_string(),
        FUNNEL_SEGMENT_COLUMN.to_string(),
    ]);
    for r in &dataset.records {
        table.push_row(vec![
            Cell::text(r.product_id.as_str()),
            Cell::text(r.target.as_str()),
            Cell::text(r.campaign.as_str()),
            Cell::from(r.current_bid),
            Cell::text(r.match_type.as_str()),
            segment_cell(r.funnel_segment),
        ]);
    }
    table
}
