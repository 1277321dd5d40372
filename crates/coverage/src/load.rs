use crate::config::{BidConfig, ColumnMapping};
use crate::error::CoverageError;
use crate::model::{BidAdjustment, RawTarget};
use crate::table::{Cell, Table};

const TARGETS_TABLE: &str = "targets";
const BIDS_TABLE: &str = "bids";

fn require_column(table: &Table, table_name: &str, column: &str) -> Result<usize, CoverageError> {
    table.column_index(column).ok_or_else(|| CoverageError::MissingColumn {
        table: table_name.into(),
        column: column.into(),
    })
}

/// Spreadsheet row number of a data row (header is row 1).
fn sheet_row(idx: usize) -> usize {
    idx + 2
}

fn parse_number(
    cell: &Cell,
    table_name: &str,
    idx: usize,
    column: &str,
) -> Result<Option<f64>, CoverageError> {
    cell.as_number().map_err(|value| CoverageError::InvalidNumber {
        table: table_name.into(),
        row: sheet_row(idx),
        column: column.into(),
        value,
    })
}

/// Read the four target columns. Fully empty rows are skipped; a bid cell
/// that is not a number fails the whole load.
pub fn load_targets(table: &Table, columns: &ColumnMapping) -> Result<Vec<RawTarget>, CoverageError> {
    let product_idx = require_column(table, TARGETS_TABLE, &columns.product_id)?;
    let target_idx = require_column(table, TARGETS_TABLE, &columns.target)?;
    let campaign_idx = require_column(table, TARGETS_TABLE, &columns.campaign)?;
    let bid_idx = require_column(table, TARGETS_TABLE, &columns.bid)?;

    let mut rows = Vec::with_capacity(table.len());
    for (idx, row) in table.rows.iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }

        let current_bid = parse_number(Table::cell(row, bid_idx), TARGETS_TABLE, idx, &columns.bid)?;

        rows.push(RawTarget {
            row: sheet_row(idx),
            product_id: Table::cell(row, product_idx).as_text(),
            target: Table::cell(row, target_idx).as_text(),
            campaign: Table::cell(row, campaign_idx).as_text(),
            current_bid,
        });
    }

    Ok(rows)
}

/// Read placement modifiers, keeping only rows of the configured entity.
pub fn load_bid_adjustments(table: &Table, config: &BidConfig) -> Result<Vec<BidAdjustment>, CoverageError> {
    let cols = &config.columns;
    let entity_idx = require_column(table, BIDS_TABLE, &cols.entity)?;
    let campaign_idx = require_column(table, BIDS_TABLE, &cols.campaign)?;
    let placement_idx = require_column(table, BIDS_TABLE, &cols.placement)?;
    let percentage_idx = require_column(table, BIDS_TABLE, &cols.percentage)?;

    let entity = config.entity.trim();
    let mut adjustments = Vec::new();

    for (idx, row) in table.rows.iter().enumerate() {
        if Table::cell(row, entity_idx).as_text().trim() != entity {
            continue;
        }

        let percentage_cell = Table::cell(row, percentage_idx);
        let percentage = parse_number(percentage_cell, BIDS_TABLE, idx, &cols.percentage)?
            .ok_or_else(|| CoverageError::InvalidNumber {
                table: BIDS_TABLE.into(),
                row: sheet_row(idx),
                column: cols.percentage.clone(),
                value: String::new(),
            })?;

        adjustments.push(BidAdjustment {
            campaign: Table::cell(row, campaign_idx).as_text(),
            placement: Table::cell(row, placement_idx).as_text(),
            percentage,
        });
    }

    Ok(adjustments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn t(s: &str) -> Cell {
        Cell::text(s)
    }

    #[test]
    fn load_targets_reads_mapped_columns() {
        let input = table(
            &["Campaign Name", "ASIN", "Target", "Current Bid", "Impressions"],
            vec![
                vec![t("exact-campaign-1"), t("B0ABC123XY"), t("wireless mouse"), Cell::Number(1.5), Cell::Number(10.0)],
                vec![Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty],
                vec![t("broad-campaign-1"), Cell::Number(12345.0), t("mouse"), Cell::Empty],
            ],
        );
        let rows = load_targets(&input, &ColumnMapping::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].campaign, "exact-campaign-1");
        assert_eq!(rows[0].current_bid, Some(1.5));
        assert_eq!(rows[1].row, 4);
        assert_eq!(rows[1].product_id, "12345");
        assert_eq!(rows[1].current_bid, None);
    }

    #[test]
    fn load_targets_missing_column() {
        let input = table(&["ASIN", "Target", "Campaign Name"], vec![]);
        let err = load_targets(&input, &ColumnMapping::default()).unwrap_err();
        assert_eq!(err.to_string(), "targets: missing column 'Current Bid'");
    }

    #[test]
    fn load_targets_rejects_text_bid() {
        let input = table(
            &["ASIN", "Target", "Campaign Name", "Current Bid"],
            vec![vec![t("B0ABC123XY"), t("mouse"), t("exact-campaign-1"), t("n/a")]],
        );
        let err = load_targets(&input, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, CoverageError::InvalidNumber { row: 2, .. }));
    }

    #[test]
    fn load_bids_filters_entity() {
        let input = table(
            &["Entity", "Campaign Name (Informational only)", "Placement", "Percentage"],
            vec![
                vec![t("Campaign"), t("exact-campaign-1"), Cell::Empty, Cell::Empty],
                vec![t("Bidding Adjustment"), t("exact-campaign-1"), t("Placement Top"), Cell::Number(20.0)],
                vec![t("Bidding Adjustment"), t("exact-campaign-1"), t("Placement Product Page"), t("35")],
            ],
        );
        let adjustments = load_bid_adjustments(&input, &BidConfig::default()).unwrap();
        assert_eq!(adjustments.len(), 2);
        assert_eq!(adjustments[1].placement, "Placement Product Page");
        assert_eq!(adjustments[1].percentage, 35.0);
    }

    #[test]
    fn load_bids_requires_percentage() {
        let input = table(
            &["Entity", "Campaign Name (Informational only)", "Placement", "Percentage"],
            vec![vec![t("Bidding Adjustment"), t("c"), t("Placement Top"), Cell::Empty]],
        );
        let err = load_bid_adjustments(&input, &BidConfig::default()).unwrap_err();
        assert!(matches!(err, CoverageError::InvalidNumber { .. }));
    }
}
