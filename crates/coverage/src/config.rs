use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::error::CoverageError;
use crate::model::MatchType;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CoverageConfig {
    pub name: String,
    /// Normalized keywords starting with this prefix are product targets.
    #[serde(default = "default_product_target_prefix")]
    pub product_target_prefix: String,
    /// Treat any missing target as a failed run.
    #[serde(default)]
    pub fail_on_missing: bool,
    /// Plain-text targets file merged with `[targets]`.
    #[serde(default)]
    pub targets_file: Option<String>,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default = "default_match_types")]
    pub match_types: Vec<PrefixRule>,
    /// Identifier -> desired keywords.
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub bids: Option<BidConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_product_target_prefix() -> String {
    "b0".into()
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub file: Option<String>,
    /// Sheet to read from a workbook; first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    #[serde(default = "default_product_id_column")]
    pub product_id: String,
    #[serde(default = "default_target_column")]
    pub target: String,
    #[serde(default = "default_campaign_column")]
    pub campaign: String,
    #[serde(default = "default_bid_column")]
    pub bid: String,
}

fn default_product_id_column() -> String {
    "ASIN".into()
}
fn default_target_column() -> String {
    "Target".into()
}
fn default_campaign_column() -> String {
    "Campaign Name".into()
}
fn default_bid_column() -> String {
    "Current Bid".into()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            product_id: default_product_id_column(),
            target: default_target_column(),
            campaign: default_campaign_column(),
            bid: default_bid_column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Match types
// ---------------------------------------------------------------------------

/// Campaign-name prefix that assigns a match type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub match_type: MatchType,
}

impl PrefixRule {
    pub fn new(prefix: impl Into<String>, match_type: MatchType) -> Self {
        Self { prefix: prefix.into(), match_type }
    }
}

/// Descriptive prefixes first, then the short campaign codes.
pub fn default_match_types() -> Vec<PrefixRule> {
    vec![
        PrefixRule::new("exact-campaign", MatchType::Exact),
        PrefixRule::new("broad-campaign", MatchType::Broad),
        PrefixRule::new("phrase-campaign", MatchType::Phrase),
        PrefixRule::new("product-campaign", MatchType::Product),
        PrefixRule::new("OW_", MatchType::Exact),
        PrefixRule::new("BR_", MatchType::Broad),
        PrefixRule::new("PH_", MatchType::Phrase),
        PrefixRule::new("OP_", MatchType::Product),
    ]
}

// ---------------------------------------------------------------------------
// Bid adjustments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BidConfig {
    #[serde(default)]
    pub file: Option<String>,
    /// Only workbook sheets whose name contains this fragment are read.
    #[serde(default = "default_sheet_contains")]
    pub sheet_contains: String,
    /// Entity value of the rows that carry placement modifiers.
    #[serde(default = "default_entity")]
    pub entity: String,
    #[serde(default)]
    pub columns: BidColumnMapping,
}

fn default_sheet_contains() -> String {
    "Sponsored Products Campaigns".into()
}
fn default_entity() -> String {
    "Bidding Adjustment".into()
}

impl Default for BidConfig {
    fn default() -> Self {
        Self {
            file: None,
            sheet_contains: default_sheet_contains(),
            entity: default_entity(),
            columns: BidColumnMapping::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BidColumnMapping {
    #[serde(default = "default_entity_column")]
    pub entity: String,
    #[serde(default = "default_bid_campaign_column")]
    pub campaign: String,
    #[serde(default = "default_placement_column")]
    pub placement: String,
    #[serde(default = "default_percentage_column")]
    pub percentage: String,
}

fn default_entity_column() -> String {
    "Entity".into()
}
fn default_bid_campaign_column() -> String {
    "Campaign Name (Informational only)".into()
}
fn default_placement_column() -> String {
    "Placement".into()
}
fn default_percentage_column() -> String {
    "Percentage".into()
}

impl Default for BidColumnMapping {
    fn default() -> Self {
        Self {
            entity: default_entity_column(),
            campaign: default_bid_campaign_column(),
            placement: default_placement_column(),
            percentage: default_percentage_column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub json: Option<String>,
}

fn default_output_dir() -> String {
    ".".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::default(),
            json: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CoverageConfig {
    /// Config with every default and no targets, for ad-hoc classification.
    pub fn unnamed() -> Self {
        Self {
            name: "adhoc".into(),
            product_target_prefix: default_product_target_prefix(),
            fail_on_missing: false,
            targets_file: None,
            input: InputConfig::default(),
            match_types: default_match_types(),
            targets: BTreeMap::new(),
            bids: None,
            output: OutputConfig::default(),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, CoverageError> {
        let config: CoverageConfig =
            toml::from_str(input).map_err(|e| CoverageError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoverageError> {
        if self.name.trim().is_empty() {
            return Err(CoverageError::ConfigValidation("name must not be empty".into()));
        }

        if self.product_target_prefix.trim().is_empty() {
            return Err(CoverageError::ConfigValidation(
                "product_target_prefix must not be empty".into(),
            ));
        }

        let cols = &self.input.columns;
        check_columns(
            "input.columns",
            &[
                ("product_id", &cols.product_id),
                ("target", &cols.target),
                ("campaign", &cols.campaign),
                ("bid", &cols.bid),
            ],
        )?;

        if self.match_types.is_empty() {
            return Err(CoverageError::ConfigValidation(
                "at least one match_types rule is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for rule in &self.match_types {
            if rule.prefix.is_empty() {
                return Err(CoverageError::ConfigValidation(format!(
                    "match_types: empty prefix for '{}'",
                    rule.match_type
                )));
            }
            if !seen.insert(rule.prefix.as_str()) {
                return Err(CoverageError::ConfigValidation(format!(
                    "match_types: duplicate prefix '{}'",
                    rule.prefix
                )));
            }
        }

        for (id, keywords) in &self.targets {
            if id.trim().is_empty() {
                return Err(CoverageError::ConfigValidation(
                    "targets: identifier must not be empty".into(),
                ));
            }
            if keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(CoverageError::ConfigValidation(format!(
                    "targets: '{id}' has no keywords"
                )));
            }
        }

        if let Some(ref bids) = self.bids {
            if bids.entity.trim().is_empty() {
                return Err(CoverageError::ConfigValidation(
                    "bids.entity must not be empty".into(),
                ));
            }
            let c = &bids.columns;
            check_columns(
                "bids.columns",
                &[
                    ("entity", &c.entity),
                    ("campaign", &c.campaign),
                    ("placement", &c.placement),
                    ("percentage", &c.percentage),
                ],
            )?;
        }

        Ok(())
    }
}

fn check_columns(section: &str, columns: &[(&str, &String)]) -> Result<(), CoverageError> {
    let mut seen = HashSet::new();
    for (field, column) in columns {
        let column = column.trim();
        if column.is_empty() {
            return Err(CoverageError::ConfigValidation(format!(
                "{section}.{field} must not be empty"
            )));
        }
        if !seen.insert(column) {
            return Err(CoverageError::ConfigValidation(format!(
                "{section}: column '{column}' mapped more than once"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Weekly coverage"
product_target_prefix = "b0"
fail_on_missing = true
targets_file = "targets.txt"

[input]
file = "bmt.xlsx"
sheet = "Targets"

[input.columns]
product_id = "Advertised ASIN"

[[match_types]]
prefix = "OW_"
match_type = "exact"

[[match_types]]
prefix = "OP_"
match_type = "product"

[targets]
"B0ABC123XY" = ["wireless mouse", "B0XYZ98765"]

[bids]
file = "bulk.xlsx"

[output]
dir = "reports"
format = "csv"
json = "report.json"
"#;

    #[test]
    fn parse_full_config() {
        let config = CoverageConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "Weekly coverage");
        assert!(config.fail_on_missing);
        assert_eq!(config.targets_file.as_deref(), Some("targets.txt"));
        assert_eq!(config.input.file.as_deref(), Some("bmt.xlsx"));
        assert_eq!(config.input.sheet.as_deref(), Some("Targets"));
        assert_eq!(config.input.columns.product_id, "Advertised ASIN");
        // Unspecified columns keep defaults
        assert_eq!(config.input.columns.campaign, "Campaign Name");
        assert_eq!(config.match_types.len(), 2);
        assert_eq!(config.match_types[1], PrefixRule::new("OP_", MatchType::Product));
        assert_eq!(config.targets["B0ABC123XY"].len(), 2);

        let bids = config.bids.unwrap();
        assert_eq!(bids.file.as_deref(), Some("bulk.xlsx"));
        assert_eq!(bids.entity, "Bidding Adjustment");
        assert_eq!(bids.sheet_contains, "Sponsored Products Campaigns");
        assert_eq!(bids.columns.campaign, "Campaign Name (Informational only)");

        assert_eq!(config.output.dir, "reports");
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert_eq!(config.output.json.as_deref(), Some("report.json"));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = CoverageConfig::from_toml("name = \"Minimal\"").unwrap();
        assert_eq!(config.product_target_prefix, "b0");
        assert!(!config.fail_on_missing);
        assert!(config.input.file.is_none());
        assert_eq!(config.input.columns.product_id, "ASIN");
        assert_eq!(config.input.columns.bid, "Current Bid");
        assert_eq!(config.match_types, default_match_types());
        assert!(config.bids.is_none());
        assert_eq!(config.output.format, OutputFormat::Xlsx);
        assert_eq!(config.output.dir, ".");
    }

    #[test]
    fn reject_unknown_match_type() {
        let input = r#"
name = "Bad"

[[match_types]]
prefix = "AU_"
match_type = "auto"
"#;
        let err = CoverageConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, CoverageError::ConfigParse(_)));
    }

    #[test]
    fn reject_duplicate_prefix() {
        let input = r#"
name = "Bad"

[[match_types]]
prefix = "OW_"
match_type = "exact"

[[match_types]]
prefix = "OW_"
match_type = "broad"
"#;
        let err = CoverageConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate prefix 'OW_'"));
    }

    #[test]
    fn reject_duplicate_column_mapping() {
        let input = r#"
name = "Bad"

[input.columns]
product_id = "Target"
"#;
        let err = CoverageConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'Target' mapped more than once"));
    }

    #[test]
    fn reject_identifier_without_keywords() {
        let input = r#"
name = "Bad"

[targets]
"B0ABC123XY" = ["", "  "]
"#;
        let err = CoverageConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'B0ABC123XY' has no keywords"));
    }

    #[test]
    fn reject_empty_name() {
        let err = CoverageConfig::from_toml("name = \" \"").unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }
}
