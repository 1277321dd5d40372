use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::CoverageError;
use crate::normalize::{normalize_identifier, normalize_keyword};

/// A (product identifier, keyword) pair to check for coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredTarget {
    pub product_id: String,
    pub keyword: String,
}

impl DesiredTarget {
    pub fn product_key(&self) -> String {
        normalize_identifier(&self.product_id)
    }

    pub fn keyword_key(&self) -> String {
        normalize_keyword(&self.keyword)
    }
}

/// Immutable, ordered set of desired targets for one run.
///
/// Pairs that normalize to the same (identifier, keyword) key are kept once,
/// at their first position. Blank identifiers or keywords are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetPlan {
    targets: Vec<DesiredTarget>,
}

impl TargetPlan {
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for (id, keyword) in pairs {
            let target = DesiredTarget {
                product_id: id.into().trim().to_string(),
                keyword: keyword.into().trim().to_string(),
            };
            if target.product_id.is_empty() || target.keyword.is_empty() {
                continue;
            }
            if seen.insert((target.product_key(), target.keyword_key())) {
                targets.push(target);
            }
        }
        Self { targets }
    }

    pub fn from_map(map: &BTreeMap<String, Vec<String>>) -> Self {
        Self::from_pairs(
            map.iter()
                .flat_map(|(id, keywords)| keywords.iter().map(move |k| (id.as_str(), k.as_str()))),
        )
    }

    /// Parse the targets text format:
    ///
    /// ```text
    /// # comment
    /// [B0ABC123XY]
    /// wireless mouse
    /// b0xyz98765
    /// ```
    pub fn from_text(text: &str) -> Result<Self, CoverageError> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut current: Option<String> = None;

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let id = header.strip_suffix(']').ok_or_else(|| CoverageError::TargetsParse {
                    line: idx + 1,
                    message: format!("unterminated identifier header '{line}'"),
                })?;
                let id = id.trim();
                if id.is_empty() {
                    return Err(CoverageError::TargetsParse {
                        line: idx + 1,
                        message: "empty identifier header".into(),
                    });
                }
                current = Some(id.to_string());
                continue;
            }

            match current {
                Some(ref id) => pairs.push((id.clone(), line.to_string())),
                None => {
                    return Err(CoverageError::TargetsParse {
                        line: idx + 1,
                        message: format!("keyword '{line}' appears before any [identifier] header"),
                    })
                }
            }
        }

        Ok(Self::from_pairs(pairs))
    }

    /// A new plan holding this plan's targets followed by `other`'s.
    pub fn merged(&self, other: &TargetPlan) -> TargetPlan {
        Self::from_pairs(
            self.targets
                .iter()
                .chain(other.targets.iter())
                .map(|t| (t.product_id.as_str(), t.keyword.as_str())),
        )
    }

    pub fn targets(&self) -> &[DesiredTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Distinct identifiers in plan order, as first written.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.targets
            .iter()
            .filter(|t| seen.insert(t.product_key()))
            .map(|t| t.product_id.as_str())
            .collect()
    }
}
