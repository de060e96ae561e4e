//! Declarative template specification

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vsheet_core::{CellAddress, CellRange};

use crate::error::{ExportError, ExportResult};
use crate::formula::{FeatureFlags, FormulaSource};
use crate::selection::SelectionRule;

/// One company's target workbook, as data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    pub template_id: String,
    pub version: String,
    #[serde(default)]
    pub features: FeatureFlags,
    /// Logical sheet key → worksheet name
    #[serde(default)]
    pub sheets: BTreeMap<String, String>,
    #[serde(default)]
    pub selections: BTreeMap<String, SelectionRule>,
    #[serde(default)]
    pub sections: BTreeMap<String, SectionSpec>,
    #[serde(default)]
    pub validations: Vec<ValidationRule>,
}

/// A named part of a sheet, optionally carrying a formula table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    /// Sheet key
    pub sheet: String,
    #[serde(default)]
    pub table: Option<TableSpec>,
}

/// Rows `row_start..=row_end` (1-based) × configured columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub row_start: u32,
    pub row_end: u32,
    /// Column letters → column rule
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    /// Columns without a formula are left to the adapter
    #[serde(default)]
    pub formula: Option<FormulaSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warn,
}

/// A post-write check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub id: String,
    #[serde(default)]
    pub severity: Severity,
    /// Sheet key
    pub sheet: String,
    /// A cell (`P8`) or single-column range (`P8:P16`)
    pub range: String,
    pub check: CheckSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSpec {
    /// e.g. `formulaEquals`
    pub kind: String,
    /// Expected formula, may contain `{row}`
    #[serde(default)]
    pub pattern: Option<String>,
}

impl TemplateSpec {
    /// Parse a spec from JSON text
    pub fn from_json(text: &str) -> ExportResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Worksheet name of a sheet key
    pub fn sheet_name(&self, key: &str) -> Option<&str> {
        self.sheets.get(key).map(String::as_str)
    }

    /// Worksheet name of a sheet key, failing for undeclared keys
    pub fn require_sheet_name(&self, key: &str) -> ExportResult<&str> {
        self.sheet_name(key)
            .ok_or_else(|| ExportError::UnknownSheetKey(key.to_string()))
    }

    /// Every worksheet name the spec refers to, sorted and de-duplicated
    pub fn required_sheet_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sheets.values().cloned().collect();
        names.sort();
        names.dedup();
        names
    }
}

impl TableSpec {
    /// Column indices with their rules, validated
    pub fn resolved_columns(&self) -> ExportResult<Vec<(u16, &ColumnSpec)>> {
        self.columns
            .iter()
            .map(|(letters, column)| {
                CellAddress::letters_to_column(letters)
                    .map(|col| (col, column))
                    .map_err(|_| ExportError::InvalidSpec(format!("bad column {letters:?}")))
            })
            .collect()
    }

    /// The rectangle covered by the configured columns
    pub fn region(&self) -> ExportResult<Option<CellRange>> {
        if self.row_start == 0 || self.row_end < self.row_start {
            return Err(ExportError::InvalidSpec(format!(
                "bad table rows {}..{}",
                self.row_start, self.row_end
            )));
        }
        let columns = self.resolved_columns()?;
        let first = columns.iter().map(|(c, _)| *c).min();
        let last = columns.iter().map(|(c, _)| *c).max();
        Ok(match (first, last) {
            (Some(first), Some(last)) => Some(CellRange::from_indices(
                self.row_start - 1,
                first,
                self.row_end - 1,
                last,
            )),
            _ => None,
        })
    }
}
