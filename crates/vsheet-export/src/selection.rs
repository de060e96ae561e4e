//! Selection engine: named row-sets from declarative filter/sort/limit rules

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::{CanonicalCycleData, InventoryItemRow, Scope3SignificanceRow};
use crate::error::{ExportError, ExportResult};

/// Sort direction of a selection rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Numeric sort on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// One named selection rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRule {
    /// `inventory` or `significance`
    pub source: String,
    /// Field → expected value, all must match
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// The canonical collection a rule draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Inventory,
    Significance,
}

impl SelectionSource {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "inventory" => Some(SelectionSource::Inventory),
            "significance" => Some(SelectionSource::Significance),
            _ => None,
        }
    }
}

/// A row picked by a selection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SelectedRow {
    Inventory(InventoryItemRow),
    Significance(Scope3SignificanceRow),
}

impl SelectedRow {
    pub fn sub_scope(&self) -> &str {
        match self {
            SelectedRow::Inventory(r) => &r.sub_scope,
            SelectedRow::Significance(r) => &r.sub_scope,
        }
    }

    pub fn item_label(&self) -> &str {
        match self {
            SelectedRow::Inventory(r) => &r.item_label,
            SelectedRow::Significance(r) => &r.item_label,
        }
    }

    pub fn unit(&self) -> &str {
        match self {
            SelectedRow::Inventory(r) => &r.unit,
            SelectedRow::Significance(r) => &r.unit,
        }
    }

    /// GHG total in tCO2e
    pub fn ghg_total(&self) -> Option<f64> {
        match self {
            SelectedRow::Inventory(r) => r.total_tco2e,
            SelectedRow::Significance(r) => r.ghg_total,
        }
    }

    /// Value of a camelCase field, `Null` when absent
    pub fn field(&self, name: &str) -> Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.get(name).cloned())
            .unwrap_or(Value::Null)
    }
}

/// Rule name → ordered rows
pub type RowSets = BTreeMap<String, Vec<SelectedRow>>;

/// Evaluate every rule against the canonical data.
///
/// Pure: the same inputs always give the same output. A rule naming an
/// unknown source is a configuration error.
pub fn run_selections(
    rules: &BTreeMap<String, SelectionRule>,
    data: &CanonicalCycleData,
) -> ExportResult<RowSets> {
    let mut sets = RowSets::new();
    for (name, rule) in rules {
        let rows = run_selection(name, rule, data)?;
        log::debug!("selection {name}: {} rows", rows.len());
        sets.insert(name.clone(), rows);
    }
    Ok(sets)
}

/// Evaluate one rule
pub fn run_selection(
    name: &str,
    rule: &SelectionRule,
    data: &CanonicalCycleData,
) -> ExportResult<Vec<SelectedRow>> {
    let source =
        SelectionSource::parse(&rule.source).ok_or_else(|| ExportError::UnknownSelectionSource {
            rule: name.to_string(),
            tag: rule.source.clone(),
        })?;

    let candidates: Vec<SelectedRow> = match source {
        SelectionSource::Inventory => data
            .inventory
            .iter()
            .cloned()
            .map(SelectedRow::Inventory)
            .collect(),
        SelectionSource::Significance => data
            .significance
            .iter()
            .cloned()
            .map(SelectedRow::Significance)
            .collect(),
    };

    // Serialize once; filters and sort keys read from the JSON form
    let mut rows: Vec<(SelectedRow, Value)> = candidates
        .into_iter()
        .map(|row| {
            let value = serde_json::to_value(&row).unwrap_or(Value::Null);
            (row, value)
        })
        .filter(|(_, value)| {
            rule.filters.iter().all(|(field, expected)| {
                filter_matches(value.get(field).unwrap_or(&Value::Null), expected)
            })
        })
        .collect();

    if let Some(sort) = &rule.sort {
        rows.sort_by(|(_, a), (_, b)| {
            let a = sort_value(a.get(&sort.field));
            let b = sort_value(b.get(&sort.field));
            match sort.direction {
                SortDirection::Asc => a.total_cmp(&b),
                SortDirection::Desc => b.total_cmp(&a),
            }
        });
    }

    let mut rows: Vec<SelectedRow> = rows.into_iter().map(|(row, _)| row).collect();
    if let Some(limit) = rule.limit {
        rows.truncate(limit);
    }
    Ok(rows)
}

/// Numbers compare numerically; everything else by canonical string form
fn filter_matches(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b) == Some(Ordering::Equal),
        _ => canonical_string(actual) == canonical_string(expected),
    }
}

fn canonical_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Missing or non-numeric values sort as 0
fn sort_value(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}
