//! Derivation of canonical rows from persisted entries

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{significance_key, Assessment, InventoryItemRow, Scope3SignificanceRow, MONTHS};

/// One activity entry as persisted by the data-entry forms
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryEntry {
    pub id: String,
    pub scope: u8,
    pub sub_scope: String,
    pub scope_label: Option<String>,
    pub iso_scope_label: Option<String>,
    pub category_label: String,
    pub item_label: String,
    pub unit: String,
    pub quantity_per_year: Option<f64>,
    pub monthly: Option<Vec<Option<f64>>>,
    pub fuel_key: Option<String>,
    pub slot: Option<u32>,
    pub ef: Option<f64>,
    pub trace_refs: Vec<String>,
    pub remark: String,
    pub evidence_refs: Vec<String>,
    pub order: Option<f64>,
}

/// A saved human evaluation, keyed by `subScope|itemLabel`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedAssessment {
    pub assessment: Assessment,
    pub selection: String,
}

fn default_scope_label(scope: u8) -> String {
    format!("Scope {scope}")
}

fn default_iso_scope_label(scope: u8) -> String {
    match scope {
        1 => "Category 1".to_string(),
        2 => "Category 2".to_string(),
        _ => "Categories 3-6".to_string(),
    }
}

/// Pad or cut a monthly breakdown to exactly twelve slots
fn normalize_monthly(monthly: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut months: Vec<Option<f64>> = monthly.iter().take(MONTHS).copied().collect();
    months.resize(MONTHS, None);
    months
}

/// Compute the derived fields of every entry.
///
/// - `quantity_per_year` falls back to the sum of the monthly breakdown
/// - `total_tco2e = quantity_per_year * ef / 1000` when both are present
/// - `share_pct` is each scope-3 row's share of the scope-3 total, `0` when
///   that total is `0`, and `None` outside scope 3
pub fn derive_inventory(entries: &[InventoryEntry]) -> Vec<InventoryItemRow> {
    let mut rows: Vec<InventoryItemRow> = entries
        .iter()
        .map(|entry| {
            let monthly = entry.monthly.as_deref().map(normalize_monthly);
            let quantity = entry.quantity_per_year.or_else(|| {
                monthly
                    .as_ref()
                    .filter(|m| m.iter().any(Option::is_some))
                    .map(|m| m.iter().flatten().sum())
            });
            let total = match (quantity, entry.ef) {
                (Some(q), Some(ef)) => Some(q * ef / 1000.0),
                _ => None,
            };

            InventoryItemRow {
                id: entry.id.clone(),
                scope: entry.scope,
                sub_scope: entry.sub_scope.trim().to_string(),
                scope_label: entry
                    .scope_label
                    .clone()
                    .unwrap_or_else(|| default_scope_label(entry.scope)),
                iso_scope_label: entry
                    .iso_scope_label
                    .clone()
                    .unwrap_or_else(|| default_iso_scope_label(entry.scope)),
                category_label: entry.category_label.clone(),
                item_label: entry.item_label.clone(),
                unit: entry.unit.clone(),
                quantity_per_year: quantity,
                monthly,
                fuel_key: entry.fuel_key.clone(),
                slot: entry.slot,
                ef: entry.ef,
                total_tco2e: total,
                share_pct: None,
                trace_refs: entry.trace_refs.clone(),
                remark: entry.remark.clone(),
                evidence_refs: entry.evidence_refs.clone(),
                order: entry.order,
            }
        })
        .collect();

    let scope3_total: f64 = rows
        .iter()
        .filter(|r| r.scope == 3)
        .filter_map(|r| r.total_tco2e)
        .sum();

    for row in rows.iter_mut().filter(|r| r.scope == 3) {
        let total = row.total_tco2e.unwrap_or(0.0);
        row.share_pct = Some(if scope3_total == 0.0 {
            0.0
        } else {
            total / scope3_total * 100.0
        });
    }

    rows
}

/// Build one significance row per `subScope|itemLabel` key.
///
/// Duplicate keys are aggregated (totals and shares summed, first unit and
/// category kept). Saved evaluations are merged in by key; unknown keys stay
/// unassessed.
pub fn build_significance_rows(
    items: &[InventoryItemRow],
    saved: &BTreeMap<String, SavedAssessment>,
) -> Vec<Scope3SignificanceRow> {
    let mut rows: Vec<Scope3SignificanceRow> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();

    for item in items.iter().filter(|i| i.scope == 3) {
        let key = significance_key(&item.sub_scope, &item.item_label);
        match index.get(&key) {
            Some(&i) => {
                let row = &mut rows[i];
                row.ghg_total = add_opt(row.ghg_total, item.total_tco2e);
                row.share_pct = add_opt(row.share_pct, item.share_pct);
            }
            None => {
                let evaluation = saved.get(&key).cloned().unwrap_or_default();
                index.insert(key.clone(), rows.len());
                rows.push(Scope3SignificanceRow {
                    key,
                    sub_scope: item.sub_scope.clone(),
                    category_label: item.category_label.clone(),
                    item_label: item.item_label.clone(),
                    unit: item.unit.clone(),
                    ghg_total: item.total_tco2e,
                    share_pct: item.share_pct,
                    assessment: evaluation.assessment,
                    selection: evaluation.selection,
                });
            }
        }
    }

    rows
}

fn add_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}
