//! Canonical, company-agnostic cycle data
//!
//! Everything here is rebuilt per export from the persisted documents of a
//! reporting cycle (see [`CanonicalBuilder`]); nothing in this form is stored.

mod builder;
mod derive;
mod store;

pub use builder::CanonicalBuilder;
pub use derive::{build_significance_rows, derive_inventory, InventoryEntry, SavedAssessment};
pub use store::{CycleStore, DocumentKind, JsonDirStore, MemoryStore};

use serde::{Deserialize, Serialize};

/// Number of monthly slots in a breakdown
pub const MONTHS: usize = 12;

/// One activity line item of the merged inventory
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryItemRow {
    pub id: String,
    /// 1, 2 or 3
    pub scope: u8,
    /// e.g. "1.1", "3.4"
    pub sub_scope: String,
    pub scope_label: String,
    pub iso_scope_label: String,
    pub category_label: String,
    pub item_label: String,
    pub unit: String,
    pub quantity_per_year: Option<f64>,
    /// Twelve monthly quantities, `None` where nothing was entered
    pub monthly: Option<Vec<Option<f64>>>,
    /// Stable machine key of the fuel/activity variant
    pub fuel_key: Option<String>,
    /// 1-based slot within a repeating row group
    pub slot: Option<u32>,
    /// Emission factor (kgCO2e per unit)
    pub ef: Option<f64>,
    /// `quantity_per_year * ef / 1000`
    pub total_tco2e: Option<f64>,
    /// Share of the scope-3 total, scope-3 rows only
    pub share_pct: Option<f64>,
    /// Source cells backing this row, for audit back-links
    pub trace_refs: Vec<String>,
    pub remark: String,
    pub evidence_refs: Vec<String>,
    /// Display order used when grouping
    pub order: Option<f64>,
}

/// Outcome of a significance assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Assessment {
    #[serde(rename = "significant")]
    Significant,
    #[serde(rename = "not significant")]
    NotSignificant,
    #[default]
    #[serde(rename = "")]
    Unassessed,
}

impl Assessment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assessment::Significant => "significant",
            Assessment::NotSignificant => "not significant",
            Assessment::Unassessed => "",
        }
    }
}

/// Significance evaluation of one scope-3 item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scope3SignificanceRow {
    /// `subScope|itemLabel`
    pub key: String,
    pub sub_scope: String,
    pub category_label: String,
    pub item_label: String,
    pub unit: String,
    pub ghg_total: Option<f64>,
    pub share_pct: Option<f64>,
    pub assessment: Assessment,
    /// "selected for evaluation", empty, or free text
    pub selection: String,
}

/// Composite key of a significance row
pub fn significance_key(sub_scope: &str, item_label: &str) -> String {
    format!("{}|{}", sub_scope.trim(), item_label.trim())
}

/// An evidence file attached to the cycle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvidenceAttachment {
    pub id: String,
    pub name: String,
    /// Inventory item the file backs, if any
    pub item_id: Option<String>,
    pub uri: Option<String>,
}

/// The complete per-cycle snapshot consumed by export
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalCycleData {
    pub cycle_id: String,
    /// Scope 1, 2 and 3 rows, merged
    pub inventory: Vec<InventoryItemRow>,
    pub significance: Vec<Scope3SignificanceRow>,
    /// Spreadsheet-editor state, opaque to export
    pub sheet_state: serde_json::Value,
    pub evidence: Vec<EvidenceAttachment>,
    /// Organisation profile, opaque to export
    pub org_profile: serde_json::Value,
}

impl CanonicalCycleData {
    /// Scope-3 inventory rows, in inventory order
    pub fn scope3_items(&self) -> impl Iterator<Item = &InventoryItemRow> {
        self.inventory.iter().filter(|row| row.scope == 3)
    }

    /// Inventory rows of one scope
    pub fn scope_items(&self, scope: u8) -> impl Iterator<Item = &InventoryItemRow> {
        self.inventory.iter().filter(move |row| row.scope == scope)
    }
}
