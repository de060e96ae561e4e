//! Assembly of [`CanonicalCycleData`] from a [`CycleStore`]

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use super::{
    build_significance_rows, derive_inventory, CanonicalCycleData, CycleStore, DocumentKind,
    EvidenceAttachment, InventoryEntry, SavedAssessment,
};
use crate::error::ExportResult;

/// Builds a fresh canonical snapshot per export call
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalBuilder;

impl CanonicalBuilder {
    /// Load every cycle document and derive the canonical data.
    ///
    /// Missing documents count as empty; malformed ones are errors.
    pub fn build(store: &dyn CycleStore, cycle_id: &str) -> ExportResult<CanonicalCycleData> {
        let entries: Vec<InventoryEntry> = load_typed(store, cycle_id, DocumentKind::Entries)?;
        let saved: BTreeMap<String, SavedAssessment> =
            load_typed(store, cycle_id, DocumentKind::Significance)?;
        let evidence: Vec<EvidenceAttachment> =
            load_typed(store, cycle_id, DocumentKind::Evidence)?;

        let inventory = derive_inventory(&entries);
        let significance = build_significance_rows(&inventory, &saved);

        log::info!(
            "canonical data for cycle {cycle_id}: {} inventory rows, {} significance rows",
            inventory.len(),
            significance.len()
        );

        Ok(CanonicalCycleData {
            cycle_id: cycle_id.to_string(),
            inventory,
            significance,
            sheet_state: store
                .load(cycle_id, DocumentKind::SheetState)?
                .unwrap_or_default(),
            evidence,
            org_profile: store
                .load(cycle_id, DocumentKind::OrgProfile)?
                .unwrap_or_default(),
        })
    }
}

fn load_typed<T: DeserializeOwned + Default>(
    store: &dyn CycleStore,
    cycle_id: &str,
    kind: DocumentKind,
) -> ExportResult<T> {
    match store.load(cycle_id, kind)? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(T::default()),
    }
}
