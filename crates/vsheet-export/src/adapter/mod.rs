//! Company adapters: the imperative write layer that runs after the
//! declarative section pass

mod natural;
mod row_lookup;
pub mod standard;

pub use natural::natural_cmp;
pub use row_lookup::{normalize_key, LookupTier, RowLookup};
pub use standard::{StandardAdapter, StandardLayout};

use vsheet_core::CellRange;

use crate::canonical::CanonicalCycleData;
use crate::document::SpreadsheetDocument;
use crate::engine::ExportReport;
use crate::error::ExportResult;
use crate::formula::FeatureFlags;
use crate::selection::RowSets;
use crate::spec::TemplateSpec;

/// Everything an adapter may read or write during one export
pub struct ExportContext<'a> {
    pub spec: &'a TemplateSpec,
    /// Spec features with overrides applied
    pub features: FeatureFlags,
    pub document: &'a mut dyn SpreadsheetDocument,
    pub data: &'a CanonicalCycleData,
    pub selections: &'a RowSets,
    pub report: &'a mut ExportReport,
}

impl ExportContext<'_> {
    /// Record a recoverable condition in the report
    pub fn note(&mut self, message: impl Into<String>) {
        self.report.note(message);
    }
}

/// A region of a worksheet that an adapter writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedRegion {
    /// Worksheet name
    pub sheet: String,
    pub range: CellRange,
}

impl ClaimedRegion {
    pub fn new(sheet: impl Into<String>, range: CellRange) -> Self {
        Self {
            sheet: sheet.into(),
            range,
        }
    }
}

/// Company-specific writes, selected by template id.
///
/// Implementations must not overwrite cells the template computes by
/// formula, and must clear an input region in full before writing it.
pub trait CompanyAdapter: Send + Sync {
    /// Adapter name, for messages
    fn name(&self) -> &str;

    /// Whether this adapter knows how to fill the given template
    fn supports(&self, template_id: &str) -> bool;

    /// Regions this adapter writes for the given spec. The engine rejects a
    /// spec whose declarative tables overlap any of them.
    fn claimed_regions(&self, _spec: &TemplateSpec) -> Vec<ClaimedRegion> {
        Vec::new()
    }

    /// Perform the writes
    fn apply(&self, ctx: &mut ExportContext<'_>) -> ExportResult<()>;
}

/// An adapter that writes nothing; useful for templates driven purely by
/// declarative sections
#[derive(Debug, Clone)]
pub struct NoopAdapter {
    template_ids: Vec<String>,
}

impl NoopAdapter {
    pub fn new<I, S>(template_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            template_ids: template_ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl CompanyAdapter for NoopAdapter {
    fn name(&self) -> &str {
        "noop"
    }

    fn supports(&self, template_id: &str) -> bool {
        self.template_ids.iter().any(|id| id == template_id)
    }

    fn apply(&self, _ctx: &mut ExportContext<'_>) -> ExportResult<()> {
        Ok(())
    }
}
