//! # vsheet-export
//!
//! Declarative, template-driven export of a GHG inventory cycle into a
//! company's V-Sheet workbook.
//!
//! An export takes a template workbook, a [`TemplateSpec`] describing it, a
//! [`CompanyAdapter`] and the cycle's [`CanonicalCycleData`], and produces a
//! filled workbook plus an [`ExportReport`]:
//!
//! 1. feature overrides are merged onto the spec's feature flags
//! 2. the template is opened and required sheets are checked
//! 3. selections are evaluated ([`run_selections`])
//! 4. declarative table formulas are written ([`build_formula`])
//! 5. the adapter performs its company-specific writes
//! 6. validation rules are checked ([`run_validations`]); failures are
//!    advisory and only recorded
//! 7. the workbook is serialized and handed to an [`OutputSink`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use vsheet_export::{
//!     CanonicalBuilder, DirectorySink, ExportJob, Exporter, JsonDirStore, TemplateRegistry,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = TemplateRegistry::builtin()?;
//! let entry = registry.resolve("vsheet-standard").unwrap();
//! let data = CanonicalBuilder::build(&JsonDirStore::new("data"), "2024")?;
//!
//! let template = std::fs::read("templates/vsheet-standard.xlsx")?;
//! let exporter = Exporter::new(DirectorySink::new("out"));
//! let job = ExportJob::new(&entry.spec, entry.adapter.as_ref(), &data, "vsheet-2024.xlsx")
//!     .requiring_spec_sheets();
//! let report = exporter.export(&template, job)?;
//! for failure in report.failures() {
//!     eprintln!("{}: {}", failure.id, failure.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod canonical;
pub mod document;
pub mod engine;
pub mod error;
pub mod formula;
pub mod preview;
pub mod registry;
pub mod selection;
pub mod sink;
pub mod source;
pub mod spec;
pub mod validation;

pub use adapter::{
    natural_cmp, ClaimedRegion, CompanyAdapter, ExportContext, LookupTier, NoopAdapter,
    RowLookup, StandardAdapter, StandardLayout,
};
pub use canonical::{
    build_significance_rows, derive_inventory, Assessment, CanonicalBuilder, CanonicalCycleData,
    CycleStore, DocumentKind, EvidenceAttachment, InventoryEntry, InventoryItemRow, JsonDirStore,
    MemoryStore, SavedAssessment, Scope3SignificanceRow,
};
pub use document::{open_document, SpreadsheetDocument};
pub use engine::{export_document, ExportJob, ExportReport, Exporter};
pub use error::{ExportError, ExportResult, FetchError};
pub use formula::{build_formula, sheet_ref, FeatureFlags, FeatureOverrides, FormulaSource};
pub use preview::{
    build_preview, PreviewBackend, PreviewCell, PreviewConfig, PreviewError, PreviewLoader,
    PreviewRow, SheetPreview, WorkbookPreviewBackend,
};
pub use registry::{base_template_id, standard_spec, TemplateEntry, TemplateRegistry};
pub use selection::{run_selections, RowSets, SelectedRow, SelectionRule};
#[cfg(feature = "http")]
pub use source::HttpTemplateSource;
pub use source::{FileTemplateSource, TemplateSource};
pub use sink::{DirectorySink, MemorySink, OutputSink};
pub use spec::{Severity, TemplateSpec};
pub use validation::{run_validations, ValidationResult};
