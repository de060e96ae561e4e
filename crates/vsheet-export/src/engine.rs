//! Export orchestration: features, open, required sheets, selections,
//! declarative sections, adapter, validations, save

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapter::{CompanyAdapter, ExportContext};
use crate::canonical::CanonicalCycleData;
use crate::document::{open_document, SpreadsheetDocument};
use crate::error::{ExportError, ExportResult};
use crate::formula::{build_formula, FeatureFlags, FeatureOverrides};
use crate::selection::{run_selections, RowSets};
use crate::sink::OutputSink;
use crate::source::TemplateSource;
use crate::spec::TemplateSpec;
use crate::validation::{run_validations, ValidationResult};

/// Outcome of one export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub template_id: String,
    pub version: String,
    pub output_name: String,
    pub generated_at: DateTime<Utc>,
    pub validations: Vec<ValidationResult>,
    /// Recoverable conditions met while writing (skipped steps, lookup
    /// misses, protected cells, dropped rows)
    #[serde(default)]
    pub notes: Vec<String>,
}

impl ExportReport {
    pub fn new(spec: &TemplateSpec, output_name: impl Into<String>) -> Self {
        Self {
            template_id: spec.template_id.clone(),
            version: spec.version.clone(),
            output_name: output_name.into(),
            generated_at: Utc::now(),
            validations: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Record a recoverable condition
    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.notes.push(message);
    }

    /// True when every validation passed. Severity is not consulted.
    pub fn is_ok(&self) -> bool {
        self.validations.iter().all(|v| v.passed)
    }

    /// Failed validations
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.validations.iter().filter(|v| !v.passed)
    }
}

/// Per-call export configuration
pub struct ExportJob<'a> {
    pub spec: &'a TemplateSpec,
    pub adapter: &'a dyn CompanyAdapter,
    pub data: &'a CanonicalCycleData,
    pub output_name: String,
    /// Precomputed row sets; computed from the spec's rules when absent
    pub selections: Option<RowSets>,
    pub feature_overrides: FeatureOverrides,
    /// Sheets that must exist in the template before anything is written
    pub required_sheets: Option<Vec<String>>,
}

impl<'a> ExportJob<'a> {
    pub fn new(
        spec: &'a TemplateSpec,
        adapter: &'a dyn CompanyAdapter,
        data: &'a CanonicalCycleData,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            spec,
            adapter,
            data,
            output_name: output_name.into(),
            selections: None,
            feature_overrides: FeatureOverrides::default(),
            required_sheets: None,
        }
    }

    pub fn with_selections(mut self, selections: RowSets) -> Self {
        self.selections = Some(selections);
        self
    }

    pub fn with_feature_overrides(mut self, overrides: FeatureOverrides) -> Self {
        self.feature_overrides = overrides;
        self
    }

    pub fn with_required_sheets<I, S>(mut self, sheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_sheets = Some(sheets.into_iter().map(Into::into).collect());
        self
    }

    /// Require every sheet the spec declares
    pub fn requiring_spec_sheets(self) -> Self {
        let sheets = self.spec.required_sheet_names();
        self.with_required_sheets(sheets)
    }
}

/// Runs exports and hands the bytes to an [`OutputSink`]
#[derive(Debug)]
pub struct Exporter<S: OutputSink> {
    sink: S,
}

impl<S: OutputSink> Exporter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Full export from template bytes. The output is saved under the job's
    /// output name even when validations fail.
    pub fn export(&self, template_bytes: &[u8], job: ExportJob<'_>) -> ExportResult<ExportReport> {
        log::info!(
            "exporting {} v{} as {}",
            job.spec.template_id,
            job.spec.version,
            job.output_name
        );
        let mut document = open_document(template_bytes)?;
        log::debug!("template opened: {:?}", SpreadsheetDocument::sheet_names(&document));

        let report = export_document(&mut document, job)?;

        let bytes = SpreadsheetDocument::to_bytes(&document)?;
        log::info!("saving {} ({} bytes)", report.output_name, bytes.len());
        self.sink.save(&bytes, &report.output_name);
        Ok(report)
    }

    /// Fetch the template, then [`Exporter::export`]
    pub fn export_from_source(
        &self,
        source: &dyn TemplateSource,
        locator: &str,
        job: ExportJob<'_>,
    ) -> ExportResult<ExportReport> {
        log::info!("fetching template {locator}");
        let bytes = source
            .fetch(locator)
            .map_err(|source| ExportError::TemplateFetch {
                locator: locator.to_string(),
                source,
            })?;
        self.export(&bytes, job)
    }
}

/// Run the in-memory part of an export against an open document: every step
/// except opening and saving.
pub fn export_document(
    document: &mut dyn SpreadsheetDocument,
    job: ExportJob<'_>,
) -> ExportResult<ExportReport> {
    let ExportJob {
        spec,
        adapter,
        data,
        output_name,
        selections,
        feature_overrides,
        required_sheets,
    } = job;

    let features = spec.features.merged(&feature_overrides);
    let mut report = ExportReport::new(spec, output_name);

    if let Some(required) = required_sheets.as_deref() {
        check_required_sheets(document, required)?;
    }

    let selections = match selections {
        Some(selections) => selections,
        None => run_selections(&spec.selections, data)?,
    };
    for (name, rows) in &selections {
        log::debug!("selection {name}: {} row(s)", rows.len());
    }

    // before any write
    check_region_conflicts(spec, adapter)?;

    apply_sections(document, spec, &features)?;

    if !adapter.supports(&spec.template_id) {
        return Err(ExportError::UnsupportedTemplate {
            adapter: adapter.name().to_string(),
            template_id: spec.template_id.clone(),
        });
    }

    log::info!("running adapter {}", adapter.name());
    {
        let mut ctx = ExportContext {
            spec,
            features,
            document: &mut *document,
            data,
            selections: &selections,
            report: &mut report,
        };
        adapter.apply(&mut ctx)?;
    }

    report.validations = run_validations(document, spec);
    Ok(report)
}

fn check_required_sheets(document: &dyn SpreadsheetDocument, required: &[String]) -> ExportResult<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !document.has_sheet(name))
        .cloned()
        .collect();
    if missing.is_empty() {
        log::debug!("required sheets present: {}", required.len());
        Ok(())
    } else {
        Err(ExportError::MissingSheets(missing))
    }
}

/// Write every declared table formula, row by row
fn apply_sections(
    document: &mut dyn SpreadsheetDocument,
    spec: &TemplateSpec,
    features: &FeatureFlags,
) -> ExportResult<()> {
    for (name, section) in &spec.sections {
        let Some(table) = &section.table else {
            continue;
        };
        let sheet_name = spec.require_sheet_name(&section.sheet)?;
        let columns = table.resolved_columns()?;
        // validates the row bounds
        table.region()?;

        let sheet = document
            .worksheet_mut(sheet_name)
            .ok_or_else(|| ExportError::SectionSheetMissing {
                section: name.clone(),
                sheet: sheet_name.to_string(),
            })?;

        let mut written = 0usize;
        for row in table.row_start..=table.row_end {
            for (col, column) in &columns {
                if let Some(source) = &column.formula {
                    let formula = build_formula(source, features, row);
                    sheet.set_cell_formula_at(row - 1, *col, &formula)?;
                    written += 1;
                }
            }
        }
        log::debug!("section {name}: {written} formula(s) on {sheet_name}");
    }
    Ok(())
}

/// Declarative tables and adapter-claimed regions must not overlap
fn check_region_conflicts(spec: &TemplateSpec, adapter: &dyn CompanyAdapter) -> ExportResult<()> {
    let claimed = adapter.claimed_regions(spec);
    if claimed.is_empty() {
        return Ok(());
    }
    for section in spec.sections.values() {
        let Some(table) = &section.table else {
            continue;
        };
        let Some(region) = table.region()? else {
            continue;
        };
        let sheet = spec.require_sheet_name(&section.sheet)?;
        if let Some(hit) = claimed
            .iter()
            .find(|c| c.sheet == sheet && c.range.overlaps(&region))
        {
            return Err(ExportError::RegionConflict {
                sheet: sheet.to_string(),
                declared: region.to_a1_string(),
                claimed: hit.range.to_a1_string(),
            });
        }
    }
    Ok(())
}
