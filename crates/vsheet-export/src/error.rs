//! Export error types

use thiserror::Error;
use vsheet_xlsx::XlsxError;

/// Result type for export operations
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Fatal export errors.
///
/// Anything recoverable (skipped adapter steps, lookup misses, failed
/// validations) is recorded in the [`crate::ExportReport`] instead.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The template bytes could not be fetched
    #[error("failed to fetch template {locator}: {source}")]
    TemplateFetch {
        /// Where the template was looked up
        locator: String,
        /// Underlying fetch failure
        #[source]
        source: FetchError,
    },

    /// The template bytes are not a readable workbook
    #[error("template is not a valid workbook: {0}")]
    TemplateParse(#[source] XlsxError),

    /// Required worksheets are absent from the template
    #[error("template is missing required sheets: {}", .0.join(", "))]
    MissingSheets(Vec<String>),

    /// A declarative section points at a sheet the template does not have
    #[error("section {section:?} targets sheet {sheet:?}, which is not in the template")]
    SectionSheetMissing {
        /// Section name
        section: String,
        /// Resolved sheet name
        sheet: String,
    },

    /// A sheet key is not declared in the spec's sheet table
    #[error("unknown sheet key {0:?}")]
    UnknownSheetKey(String),

    /// The adapter declined the template id
    #[error("adapter {adapter} does not support template {template_id:?}")]
    UnsupportedTemplate {
        /// Adapter name
        adapter: String,
        /// Template id of the spec
        template_id: String,
    },

    /// A selection rule names a dataset that does not exist
    #[error("selection {rule:?} has unknown source {tag:?}")]
    UnknownSelectionSource {
        /// Rule name
        rule: String,
        /// The unrecognized source tag
        tag: String,
    },

    /// A declarative table region overlaps a region the adapter writes
    #[error("declarative region {declared} overlaps adapter region {claimed} on sheet {sheet:?}")]
    RegionConflict {
        /// Sheet name
        sheet: String,
        /// Declarative table region
        declared: String,
        /// Adapter-claimed region
        claimed: String,
    },

    /// The template spec is internally inconsistent
    #[error("invalid template spec: {0}")]
    InvalidSpec(String),

    /// Spreadsheet model error
    #[error(transparent)]
    Core(#[from] vsheet_core::Error),

    /// XLSX serialization error
    #[error(transparent)]
    Xlsx(#[from] XlsxError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Template fetch failures
#[derive(Debug, Error)]
pub enum FetchError {
    /// Local read failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a non-success status
    #[error("HTTP status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Transport-level HTTP failure
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
