//! Errors raised while reading or writing an `.xlsx` package

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a readable zip archive
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A zip archive without `[Content_Types].xml`
    #[error("not a spreadsheet package: {0}")]
    NotAWorkbook(String),

    /// A part the workbook or its relationships point at is absent
    #[error("missing package part {0}")]
    MissingPart(String),

    /// A cell or row attribute that cannot be interpreted
    #[error("invalid cell data: {0}")]
    InvalidCell(String),

    /// Patched writes can only touch sheets the source package already has
    #[error("sheet {0:?} does not exist in the source package")]
    UnknownSheet(String),

    /// A worksheet part with no `<sheetData>` element to replace
    #[error("worksheet {0:?} has no sheetData")]
    MissingSheetData(String),

    #[error("a workbook needs at least one sheet")]
    EmptyWorkbook,

    #[error(transparent)]
    Core(#[from] vsheet_core::Error),
}
