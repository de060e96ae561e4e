//! The spreadsheet document capability the engine writes through

use std::io::Cursor;

use vsheet_core::{Workbook, Worksheet};
use vsheet_xlsx::{XlsxDocument, XlsxWriter};

use crate::error::{ExportError, ExportResult};

/// Load / look up worksheets / serialize.
///
/// Cells are edited through [`Worksheet`], which keeps formula cells
/// distinguishable from literals.
pub trait SpreadsheetDocument {
    /// Worksheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    fn worksheet(&self, name: &str) -> Option<&Worksheet>;

    fn worksheet_mut(&mut self, name: &str) -> Option<&mut Worksheet>;

    /// Serialize to `.xlsx` bytes
    fn to_bytes(&self) -> ExportResult<Vec<u8>>;

    fn has_sheet(&self, name: &str) -> bool {
        self.worksheet(name).is_some()
    }
}

impl SpreadsheetDocument for XlsxDocument {
    fn sheet_names(&self) -> Vec<String> {
        XlsxDocument::sheet_names(self)
    }

    fn worksheet(&self, name: &str) -> Option<&Worksheet> {
        XlsxDocument::worksheet(self, name)
    }

    fn worksheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        XlsxDocument::worksheet_mut(self, name)
    }

    fn to_bytes(&self) -> ExportResult<Vec<u8>> {
        Ok(XlsxDocument::to_bytes(self)?)
    }
}

/// A bare workbook serializes as a fresh package
impl SpreadsheetDocument for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        Workbook::sheet_names(self)
    }

    fn worksheet(&self, name: &str) -> Option<&Worksheet> {
        self.worksheet_by_name(name)
    }

    fn worksheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheet_by_name_mut(name)
    }

    fn to_bytes(&self) -> ExportResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        XlsxWriter::write(self, &mut out)?;
        Ok(out.into_inner())
    }
}

/// Open template bytes, mapping any failure to [`ExportError::TemplateParse`]
pub fn open_document(bytes: &[u8]) -> ExportResult<XlsxDocument> {
    XlsxDocument::from_bytes(bytes).map_err(ExportError::TemplateParse)
}
