//! A workbook bound to the package it was loaded from

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::XlsxResult;
use crate::package::Package;
use crate::reader::XlsxReader;
use crate::writer::XlsxWriter;
use vsheet_core::{Workbook, Worksheet};

/// An editable XLSX document.
///
/// Cell edits go through [`XlsxDocument::workbook_mut`] (or the worksheet
/// helpers); [`XlsxDocument::to_bytes`] writes them back into the original
/// package, leaving every other part as it was.
#[derive(Debug, Clone)]
pub struct XlsxDocument {
    workbook: Workbook,
    package: Package,
}

impl XlsxDocument {
    /// Open a document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Load a document from raw `.xlsx` bytes
    pub fn from_bytes(bytes: &[u8]) -> XlsxResult<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Load a document from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let package = Package::from_reader(reader)?;
        let workbook = XlsxReader::read_package(&package)?;
        Ok(Self { workbook, package })
    }

    /// The cell model
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Mutable access to the cell model
    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    /// The underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// Worksheet by name
    pub fn worksheet(&self, name: &str) -> Option<&Worksheet> {
        self.workbook.worksheet_by_name(name)
    }

    /// Mutable worksheet by name
    pub fn worksheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.workbook.worksheet_by_name_mut(name)
    }

    /// Serialize the document, preserving every part not owned by the cell model
    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        XlsxWriter::write_patched(&self.package, &self.workbook, &mut out)?;
        Ok(out.into_inner())
    }

    /// Serialize the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}
