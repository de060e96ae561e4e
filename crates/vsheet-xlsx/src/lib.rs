//! # vsheet-xlsx
//!
//! XLSX (Office Open XML) support for vsheet.
//!
//! Two write paths exist:
//! - [`XlsxWriter::write`] produces a fresh, minimal package from a
//!   [`vsheet_core::Workbook`].
//! - [`XlsxDocument::to_bytes`] writes a workbook back into the package it was
//!   loaded from. Only the worksheet cell data is regenerated; every other part
//!   (styles, drawings, defined names, validations, ...) is copied byte for
//!   byte, so a filled-in template keeps everything the template author put
//!   there.

pub mod document;
pub mod error;
pub mod package;
pub mod reader;
pub mod writer;

pub use document::XlsxDocument;
pub use error::{XlsxError, XlsxResult};
pub use package::{Package, SheetPart};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
