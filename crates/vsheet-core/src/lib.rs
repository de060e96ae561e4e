//! # vsheet-core
//!
//! In-memory spreadsheet document model for the vsheet export engine.
//!
//! The model is deliberately narrow: it holds what a template export needs to
//! read and rewrite, and nothing else.
//! - [`CellValue`] - literal values and formulas (formula cells are always
//!   distinguishable from literal cells by inspection)
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`Worksheet`] - sparse, row-major cell storage that keeps each cell's raw
//!   style index and each row's original properties so a template can be
//!   written back without losing formatting
//! - [`Workbook`] - ordered worksheets, looked up by name
//!
//! ## Example
//!
//! ```rust
//! use vsheet_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::empty();
//! workbook.add_worksheet_with_name("Fuel Stationary").unwrap();
//! let sheet = workbook.worksheet_by_name_mut("Fuel Stationary").unwrap();
//!
//! sheet.set_cell_value("D8", 10.0).unwrap();
//! sheet.set_cell_formula("P8", "=SUM(D8:O8)").unwrap();
//!
//! assert!(sheet.is_formula_at(7, 15));
//! assert_eq!(sheet.get_value("D8").unwrap(), CellValue::Number(10.0));
//! ```

pub mod cell;
pub mod error;
pub mod workbook;
pub mod worksheet;

pub use cell::{
    normalize_formula, CellAddress, CellData, CellError, CellRange, CellValue, FormulaKind,
};
pub use error::{Error, Result};
pub use workbook::Workbook;
pub use worksheet::{RowProps, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
