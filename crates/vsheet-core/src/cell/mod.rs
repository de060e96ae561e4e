//! Cell-related types
//!
//! - [`CellValue`] - the value stored in a cell, literal or formula
//! - [`CellAddress`] - a cell's location (e.g., "D8")
//! - [`CellRange`] - a rectangular block of cells (e.g., "D8:O16")
//! - [`CellData`] - value plus the raw style index carried over from the file

mod address;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use value::{normalize_formula, CellError, CellValue, FormulaKind};

/// Complete data for a single cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// Raw style (xf) index as found in the source package, 0 = default
    pub style: u32,
}

impl CellData {
    /// Create a new cell with a value and the default style
    pub fn new(value: CellValue) -> Self {
        Self { value, style: 0 }
    }

    /// Create a new cell with a value and a raw style index
    pub fn with_style(value: CellValue, style: u32) -> Self {
        Self { value, style }
    }

    /// A cell with no value and no formatting can be dropped from storage
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.style == 0
    }
}
