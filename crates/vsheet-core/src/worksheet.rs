//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellRange, CellValue};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Row-level properties carried over from the source file
///
/// Attributes are kept as raw name/value pairs (height, custom format,
/// outline level, ...) and written back unchanged; the row number and the
/// `spans` hint are regenerated on write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowProps {
    /// Raw `<row>` attributes other than `r` and `spans`
    pub attributes: Vec<(String, String)>,
}

impl RowProps {
    /// Create row properties from raw attributes
    pub fn new(attributes: Vec<(String, String)>) -> Self {
        Self { attributes }
    }

    /// Look up a raw attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A worksheet (single sheet in a workbook)
///
/// Cells are stored sparsely, row-major: `BTreeMap<row, BTreeMap<col, CellData>>`.
/// Ordered iteration matters because the xlsx writer emits rows and cells in
/// ascending order.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<u32, BTreeMap<u16, CellData>>,
    rows: BTreeMap<u32, RowProps>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            rows: BTreeMap::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "D8")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by 0-based indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a cell value by address string; missing cells read as [`CellValue::Empty`]
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get a cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cell_at(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Formula text of a cell, if it holds a formula
    pub fn formula_at(&self, row: u32, col: u16) -> Option<&str> {
        self.cell_at(row, col).and_then(|c| c.value.formula_text())
    }

    /// Formula text by address string
    pub fn formula(&self, address: &str) -> Result<Option<&str>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.formula_at(addr.row, addr.col))
    }

    /// Whether a cell holds a formula
    pub fn is_formula_at(&self, row: u32, col: u16) -> bool {
        self.formula_at(row, col).is_some()
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by indices, keeping the cell's existing style
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        validate_position(row, col)?;
        let value = value.into();
        let row_cells = self.cells.entry(row).or_default();
        match row_cells.get_mut(&col) {
            Some(cell) => cell.value = value,
            None => {
                if !value.is_empty() {
                    row_cells.insert(col, CellData::new(value));
                }
            }
        }
        self.prune(row, col);
        Ok(())
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col, formula)
    }

    /// Set a cell formula by indices; a leading `=` is added when missing
    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.set_cell_value_at(row, col, CellValue::formula(formula))
    }

    /// Replace a cell's value and style in one go (used by file readers)
    pub fn set_cell_data_at(&mut self, row: u32, col: u16, data: CellData) -> Result<()> {
        validate_position(row, col)?;
        if data.is_blank() {
            self.remove_cell(row, col);
        } else {
            self.cells.entry(row).or_default().insert(col, data);
        }
        Ok(())
    }

    /// Clear a cell's value by address string, keeping its formatting
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.clear_cell_at(addr.row, addr.col);
        Ok(())
    }

    /// Clear a cell's value by indices, keeping its formatting
    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        if let Some(cell) = self.cells.get_mut(&row).and_then(|r| r.get_mut(&col)) {
            cell.value = CellValue::Empty;
        }
        self.prune(row, col);
    }

    /// Clear every value in a range, keeping formatting
    pub fn clear_range(&mut self, range: &CellRange) {
        let rows: Vec<u32> = self
            .cells
            .range(range.start.row..=range.end.row)
            .map(|(row, _)| *row)
            .collect();
        for row in rows {
            for col in range.start.col..=range.end.col {
                self.clear_cell_at(row, col);
            }
        }
    }

    fn remove_cell(&mut self, row: u32, col: u16) {
        if let Some(row_cells) = self.cells.get_mut(&row) {
            row_cells.remove(&col);
            if row_cells.is_empty() {
                self.cells.remove(&row);
            }
        }
    }

    fn prune(&mut self, row: u32, col: u16) {
        let blank = self.cell_at(row, col).map_or(true, CellData::is_blank);
        if blank {
            self.remove_cell(row, col);
        }
    }

    // === Rows ===

    /// Properties of a row, if the source file declared any
    pub fn row_props(&self, row: u32) -> Option<&RowProps> {
        self.rows.get(&row)
    }

    /// Set properties for a row
    pub fn set_row_props(&mut self, row: u32, props: RowProps) {
        if props.attributes.is_empty() {
            self.rows.remove(&row);
        } else {
            self.rows.insert(row, props);
        }
    }

    /// Indices of every row that has cells or properties, ascending
    pub fn row_indices(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = self.cells.keys().chain(self.rows.keys()).copied().collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }

    /// Cells of one row, ascending by column
    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells
            .get(&row)
            .into_iter()
            .flat_map(|cells| cells.iter().map(|(col, data)| (*col, data)))
    }

    // === Iteration ===

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    /// Whether the sheet has no stored cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells
            .iter()
            .flat_map(|(row, cols)| cols.iter().map(move |(col, data)| (*row, *col, data)))
    }

    /// Iterate over all formula cells
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &str)> {
        self.iter_cells()
            .filter_map(|(row, col, data)| data.value.formula_text().map(|f| (row, col, f)))
    }

    /// Bounds of all stored cells
    pub fn used_range(&self) -> Option<CellRange> {
        let (first_row, _) = self.cells.first_key_value()?;
        let (last_row, _) = self.cells.last_key_value()?;
        let min_col = self.cells.values().filter_map(|c| c.keys().next()).min()?;
        let max_col = self.cells.values().filter_map(|c| c.keys().next_back()).max()?;
        Some(CellRange::from_indices(*first_row, *min_col, *last_row, *max_col))
    }
}

fn validate_position(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
    }
    Ok(())
}
