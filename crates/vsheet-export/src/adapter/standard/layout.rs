//! Where the standard adapter writes, as data

use serde::{Deserialize, Serialize};
use vsheet_core::{CellAddress, CellRange, MAX_COLS, MAX_ROWS};

use crate::canonical::MONTHS;
use crate::error::{ExportError, ExportResult};

/// An input row bound to one fuel key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedRow {
    /// 1-based row number
    pub row: u32,
    pub fuel_key: String,
}

/// A block of repeating rows filled from one sub-scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotGroup {
    pub sub_scope: String,
    pub first_row: u32,
    pub last_row: u32,
}

impl SlotGroup {
    pub fn capacity(&self) -> usize {
        (self.last_row + 1).saturating_sub(self.first_row) as usize
    }
}

/// A sheet with one row per fuel/activity and twelve month columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySheet {
    /// Sheet key in the template spec
    pub sheet: String,
    /// Column holding the row label (written for slot rows only)
    pub label_column: String,
    /// Column of January; the next eleven columns hold the other months
    pub first_month_column: String,
    #[serde(default)]
    pub fixed_rows: Vec<FixedRow>,
    #[serde(default)]
    pub slots: Option<SlotGroup>,
}

/// A rectangular block with a grand-total cell below it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningBlock {
    pub sheet: String,
    pub range: String,
    /// Cell holding the template's grand total of the GHG column
    pub total_cell: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignificanceBlock {
    pub sheet: String,
    pub range: String,
}

/// Fixed-size top-N block fed from a selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBlock {
    pub sheet: String,
    pub range: String,
    /// Selection rule name
    pub selection: String,
}

/// Everything the standard adapter writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardLayout {
    pub monthly: Vec<MonthlySheet>,
    pub screening: ScreeningBlock,
    pub significance: SignificanceBlock,
    pub summary: SummaryBlock,
}

fn fixed(rows: &[(u32, &str)]) -> Vec<FixedRow> {
    rows.iter()
        .map(|(row, key)| FixedRow {
            row: *row,
            fuel_key: key.to_string(),
        })
        .collect()
}

impl Default for StandardLayout {
    fn default() -> Self {
        Self {
            monthly: vec![
                MonthlySheet {
                    sheet: "fuelStationary".into(),
                    label_column: "C".into(),
                    first_month_column: "D".into(),
                    fixed_rows: fixed(&[
                        (8, "DIESEL_B7_STATIONARY"),
                        (9, "LPG_STATIONARY"),
                        (10, "NATURAL_GAS"),
                        (11, "FUEL_OIL"),
                    ]),
                    slots: Some(SlotGroup {
                        sub_scope: "1.1".into(),
                        first_row: 12,
                        last_row: 16,
                    }),
                },
                MonthlySheet {
                    sheet: "fuelMobile".into(),
                    label_column: "C".into(),
                    first_month_column: "D".into(),
                    fixed_rows: fixed(&[
                        (8, "DIESEL_B7_MOBILE"),
                        (9, "GASOLINE_MOBILE"),
                        (10, "LPG_MOBILE"),
                    ]),
                    slots: Some(SlotGroup {
                        sub_scope: "1.2".into(),
                        first_row: 11,
                        last_row: 14,
                    }),
                },
                MonthlySheet {
                    sheet: "refrigerant".into(),
                    label_column: "C".into(),
                    first_month_column: "D".into(),
                    fixed_rows: Vec::new(),
                    slots: Some(SlotGroup {
                        sub_scope: "1.4".into(),
                        first_row: 8,
                        last_row: 17,
                    }),
                },
            ],
            screening: ScreeningBlock {
                sheet: "scope3Screening".into(),
                range: "B10:K120".into(),
                total_cell: "H122".into(),
            },
            significance: SignificanceBlock {
                sheet: "scope3Significance".into(),
                range: "B10:F220".into(),
            },
            summary: SummaryBlock {
                sheet: "scope3Summary".into(),
                range: "B8:C12".into(),
                selection: "scope3Top".into(),
            },
        }
    }
}

impl MonthlySheet {
    /// Zero-based (label column, first month column)
    pub fn columns(&self) -> vsheet_core::Result<(u16, u16)> {
        Ok((
            CellAddress::letters_to_column(&self.label_column)?,
            CellAddress::letters_to_column(&self.first_month_column)?,
        ))
    }

    /// Every row this sheet writes, 1-based
    pub fn input_rows(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = self.fixed_rows.iter().map(|f| f.row).collect();
        if let Some(slots) = &self.slots {
            rows.extend(slots.first_row..=slots.last_row);
        }
        rows.sort_unstable();
        rows.dedup();
        rows
    }

    /// Reject rows outside the sheet and month columns past the last column
    pub fn validate(&self) -> ExportResult<()> {
        let invalid = |what: String| ExportError::InvalidSpec(format!("{}: {what}", self.sheet));
        for fixed in &self.fixed_rows {
            if fixed.row == 0 || fixed.row > MAX_ROWS {
                return Err(invalid(format!(
                    "bad row {} for {}",
                    fixed.row, fixed.fuel_key
                )));
            }
        }
        if let Some(slots) = &self.slots {
            if slots.first_row == 0
                || slots.last_row > MAX_ROWS
                || slots.last_row < slots.first_row
            {
                return Err(invalid(format!(
                    "bad slot rows {}..{}",
                    slots.first_row, slots.last_row
                )));
            }
        }
        let (_, first_month) = self.columns()?;
        if u32::from(first_month) + MONTHS as u32 > u32::from(MAX_COLS) {
            return Err(invalid(format!(
                "month columns from {} run past the last column",
                self.first_month_column
            )));
        }
        Ok(())
    }

    /// Rectangles covering the written cells, one per contiguous row run
    pub fn regions(&self) -> ExportResult<Vec<CellRange>> {
        self.validate()?;
        let (label_col, first_month) = self.columns()?;
        let last_month = first_month + MONTHS as u16 - 1;
        let first_col = if self.slots.is_some() {
            label_col.min(first_month)
        } else {
            first_month
        };
        let last_col = if self.slots.is_some() {
            label_col.max(last_month)
        } else {
            last_month
        };

        let mut regions = Vec::new();
        let rows = self.input_rows();
        let mut iter = rows.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            regions.push(CellRange::from_indices(start - 1, first_col, end - 1, last_col));
        }
        Ok(regions)
    }
}

impl ScreeningBlock {
    /// The grand-total cell must lie outside the block, which is cleared on
    /// every export
    pub fn validate(&self) -> ExportResult<()> {
        let range = CellRange::parse(&self.range)?;
        let total = CellAddress::parse(&self.total_cell)?;
        if range.contains(&total) {
            return Err(ExportError::InvalidSpec(format!(
                "{}: total cell {} lies inside the screening block {}",
                self.sheet, self.total_cell, self.range
            )));
        }
        Ok(())
    }
}

impl StandardLayout {
    pub fn validate(&self) -> ExportResult<()> {
        for sheet in &self.monthly {
            sheet.validate()?;
        }
        self.screening.validate()?;
        CellRange::parse(&self.significance.range)?;
        CellRange::parse(&self.summary.range)?;
        Ok(())
    }
}
