//! Monthly input sheets: fixed fuel rows and slotted rows

use ahash::AHashSet;
use vsheet_core::Worksheet;

use super::layout::{MonthlySheet, SlotGroup};
use super::stage_sheet;
use crate::adapter::{normalize_key, ExportContext};
use crate::canonical::{InventoryItemRow, MONTHS};
use crate::error::ExportResult;

/// Per-cell writes that leave formula cells alone
struct InputCells<'s> {
    sheet: &'s mut Worksheet,
    protected: usize,
}

impl<'s> InputCells<'s> {
    fn new(sheet: &'s mut Worksheet) -> Self {
        Self { sheet, protected: 0 }
    }

    fn clear(&mut self, row: u32, col: u16) {
        if self.sheet.is_formula_at(row, col) {
            self.protected += 1;
        } else {
            self.sheet.clear_cell_at(row, col);
        }
    }

    /// Zero and missing values stay empty
    fn number(&mut self, row: u32, col: u16, value: Option<f64>) -> ExportResult<()> {
        match value {
            Some(v) if v != 0.0 => self.put(row, col, v),
            _ => Ok(()),
        }
    }

    fn text(&mut self, row: u32, col: u16, value: &str) -> ExportResult<()> {
        if value.is_empty() {
            Ok(())
        } else {
            self.put(row, col, value)
        }
    }

    fn put<V>(&mut self, row: u32, col: u16, value: V) -> ExportResult<()>
    where
        V: Into<vsheet_core::CellValue>,
    {
        if self.sheet.is_formula_at(row, col) {
            self.protected += 1;
            return Ok(());
        }
        Ok(self.sheet.set_cell_value_at(row, col, value)?)
    }
}

/// Month-wise sum over the items that carry a monthly breakdown
fn month_totals<'a, I>(items: I) -> [Option<f64>; MONTHS]
where
    I: IntoIterator<Item = &'a InventoryItemRow>,
{
    let mut totals = [None; MONTHS];
    for item in items {
        let Some(monthly) = &item.monthly else {
            continue;
        };
        for (total, value) in totals.iter_mut().zip(monthly.iter()) {
            if let Some(v) = value {
                *total = Some(total.unwrap_or(0.0) + v);
            }
        }
    }
    totals
}

/// Assign items to slots: explicit 1-based slot numbers first, then the
/// remaining items in order. Returns the slots and the number dropped.
///
/// An explicit slot outside the group, or one already claimed by an earlier
/// item, drops the item.
pub(crate) fn assign_slots<'a>(
    group: &SlotGroup,
    items: &[&'a InventoryItemRow],
) -> (Vec<Option<&'a InventoryItemRow>>, usize) {
    let mut slots: Vec<Option<&InventoryItemRow>> = vec![None; group.capacity()];
    let mut pending = Vec::new();
    let mut dropped = 0usize;
    for &item in items {
        let Some(n) = item.slot else {
            pending.push(item);
            continue;
        };
        match (n as usize).checked_sub(1).and_then(|i| slots.get_mut(i)) {
            Some(slot) if slot.is_none() => *slot = Some(item),
            _ => dropped += 1,
        }
    }

    let mut pending = pending.into_iter();
    for slot in slots.iter_mut().filter(|s| s.is_none()) {
        match pending.next() {
            Some(item) => *slot = Some(item),
            None => break,
        }
    }
    dropped += pending.count();
    (slots, dropped)
}

pub(crate) fn write_monthly_sheet(ctx: &mut ExportContext<'_>, layout: &MonthlySheet) -> ExportResult<()> {
    let stage = format!("monthly {}", layout.sheet);
    let Some(sheet_name) = stage_sheet(ctx, &stage, &layout.sheet) else {
        return Ok(());
    };
    let (label_col, first_month) = layout.columns()?;
    let data = ctx.data;

    let fixed_keys: AHashSet<String> = layout
        .fixed_rows
        .iter()
        .map(|f| normalize_key(&f.fuel_key))
        .collect();
    let matches_key = |item: &InventoryItemRow, key: &str| {
        item.fuel_key
            .as_deref()
            .is_some_and(|k| normalize_key(k) == key)
    };

    let (slots, dropped) = match &layout.slots {
        Some(group) => {
            let candidates: Vec<&InventoryItemRow> = data
                .inventory
                .iter()
                .filter(|item| item.sub_scope.trim() == group.sub_scope)
                .filter(|item| {
                    item.fuel_key
                        .as_deref()
                        .map_or(true, |k| !fixed_keys.contains(&normalize_key(k)))
                })
                .collect();
            let (slots, dropped) = assign_slots(group, &candidates);
            (Some((group, slots)), dropped)
        }
        None => (None, 0),
    };

    let Some(sheet) = ctx.document.worksheet_mut(&sheet_name) else {
        return Ok(());
    };
    let mut cells = InputCells::new(sheet);

    for row in layout.input_rows() {
        let is_slot = layout
            .slots
            .as_ref()
            .is_some_and(|g| (g.first_row..=g.last_row).contains(&row));
        if is_slot {
            cells.clear(row - 1, label_col);
        }
        for m in 0..MONTHS as u16 {
            cells.clear(row - 1, first_month + m);
        }
    }

    let mut filled = 0usize;
    for fixed in &layout.fixed_rows {
        let key = normalize_key(&fixed.fuel_key);
        let totals = month_totals(data.inventory.iter().filter(|item| matches_key(*item, &key)));
        if totals.iter().any(Option::is_some) {
            filled += 1;
        }
        for (m, total) in totals.iter().enumerate() {
            cells.number(fixed.row - 1, first_month + m as u16, *total)?;
        }
    }

    if let Some((group, slots)) = &slots {
        for (i, item) in slots.iter().enumerate() {
            let Some(item) = item else {
                continue;
            };
            let row = group.first_row - 1 + i as u32;
            cells.text(row, label_col, &item.item_label)?;
            let totals = month_totals(std::iter::once(*item));
            for (m, total) in totals.iter().enumerate() {
                cells.number(row, first_month + m as u16, *total)?;
            }
            filled += 1;
        }
    }

    let protected = cells.protected;
    log::debug!("{sheet_name}: {filled} row(s) written");
    if protected > 0 {
        ctx.note(format!(
            "{sheet_name}: {protected} formula cell(s) inside input rows left untouched"
        ));
    }
    if dropped > 0 {
        ctx.note(format!(
            "{sheet_name}: {dropped} item(s) without a free slot row dropped"
        ));
    }
    Ok(())
}
