//! Scope-3 screening block: one header row per sub-scope, one row per item

use vsheet_core::{CellAddress, CellRange, Worksheet};

use super::layout::ScreeningBlock;
use super::{stage_sheet, LinkedRows};
use crate::adapter::{natural_cmp, ExportContext, RowLookup};
use crate::canonical::InventoryItemRow;
use crate::error::ExportResult;

// Column offsets from the left edge of the block
const LABEL: u16 = 0;
const UNIT: u16 = 1;
const QUANTITY: u16 = 2;
const REMARK: u16 = 3;
const EVIDENCE: u16 = 4;
const FACTOR: u16 = 5;
const TOTAL: u16 = 6;
const SHARE: u16 = 7;
const SUB_SCOPE: u16 = 8;
const ISO_LABEL: u16 = 9;

/// Items grouped by sub-scope, groups ordered by their first item's display
/// order and then naturally by code
pub(crate) fn group_items<'a, I>(items: I) -> Vec<(String, Vec<&'a InventoryItemRow>)>
where
    I: IntoIterator<Item = &'a InventoryItemRow>,
{
    let mut groups: Vec<(String, Vec<&InventoryItemRow>)> = Vec::new();
    for item in items {
        let code = item.sub_scope.trim();
        match groups.iter_mut().find(|(c, _)| c == code) {
            Some((_, members)) => members.push(item),
            None => groups.push((code.to_string(), vec![item])),
        }
    }
    groups.sort_by(|(a_code, a), (b_code, b)| {
        let order = |members: &[&InventoryItemRow]| {
            members
                .first()
                .and_then(|item| item.order)
                .unwrap_or(f64::INFINITY)
        };
        order(a)
            .total_cmp(&order(b))
            .then_with(|| natural_cmp(a_code, b_code))
    });
    groups
}

fn col(block: &CellRange, offset: u16) -> String {
    CellAddress::column_to_letters(block.start.col + offset)
}

fn header(code: &str, items: &[&InventoryItemRow]) -> String {
    let category = items
        .first()
        .map(|item| item.category_label.trim())
        .unwrap_or_default();
    if category.is_empty() {
        code.to_string()
    } else {
        format!("{code} {category}")
    }
}

fn write_item(
    sheet: &mut Worksheet,
    block: &CellRange,
    total: &str,
    row: u32,
    item: &InventoryItemRow,
) -> ExportResult<()> {
    let c = block.start.col;
    let r = row + 1;
    sheet.set_cell_value_at(row, c + LABEL, item.item_label.as_str())?;
    if !item.unit.is_empty() {
        sheet.set_cell_value_at(row, c + UNIT, item.unit.as_str())?;
    }
    if let Some(quantity) = item.quantity_per_year {
        sheet.set_cell_value_at(row, c + QUANTITY, quantity)?;
    }
    if !item.remark.is_empty() {
        sheet.set_cell_value_at(row, c + REMARK, item.remark.as_str())?;
    }
    if !item.evidence_refs.is_empty() {
        sheet.set_cell_value_at(row, c + EVIDENCE, item.evidence_refs.join(", "))?;
    }
    if let Some(ef) = item.ef {
        sheet.set_cell_value_at(row, c + FACTOR, ef)?;
    }

    let quantity = col(block, QUANTITY);
    let factor = col(block, FACTOR);
    let ghg = col(block, TOTAL);
    sheet.set_cell_formula_at(row, c + TOTAL, &format!("={quantity}{r}*{factor}{r}/1000"))?;
    sheet.set_cell_formula_at(
        row,
        c + SHARE,
        &format!("=IF({total}=0,0,{ghg}{r}/{total}*100)"),
    )?;

    sheet.set_cell_value_at(row, c + SUB_SCOPE, item.sub_scope.trim())?;
    if !item.iso_scope_label.is_empty() {
        sheet.set_cell_value_at(row, c + ISO_LABEL, item.iso_scope_label.as_str())?;
    }
    Ok(())
}

pub(crate) fn write_screening(
    ctx: &mut ExportContext<'_>,
    layout: &ScreeningBlock,
) -> ExportResult<Option<LinkedRows>> {
    let Some(sheet_name) = stage_sheet(ctx, "screening", &layout.sheet) else {
        return Ok(None);
    };
    let block = CellRange::parse(&layout.range)?;
    let total_cell = CellAddress::parse(&layout.total_cell)?;
    let total = format!("${}${}", total_cell.column_letters(), total_cell.row_number());
    let data = ctx.data;
    let groups = group_items(data.scope3_items());

    let Some(sheet) = ctx.document.worksheet_mut(&sheet_name) else {
        return Ok(None);
    };
    sheet.clear_range(&block);

    let mut lookup = RowLookup::new();
    let mut duplicates = 0usize;
    let mut dropped = 0usize;
    let mut row = block.start.row;
    for (code, items) in &groups {
        if row > block.end.row {
            dropped += items.len();
            continue;
        }
        sheet.set_cell_value_at(row, block.start.col + LABEL, header(code, items))?;
        row += 1;

        for item in items {
            if row > block.end.row {
                dropped += 1;
                continue;
            }
            write_item(sheet, &block, &total, row, item)?;
            if !lookup.insert(&item.sub_scope, &item.item_label, &item.unit, row + 1) {
                duplicates += 1;
            }
            row += 1;
        }
    }

    log::debug!(
        "{sheet_name}: {} group(s), {} keyed row(s)",
        groups.len(),
        lookup.len()
    );
    if duplicates > 0 {
        ctx.note(format!(
            "{sheet_name}: {duplicates} item(s) repeat an earlier sub-scope/label/unit key; links use the first"
        ));
    }
    if dropped > 0 {
        ctx.note(format!(
            "{sheet_name}: {dropped} item(s) did not fit in {}",
            layout.range
        ));
    }

    Ok(Some(LinkedRows {
        sheet: sheet_name,
        lookup,
        label_column: col(&block, LABEL),
        value_column: col(&block, TOTAL),
        share_column: col(&block, SHARE),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(code: &str, label: &str, order: Option<f64>) -> InventoryItemRow {
        InventoryItemRow {
            scope: 3,
            sub_scope: code.into(),
            item_label: label.into(),
            order,
            ..Default::default()
        }
    }

    #[test]
    fn test_group_order() {
        let items = vec![
            item("3.10", "x", None),
            item("3.2", "y", None),
            item("3.9", "z", Some(1.0)),
            item("3.2", "w", Some(0.0)),
        ];
        let groups = group_items(&items);
        let codes: Vec<&str> = groups.iter().map(|(c, _)| c.as_str()).collect();
        // 3.2's first item has no order, so 3.9 (order 1) leads
        assert_eq!(codes, vec!["3.9", "3.2", "3.10"]);
        assert_eq!(groups[1].1.len(), 2);
    }

    #[test]
    fn test_header_label() {
        let mut a = item("3.1", "Paper", None);
        assert_eq!(header("3.1", &[&a]), "3.1");
        a.category_label = " Purchased goods ".into();
        assert_eq!(header("3.1", &[&a]), "3.1 Purchased goods");
    }
}
