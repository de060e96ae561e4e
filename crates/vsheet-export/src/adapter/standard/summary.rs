//! Top-N summary block fed from a selection

use vsheet_core::CellRange;

use super::layout::SummaryBlock;
use super::{stage_sheet, LinkedRows};
use crate::adapter::ExportContext;
use crate::error::ExportResult;

pub(crate) fn write_summary(
    ctx: &mut ExportContext<'_>,
    layout: &SummaryBlock,
    evaluated: Option<&LinkedRows>,
) -> ExportResult<()> {
    let Some(sheet_name) = stage_sheet(ctx, "summary", &layout.sheet) else {
        return Ok(());
    };
    let block = CellRange::parse(&layout.range)?;
    let selections = ctx.selections;
    let rows = match selections.get(&layout.selection) {
        Some(rows) => rows.as_slice(),
        None => {
            ctx.note(format!(
                "{sheet_name}: selection {:?} not defined; summary left blank",
                layout.selection
            ));
            &[]
        }
    };

    let Some(sheet) = ctx.document.worksheet_mut(&sheet_name) else {
        return Ok(());
    };
    sheet.clear_range(&block);

    let label_col = block.start.col;
    let value_col = block.end.col;
    let mut linked = 0usize;
    for (slot, row) in (block.start.row..=block.end.row).enumerate() {
        let Some(item) = rows.get(slot) else {
            continue;
        };
        let hit = evaluated.and_then(|e| {
            e.lookup
                .row(item.sub_scope(), item.item_label(), item.unit())
                .map(|r| (e, r))
        });
        match hit {
            Some((source, source_row)) => {
                sheet.set_cell_formula_at(row, label_col, &source.label_ref(source_row))?;
                if value_col != label_col {
                    sheet.set_cell_formula_at(row, value_col, &source.value_ref(source_row))?;
                }
                linked += 1;
            }
            None => {
                sheet.set_cell_value_at(row, label_col, item.item_label())?;
                match item.ghg_total() {
                    Some(total) if value_col != label_col => {
                        sheet.set_cell_value_at(row, value_col, total)?;
                    }
                    _ => {}
                }
            }
        }
    }

    let shown = rows.len().min(block.row_count() as usize);
    log::debug!("{sheet_name}: {shown} item(s), {linked} linked");
    Ok(())
}
