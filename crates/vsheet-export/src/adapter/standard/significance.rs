//! Scope-3 significance block, linked to the screening rows

use vsheet_core::{CellAddress, CellRange};

use super::layout::SignificanceBlock;
use super::{stage_sheet, LinkedRows};
use crate::adapter::{natural_cmp, ExportContext, RowLookup};
use crate::canonical::Scope3SignificanceRow;
use crate::error::ExportResult;

const LABEL: u16 = 0;
const TOTAL: u16 = 1;
const SHARE: u16 = 2;
const ASSESSMENT: u16 = 3;
const SELECTION: u16 = 4;

/// Rows grouped by sub-scope, groups in natural code order
pub(crate) fn group_rows(rows: &[Scope3SignificanceRow]) -> Vec<(String, Vec<&Scope3SignificanceRow>)> {
    let mut groups: Vec<(String, Vec<&Scope3SignificanceRow>)> = Vec::new();
    for row in rows {
        let code = row.sub_scope.trim();
        match groups.iter_mut().find(|(c, _)| c == code) {
            Some((_, members)) => members.push(row),
            None => groups.push((code.to_string(), vec![row])),
        }
    }
    groups.sort_by(|(a, _), (b, _)| natural_cmp(a, b));
    groups
}

pub(crate) fn write_significance(
    ctx: &mut ExportContext<'_>,
    layout: &SignificanceBlock,
    screened: Option<&LinkedRows>,
) -> ExportResult<Option<LinkedRows>> {
    let Some(sheet_name) = stage_sheet(ctx, "significance", &layout.sheet) else {
        return Ok(None);
    };
    let block = CellRange::parse(&layout.range)?;
    let data = ctx.data;
    let groups = group_rows(&data.significance);

    let Some(sheet) = ctx.document.worksheet_mut(&sheet_name) else {
        return Ok(None);
    };
    sheet.clear_range(&block);

    let c = block.start.col;
    let mut lookup = RowLookup::new();
    let mut linked = 0usize;
    let mut misses = 0usize;
    let mut dropped = 0usize;
    let mut row = block.start.row;
    for (code, members) in &groups {
        if row > block.end.row {
            dropped += members.len();
            continue;
        }
        let category = members
            .first()
            .map(|m| m.category_label.trim())
            .unwrap_or_default();
        let header = if category.is_empty() {
            code.clone()
        } else {
            format!("{code} {category}")
        };
        sheet.set_cell_value_at(row, c + LABEL, header)?;
        row += 1;

        for item in members {
            if row > block.end.row {
                dropped += 1;
                continue;
            }
            let hit = screened.and_then(|s| {
                s.lookup
                    .row(&item.sub_scope, &item.item_label, &item.unit)
                    .map(|r| (s, r))
            });
            match hit {
                Some((source, source_row)) => {
                    sheet.set_cell_formula_at(row, c + LABEL, &source.label_ref(source_row))?;
                    sheet.set_cell_formula_at(row, c + TOTAL, &source.value_ref(source_row))?;
                    sheet.set_cell_formula_at(row, c + SHARE, &source.share_ref(source_row))?;
                    linked += 1;
                }
                None => {
                    sheet.set_cell_value_at(row, c + LABEL, item.item_label.as_str())?;
                    if let Some(total) = item.ghg_total {
                        sheet.set_cell_value_at(row, c + TOTAL, total)?;
                    }
                    if let Some(share) = item.share_pct {
                        sheet.set_cell_value_at(row, c + SHARE, share)?;
                    }
                    misses += 1;
                }
            }
            let assessment = item.assessment.as_str();
            if !assessment.is_empty() {
                sheet.set_cell_value_at(row, c + ASSESSMENT, assessment)?;
            }
            if !item.selection.is_empty() {
                sheet.set_cell_value_at(row, c + SELECTION, item.selection.as_str())?;
            }
            lookup.insert(&item.sub_scope, &item.item_label, &item.unit, row + 1);
            row += 1;
        }
    }

    log::debug!("{sheet_name}: {linked} linked row(s), {misses} literal row(s)");
    if misses > 0 && screened.is_some() {
        ctx.note(format!(
            "{sheet_name}: {misses} row(s) not found on the screening sheet; wrote values instead of links"
        ));
    }
    if dropped > 0 {
        ctx.note(format!(
            "{sheet_name}: {dropped} row(s) did not fit in {}",
            layout.range
        ));
    }

    Ok(Some(LinkedRows {
        sheet: sheet_name,
        lookup,
        label_column: CellAddress::column_to_letters(c + LABEL),
        value_column: CellAddress::column_to_letters(c + TOTAL),
        share_column: CellAddress::column_to_letters(c + SHARE),
    }))
}
