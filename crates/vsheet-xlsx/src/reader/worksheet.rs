//! Worksheet part parsing (`<sheetData>` only)

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::decode_excel_escapes;
use super::shared_formula::shift_formula;
use crate::error::{XlsxError, XlsxResult};
use vsheet_core::{
    normalize_formula, CellAddress, CellData, CellError, CellValue, FormulaKind, RowProps,
    Worksheet,
};

#[derive(Default)]
struct PendingFormula {
    text: String,
    formula_type: Option<String>,
    shared_index: Option<u32>,
    range: Option<String>,
}

#[derive(Default)]
struct PendingCell {
    row: u32,
    col: u16,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    inline_text: Option<String>,
    formula: Option<PendingFormula>,
}

/// Shared formula member waiting for its anchor's text
struct SharedMember {
    row: u32,
    col: u16,
    index: u32,
    style: u32,
    cached: Option<CellValue>,
}

#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

/// Read the cells and row properties of a worksheet part
pub(crate) fn read_worksheet(
    data: &[u8],
    worksheet: &mut Worksheet,
    shared_strings: &[String],
) -> XlsxResult<()> {
    let mut xml_reader = Reader::from_reader(data);
    // Whitespace inside <v>, <f> and <t> is significant
    xml_reader.trim_text(false);

    let mut buf = Vec::new();
    let mut current_row: Option<u32> = None;
    let mut next_col: u16 = 0;
    let mut cell: Option<PendingCell> = None;
    let mut target = TextTarget::None;
    let mut in_inline_str = false;

    let mut anchors: HashMap<u32, (u32, u16, String)> = HashMap::new();
    let mut members: Vec<SharedMember> = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = Some(read_row(&e, current_row, worksheet)?);
                    next_col = 0;
                }
                b"c" => {
                    let pending = start_cell(&e, current_row.unwrap_or(0), next_col)?;
                    next_col = pending.col.saturating_add(1);
                    cell = Some(pending);
                }
                b"v" if cell.is_some() => target = TextTarget::Value,
                b"f" => {
                    if let Some(c) = cell.as_mut() {
                        c.formula = Some(start_formula(&e));
                        target = TextTarget::Formula;
                    }
                }
                b"is" if cell.is_some() => in_inline_str = true,
                b"t" if in_inline_str => target = TextTarget::Inline,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = Some(read_row(&e, current_row, worksheet)?);
                    next_col = 0;
                }
                b"c" => {
                    let pending = start_cell(&e, current_row.unwrap_or(0), next_col)?;
                    next_col = pending.col.saturating_add(1);
                    finish_cell(pending, worksheet, shared_strings, &mut anchors, &mut members)?;
                }
                b"f" => {
                    if let Some(c) = cell.as_mut() {
                        c.formula = Some(start_formula(&e));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if target != TextTarget::None => {
                let text = e.unescape()?;
                if let Some(c) = cell.as_mut() {
                    match target {
                        TextTarget::Value => c.value.get_or_insert_with(String::new).push_str(&text),
                        TextTarget::Formula => {
                            if let Some(f) = c.formula.as_mut() {
                                f.text.push_str(&text);
                            }
                        }
                        TextTarget::Inline => c
                            .inline_text
                            .get_or_insert_with(String::new)
                            .push_str(&text),
                        TextTarget::None => {}
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(pending) = cell.take() {
                        finish_cell(pending, worksheet, shared_strings, &mut anchors, &mut members)?;
                    }
                    in_inline_str = false;
                    target = TextTarget::None;
                }
                b"v" | b"f" | b"t" => target = TextTarget::None,
                b"is" => in_inline_str = false,
                b"sheetData" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    for member in members {
        let text = match anchors.get(&member.index) {
            Some((row, col, anchor_text)) => shift_formula(
                anchor_text,
                member.row as i64 - *row as i64,
                member.col as i64 - *col as i64,
            ),
            None => {
                log::warn!(
                    "shared formula {} has no anchor; keeping {} as a value",
                    member.index,
                    CellAddress::new(member.row, member.col)
                );
                let value = member.cached.unwrap_or_default();
                worksheet.set_cell_data_at(
                    member.row,
                    member.col,
                    CellData::with_style(value, member.style),
                )?;
                continue;
            }
        };
        let value = CellValue::Formula {
            text: normalize_formula(&text),
            cached_value: member.cached.map(Box::new),
            kind: FormulaKind::Shared {
                index: member.index,
                range: None,
            },
        };
        worksheet.set_cell_data_at(member.row, member.col, CellData::with_style(value, member.style))?;
    }

    Ok(())
}

/// Record row properties and return the 0-based row index
fn read_row(
    e: &BytesStart<'_>,
    previous_row: Option<u32>,
    worksheet: &mut Worksheet,
) -> XlsxResult<u32> {
    let mut row_idx = None;
    let mut attributes = Vec::new();

    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        match key.as_str() {
            "r" => {
                let r: u32 = value
                    .parse()
                    .map_err(|_| XlsxError::InvalidCell(format!("row number {value:?}")))?;
                row_idx = Some(r.saturating_sub(1));
            }
            "spans" => {}
            _ => attributes.push((key, value)),
        }
    }

    // Rows without `r` follow the previous one
    let row = row_idx.unwrap_or_else(|| previous_row.map_or(0, |r| r + 1));
    if !attributes.is_empty() {
        worksheet.set_row_props(row, RowProps::new(attributes));
    }
    Ok(row)
}

fn start_cell(e: &BytesStart<'_>, current_row: u32, next_col: u16) -> XlsxResult<PendingCell> {
    let mut pending = PendingCell {
        row: current_row,
        col: next_col,
        ..Default::default()
    };

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => {
                let reference = attr.unescape_value()?;
                let addr = CellAddress::parse(&reference)?;
                pending.row = addr.row;
                pending.col = addr.col;
            }
            b"t" => pending.cell_type = Some(attr.unescape_value()?.into_owned()),
            b"s" => {
                pending.style = attr
                    .unescape_value()
                    .ok()
                    .and_then(|s| s.parse::<u32>().ok())
                    .unwrap_or(0);
            }
            _ => {}
        }
    }

    Ok(pending)
}

fn start_formula(e: &BytesStart<'_>) -> PendingFormula {
    let mut formula = PendingFormula::default();
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().ok().map(|v| v.into_owned());
        match attr.key.as_ref() {
            b"t" => formula.formula_type = value,
            b"si" => formula.shared_index = value.and_then(|v| v.parse().ok()),
            b"ref" => formula.range = value,
            _ => {}
        }
    }
    formula
}

fn cached_value(pending: &PendingCell, shared_strings: &[String]) -> XlsxResult<CellValue> {
    if pending.cell_type.as_deref() == Some("inlineStr") {
        return Ok(pending
            .inline_text
            .as_deref()
            .map(|t| CellValue::String(decode_excel_escapes(t)))
            .unwrap_or_default());
    }

    let Some(raw) = pending.value.as_deref() else {
        return Ok(CellValue::Empty);
    };

    let value = match pending.cell_type.as_deref() {
        Some("s") => {
            let idx: usize = raw
                .trim()
                .parse()
                .map_err(|_| XlsxError::InvalidCell(format!("shared string index {raw:?}")))?;
            let s = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::InvalidCell(format!("shared string index {idx} out of range"))
            })?;
            CellValue::String(s.clone())
        }
        Some("str") | Some("d") => CellValue::String(decode_excel_escapes(raw)),
        Some("b") => CellValue::Boolean(matches!(raw.trim(), "1" | "true")),
        Some("e") => match CellError::parse(raw.trim()) {
            Some(err) => CellValue::Error(err),
            None => CellValue::String(raw.to_string()),
        },
        _ => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::String(raw.to_string()),
        },
    };
    Ok(value)
}

fn finish_cell(
    pending: PendingCell,
    worksheet: &mut Worksheet,
    shared_strings: &[String],
    anchors: &mut HashMap<u32, (u32, u16, String)>,
    members: &mut Vec<SharedMember>,
) -> XlsxResult<()> {
    let cached = cached_value(&pending, shared_strings)?;
    let (row, col, style) = (pending.row, pending.col, pending.style);

    let value = match pending.formula {
        None => cached,
        Some(formula) => {
            let cached = (!cached.is_empty()).then_some(cached);
            let kind = match (formula.formula_type.as_deref(), formula.shared_index) {
                (Some("shared"), Some(index)) => {
                    if formula.text.trim().is_empty() {
                        members.push(SharedMember {
                            row,
                            col,
                            index,
                            style,
                            cached,
                        });
                        return Ok(());
                    }
                    anchors.insert(index, (row, col, formula.text.clone()));
                    FormulaKind::Shared {
                        index,
                        range: formula.range,
                    }
                }
                (Some("array"), _) => FormulaKind::Array {
                    range: formula
                        .range
                        .unwrap_or_else(|| CellAddress::new(row, col).to_a1_string()),
                },
                _ => FormulaKind::Normal,
            };

            if formula.text.trim().is_empty() {
                // Nothing to evaluate; keep whatever result was stored
                cached.unwrap_or_default()
            } else {
                CellValue::Formula {
                    text: normalize_formula(&formula.text),
                    cached_value: cached.map(Box::new),
                    kind,
                }
            }
        }
    };

    worksheet.set_cell_data_at(row, col, CellData::with_style(value, style))?;
    Ok(())
}
