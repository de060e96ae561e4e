//! `<sheetData>` serialization shared by the fresh and the patched writer

use std::collections::HashSet;
use std::fmt::Write as _;

use vsheet_core::{CellAddress, CellData, CellValue, FormulaKind, Worksheet};

/// Escape text for XML element content and attribute values
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Encode characters XML 1.0 cannot carry using Excel's `_xHHHH_` form.
///
/// Literal text that already looks like an escape gets its underscore
/// escaped, so reading the file back yields the original string.
pub(crate) fn encode_excel_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '_' if looks_like_escape(&s[i..]) => out.push_str("_x005F_"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                let _ = write!(out, "_x{:04X}_", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

fn looks_like_escape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b[1] == b'x'
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}

/// The `ref` of the worksheet `<dimension>` element
pub(crate) fn dimension_ref(sheet: &Worksheet) -> String {
    sheet
        .used_range()
        .map(|r| r.to_a1_string())
        .unwrap_or_else(|| "A1".to_string())
}

/// Serialize a worksheet's rows and cells as a complete `<sheetData>` element.
///
/// `prefix` is the namespace prefix of the host document (`""` or `"x:"`).
/// With `keep_extension_attrs` false, prefixed row attributes such as
/// `x14ac:dyDescent` are dropped because a fresh package does not declare
/// their namespaces.
pub(crate) fn write_sheet_data(sheet: &Worksheet, prefix: &str, keep_extension_attrs: bool) -> String {
    let live_groups = live_shared_groups(sheet);
    let mut content = String::new();

    let rows = sheet.row_indices();
    if rows.is_empty() {
        let _ = write!(content, "<{prefix}sheetData/>");
        return content;
    }

    let _ = write!(content, "<{prefix}sheetData>");
    for row in rows {
        let _ = write!(content, "<{prefix}row r=\"{}\"", row + 1);
        if let Some(props) = sheet.row_props(row) {
            for (key, value) in &props.attributes {
                if !keep_extension_attrs && key.contains(':') {
                    continue;
                }
                let _ = write!(content, " {key}=\"{}\"", escape_xml(value));
            }
        }

        let mut cells = sheet.row_cells(row).peekable();
        if cells.peek().is_none() {
            content.push_str("/>");
            continue;
        }
        content.push('>');
        for (col, cell) in cells {
            write_cell(&mut content, prefix, row, col, cell, &live_groups);
        }
        let _ = write!(content, "</{prefix}row>");
    }
    let _ = write!(content, "</{prefix}sheetData>");
    content
}

/// Shared groups whose anchor cell still carries the group's formula
fn live_shared_groups(sheet: &Worksheet) -> HashSet<u32> {
    sheet
        .iter_cells()
        .filter_map(|(_, _, cell)| match &cell.value {
            CellValue::Formula {
                kind: FormulaKind::Shared {
                    index,
                    range: Some(_),
                },
                ..
            } => Some(*index),
            _ => None,
        })
        .collect()
}

fn write_cell(
    content: &mut String,
    prefix: &str,
    row: u32,
    col: u16,
    cell: &CellData,
    live_groups: &HashSet<u32>,
) {
    let cell_ref = CellAddress::new(row, col).to_a1_string();
    let style_attr = if cell.style != 0 {
        format!(" s=\"{}\"", cell.style)
    } else {
        String::new()
    };

    match &cell.value {
        CellValue::Empty => {
            let _ = write!(content, "<{prefix}c r=\"{cell_ref}\"{style_attr}/>");
        }
        CellValue::Formula {
            text,
            cached_value,
            kind,
        } => {
            let cached = cached_value.as_deref();
            let type_attr = cached.map(value_type_attr).unwrap_or("");
            let _ = write!(content, "<{prefix}c r=\"{cell_ref}\"{style_attr}{type_attr}>");
            let body = escape_xml(text.strip_prefix('=').unwrap_or(text));
            match kind {
                FormulaKind::Shared { index, range } if live_groups.contains(index) => {
                    match range {
                        Some(range) => {
                            let _ = write!(
                                content,
                                "<{prefix}f t=\"shared\" ref=\"{range}\" si=\"{index}\">{body}</{prefix}f>"
                            );
                        }
                        None => {
                            let _ = write!(content, "<{prefix}f t=\"shared\" si=\"{index}\"/>");
                        }
                    }
                }
                FormulaKind::Array { range } => {
                    let _ = write!(
                        content,
                        "<{prefix}f t=\"array\" ref=\"{range}\">{body}</{prefix}f>"
                    );
                }
                _ => {
                    let _ = write!(content, "<{prefix}f>{body}</{prefix}f>");
                }
            }
            if let Some(v) = cached.and_then(value_text) {
                let _ = write!(content, "<{prefix}v>{v}</{prefix}v>");
            }
            let _ = write!(content, "</{prefix}c>");
        }
        CellValue::String(s) => {
            let encoded = encode_excel_escapes(s);
            let space = if needs_preserve(s) {
                " xml:space=\"preserve\""
            } else {
                ""
            };
            let _ = write!(
                content,
                "<{prefix}c r=\"{cell_ref}\"{style_attr} t=\"inlineStr\"><{prefix}is><{prefix}t{space}>{}</{prefix}t></{prefix}is></{prefix}c>",
                escape_xml(&encoded)
            );
        }
        value => {
            let type_attr = value_type_attr(value);
            let v = value_text(value).unwrap_or_default();
            let _ = write!(
                content,
                "<{prefix}c r=\"{cell_ref}\"{style_attr}{type_attr}><{prefix}v>{v}</{prefix}v></{prefix}c>"
            );
        }
    }
}

/// `t` attribute for a literal (or cached) value
fn value_type_attr(value: &CellValue) -> &'static str {
    match value {
        CellValue::Number(n) if n.is_finite() => "",
        CellValue::Number(_) | CellValue::Error(_) => " t=\"e\"",
        CellValue::Boolean(_) => " t=\"b\"",
        CellValue::String(_) => " t=\"str\"",
        CellValue::Empty | CellValue::Formula { .. } => "",
    }
}

/// Escaped `<v>` text for a literal (or cached) value
fn value_text(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Number(n) if n.is_finite() => Some(n.to_string()),
        CellValue::Number(_) => Some("#NUM!".to_string()),
        CellValue::Boolean(b) => Some(if *b { "1" } else { "0" }.to_string()),
        CellValue::Error(e) => Some(escape_xml(e.as_str())),
        CellValue::String(s) => Some(escape_xml(&encode_excel_escapes(s))),
        CellValue::Empty | CellValue::Formula { .. } => None,
    }
}

fn needs_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) || s.contains('\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vsheet_core::{CellError, RowProps};

    #[test]
    fn test_empty_sheet() {
        let ws = Worksheet::new("Empty");
        assert_eq!(write_sheet_data(&ws, "", true), "<sheetData/>");
        assert_eq!(dimension_ref(&ws), "A1");
    }

    #[test]
    fn test_cells_and_rows() {
        let mut ws = Worksheet::new("Fuel");
        ws.set_row_props(
            7,
            RowProps::new(vec![
                ("ht".into(), "18".into()),
                ("x14ac:dyDescent".into(), "0.25".into()),
            ]),
        );
        ws.set_cell_value("C8", "Diesel <B7>").unwrap();
        ws.set_cell_value("D8", 10.0).unwrap();
        ws.set_cell_formula("P8", "SUM(D8:O8)").unwrap();
        ws.set_cell_value("A9", CellError::Div0).unwrap();

        let xml = write_sheet_data(&ws, "", false);
        assert_eq!(
            xml,
            concat!(
                "<sheetData><row r=\"8\" ht=\"18\">",
                "<c r=\"C8\" t=\"inlineStr\"><is><t>Diesel &lt;B7&gt;</t></is></c>",
                "<c r=\"D8\"><v>10</v></c>",
                "<c r=\"P8\"><f>SUM(D8:O8)</f></c></row>",
                "<row r=\"9\"><c r=\"A9\" t=\"e\"><v>#DIV/0!</v></c></row></sheetData>"
            )
        );
        assert_eq!(dimension_ref(&ws), "A8:P9");
        assert!(write_sheet_data(&ws, "x:", true)
            .contains("<x:row r=\"8\" ht=\"18\" x14ac:dyDescent=\"0.25\">"));
    }

    #[test]
    fn test_orphaned_shared_member_written_plain() {
        let mut ws = Worksheet::new("S");
        ws.set_cell_value_at(
            1,
            0,
            CellValue::Formula {
                text: "=B2".into(),
                cached_value: None,
                kind: FormulaKind::Shared {
                    index: 3,
                    range: None,
                },
            },
        )
        .unwrap();
        assert!(write_sheet_data(&ws, "", true).contains("<f>B2</f>"));
    }

    #[test]
    fn test_excel_escapes_round_trip_shape() {
        assert_eq!(encode_excel_escapes("a\u{1}b"), "a_x0001_b");
        assert_eq!(encode_excel_escapes("_x0041_"), "_x005F_x0041_");
        assert_eq!(encode_excel_escapes("plain_text"), "plain_text");
    }
}
