//! Fresh writes read back through the reader.

use std::io::Cursor;

use pretty_assertions::assert_eq;
use vsheet_core::{CellValue, Workbook};
use vsheet_xlsx::{XlsxError, XlsxReader, XlsxWriter};

use crate::part_text;

fn write(workbook: &Workbook) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    XlsxWriter::write(workbook, &mut out).unwrap();
    out.into_inner()
}

#[test]
fn test_values_survive_fresh_write() {
    let mut wb = Workbook::with_sheets(["Scope3 Screening", "R&D"]).unwrap();
    let ws = wb.worksheet_by_name_mut("Scope3 Screening").unwrap();
    ws.set_cell_value("B10", "Purchased goods").unwrap();
    ws.set_cell_value("D10", 1250.5).unwrap();
    ws.set_cell_value("E10", true).unwrap();
    ws.set_cell_formula("H10", "D10*G10/1000").unwrap();
    ws.set_cell_value("C10", "  line one\nline two ").unwrap();

    let bytes = write(&wb);
    let back = XlsxReader::read(Cursor::new(bytes.clone())).unwrap();

    assert_eq!(back.sheet_names(), vec!["Scope3 Screening", "R&D"]);
    let ws = back.worksheet_by_name("Scope3 Screening").unwrap();
    assert_eq!(ws.get_value("B10").unwrap(), CellValue::string("Purchased goods"));
    assert_eq!(ws.get_value("D10").unwrap(), CellValue::Number(1250.5));
    assert_eq!(ws.get_value("E10").unwrap(), CellValue::Boolean(true));
    assert_eq!(ws.formula("H10").unwrap(), Some("=D10*G10/1000"));
    assert_eq!(
        ws.get_value("C10").unwrap(),
        CellValue::string("  line one\nline two ")
    );

    let workbook_xml = part_text(&bytes, "xl/workbook.xml").unwrap();
    assert!(workbook_xml.contains(r#"name="R&amp;D""#));
    assert!(workbook_xml.contains(r#"fullCalcOnLoad="1""#));
}

#[test]
fn test_fresh_write_rejects_empty_workbook() {
    let mut out = Cursor::new(Vec::new());
    assert!(matches!(
        XlsxWriter::write(&Workbook::empty(), &mut out),
        Err(XlsxError::EmptyWorkbook)
    ));
}

#[test]
fn test_control_characters_round_trip() {
    let mut wb = Workbook::with_sheets(["S"]).unwrap();
    let ws = wb.worksheet_mut(0).unwrap();
    ws.set_cell_value("A1", "bell\u{7}_x0041_").unwrap();

    let back = XlsxReader::read(Cursor::new(write(&wb))).unwrap();
    assert_eq!(
        back.worksheet(0).unwrap().get_value("A1").unwrap(),
        CellValue::string("bell\u{7}_x0041_")
    );
}
