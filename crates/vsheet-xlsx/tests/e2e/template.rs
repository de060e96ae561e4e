//! Template-preserving saves.

use pretty_assertions::assert_eq;
use vsheet_core::{CellValue, FormulaKind};
use vsheet_xlsx::{XlsxDocument, XlsxError};

use crate::{fuel_template, part_names, part_text, TemplateBuilder};

#[test]
fn test_reads_template_cells() {
    let doc = XlsxDocument::from_bytes(&fuel_template()).unwrap();
    assert_eq!(doc.sheet_names(), vec!["Fuel Stationary", "EF Library"]);

    let ws = doc.worksheet("Fuel Stationary").unwrap();
    assert_eq!(ws.get_value("C8").unwrap(), CellValue::string("Diesel B7"));
    assert_eq!(ws.cell_at(7, 3).map(|c| c.style), Some(1));
    assert_eq!(ws.formula("P9").unwrap(), Some("=SUM(D9:O9)"));
    assert_eq!(ws.row_props(7).and_then(|p| p.get("ht")), Some("18"));

    let ef = doc.worksheet("EF Library").unwrap();
    assert_eq!(ef.get_value("D2").unwrap().as_number(), Some(2.7406));
}

#[test]
fn test_untouched_parts_are_byte_identical() {
    let original = fuel_template();
    let mut doc = XlsxDocument::from_bytes(&original).unwrap();
    doc.worksheet_mut("Fuel Stationary")
        .unwrap()
        .set_cell_value("D8", 10.0)
        .unwrap();
    let saved = doc.to_bytes().unwrap();

    for part in ["xl/styles.xml", "xl/sharedStrings.xml", "_rels/.rels"] {
        assert_eq!(part_text(&saved, part), part_text(&original, part), "{part}");
    }
    // Sheets the edit did not touch are regenerated to the same content
    let ef = part_text(&saved, "xl/worksheets/sheet2.xml").unwrap();
    assert!(ef.contains(r#"<c r="D2"><v>2.7406</v></c>"#), "{ef}");
}

#[test]
fn test_edit_keeps_sheet_structure_and_styles() {
    let mut doc = XlsxDocument::from_bytes(&fuel_template()).unwrap();
    let ws = doc.worksheet_mut("Fuel Stationary").unwrap();
    ws.set_cell_value("D8", 10.0).unwrap();
    ws.set_cell_value("F8", 5.0).unwrap();
    let saved = doc.to_bytes().unwrap();

    let sheet = part_text(&saved, "xl/worksheets/sheet1.xml").unwrap();
    assert!(sheet.contains(r#"<c r="D8" s="1"><v>10</v></c>"#), "{sheet}");
    assert!(sheet.contains(r#"<c r="E8" s="1"/>"#));
    assert!(sheet.contains(r#"<row r="8" ht="18" customHeight="1" x14ac:dyDescent="0.25">"#));
    assert!(sheet.contains(r#"<f t="shared" ref="P8:P9" si="0">SUM(D8:O8)</f>"#));
    assert!(sheet.contains(r#"<f t="shared" si="0"/>"#));
    assert!(sheet.contains(r#"<pane ySplit="7" topLeftCell="A8" state="frozen"/>"#));
    assert!(sheet.contains(r#"<dataValidation type="decimal""#));
    assert!(sheet.contains(r#"<mergeCell ref="B2:F2"/>"#));
    assert!(sheet.contains(r#"<dimension ref="C7:P9"/>"#), "{sheet}");

    let reopened = XlsxDocument::from_bytes(&saved).unwrap();
    let ws = reopened.worksheet("Fuel Stationary").unwrap();
    assert_eq!(ws.get_value("D8").unwrap(), CellValue::Number(10.0));
    assert_eq!(ws.get_value("F8").unwrap(), CellValue::Number(5.0));
    assert_eq!(ws.formula("P9").unwrap(), Some("=SUM(D9:O9)"));
}

#[test]
fn test_overwritten_anchor_releases_group() {
    let mut doc = XlsxDocument::from_bytes(&fuel_template()).unwrap();
    let ws = doc.worksheet_mut("Fuel Stationary").unwrap();
    ws.set_cell_formula("P8", "SUM(D8:F8)").unwrap();
    let saved = doc.to_bytes().unwrap();

    let sheet = part_text(&saved, "xl/worksheets/sheet1.xml").unwrap();
    assert!(!sheet.contains(r#"t="shared""#), "{sheet}");
    assert!(sheet.contains("<f>SUM(D9:O9)</f>"));

    let reopened = XlsxDocument::from_bytes(&saved).unwrap();
    let ws = reopened.worksheet("Fuel Stationary").unwrap();
    assert_eq!(ws.formula("P8").unwrap(), Some("=SUM(D8:F8)"));
    match ws.get_value("P9").unwrap() {
        CellValue::Formula { kind, .. } => assert_eq!(kind, FormulaKind::Normal),
        other => panic!("expected formula, got {other:?}"),
    }
}

#[test]
fn test_calc_chain_dropped_and_recalc_forced() {
    let saved = XlsxDocument::from_bytes(&fuel_template())
        .unwrap()
        .to_bytes()
        .unwrap();

    assert!(!part_names(&saved).iter().any(|p| p == "xl/calcChain.xml"));
    let types = part_text(&saved, "[Content_Types].xml").unwrap();
    assert!(!types.contains("calcChain"));
    let rels = part_text(&saved, "xl/_rels/workbook.xml.rels").unwrap();
    assert!(!rels.contains("calcChain"));
    assert!(rels.contains("sharedStrings.xml"));

    let workbook = part_text(&saved, "xl/workbook.xml").unwrap();
    assert!(workbook.contains(r#"<calcPr calcId="191029" fullCalcOnLoad="1"/>"#));
    assert!(workbook.contains(r#"<definedName name="EF_TABLE">'EF Library'!$A$2:$D$40</definedName>"#));
}

#[test]
fn test_package_without_calc_chain() {
    let bytes = TemplateBuilder::new()
        .without_calc_chain()
        .sheet("Only", r#"<row r="1"><c r="A1"><v>1</v></c></row>"#)
        .build();
    let doc = XlsxDocument::from_bytes(&bytes).unwrap();
    let saved = doc.to_bytes().unwrap();
    assert_eq!(part_names(&saved).len(), part_names(&bytes).len());
}

#[test]
fn test_save_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filled.xlsx");

    let mut doc = XlsxDocument::from_bytes(&fuel_template()).unwrap();
    doc.worksheet_mut("Fuel Stationary")
        .unwrap()
        .set_cell_value("D8", 42.0)
        .unwrap();
    doc.save(&path).unwrap();

    let reopened = XlsxDocument::open(&path).unwrap();
    assert_eq!(
        reopened
            .worksheet("Fuel Stationary")
            .unwrap()
            .get_value("D8")
            .unwrap(),
        CellValue::Number(42.0)
    );
}

#[test]
fn test_rejects_non_xlsx() {
    assert!(matches!(
        XlsxDocument::from_bytes(b"not a zip"),
        Err(XlsxError::Zip(_))
    ));
}

#[test]
fn test_rejects_zip_without_content_types() {
    use std::io::{Cursor, Write};

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("notes.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"fuel log").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    match XlsxDocument::from_bytes(&bytes) {
        Err(XlsxError::NotAWorkbook(msg)) => assert!(msg.contains("[Content_Types].xml")),
        other => panic!("unexpected result {other:?}"),
    }
}
