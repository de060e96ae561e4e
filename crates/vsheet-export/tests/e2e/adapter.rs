//! The standard adapter's writes, inspected after a full export.

use pretty_assertions::assert_eq;
use vsheet_core::CellValue;
use vsheet_export::{
    export_document, standard_spec, CompanyAdapter, ExportError, ExportJob, StandardAdapter,
    StandardLayout,
};

use crate::{cycle_data, entry, export_standard, months, sample_entries, standard_template};

#[test]
fn test_slot_rows() {
    let (_, wb) = export_standard(&standard_template(), &cycle_data(&sample_entries()));
    let ws = wb.worksheet_by_name("Fuel Stationary").unwrap();
    assert_eq!(ws.get_value("C12").unwrap(), CellValue::string("Wood pellets"));
    assert_eq!(ws.get_value("D12").unwrap(), CellValue::Number(1.0));
    assert_eq!(ws.get_value("E12").unwrap(), CellValue::Number(2.0));
    assert_eq!(ws.get_value("C13").unwrap(), CellValue::Empty);
}

#[test]
fn test_screening_rows() {
    let (_, wb) = export_standard(&standard_template(), &cycle_data(&sample_entries()));
    let ws = wb.worksheet_by_name("Scope3 Screening").unwrap();

    let labels: Vec<String> = (10..=15)
        .map(|row| ws.get_value(&format!("B{row}")).unwrap().to_string())
        .collect();
    assert_eq!(
        labels,
        vec![
            "3.1 Purchased goods",
            "Paper",
            "3.2 Capital goods",
            "Capital goods",
            "3.10 Employee commuting",
            "Commuting",
        ]
    );
    assert_eq!(ws.get_value("C11").unwrap(), CellValue::string("kg"));
    assert_eq!(ws.get_value("D11").unwrap(), CellValue::Number(1000.0));
    assert_eq!(ws.get_value("F11").unwrap(), CellValue::string("inv-1, inv-2"));
    assert_eq!(ws.get_value("G11").unwrap(), CellValue::Number(2.0));
    assert_eq!(ws.formula("H11").unwrap(), Some("=D11*G11/1000"));
    assert_eq!(ws.formula("I11").unwrap(), Some("=IF($H$122=0,0,H11/$H$122*100)"));
    assert_eq!(ws.get_value("J11").unwrap(), CellValue::string("3.1"));
    assert!(ws.formula("H10").unwrap().is_none());
}

#[test]
fn test_trace_chain() {
    let (report, wb) = export_standard(&standard_template(), &cycle_data(&sample_entries()));

    let significance = wb.worksheet_by_name("Scope3 Significance").unwrap();
    assert_eq!(significance.get_value("B10").unwrap(), CellValue::string("3.1 Purchased goods"));
    assert_eq!(significance.formula("B11").unwrap(), Some("='Scope3 Screening'!B11"));
    assert_eq!(significance.formula("C11").unwrap(), Some("='Scope3 Screening'!H11"));
    assert_eq!(significance.formula("D11").unwrap(), Some("='Scope3 Screening'!I11"));
    assert_eq!(significance.get_value("E11").unwrap(), CellValue::string("significant"));
    assert_eq!(significance.get_value("E13").unwrap(), CellValue::string("not significant"));
    assert_eq!(significance.formula("B15").unwrap(), Some("='Scope3 Screening'!B15"));
    assert_eq!(significance.get_value("B30").unwrap(), CellValue::Empty);

    // top selection: commuting (6 t) before paper (2 t); capital goods is
    // not significant
    let summary = wb.worksheet_by_name("Scope3 Summary").unwrap();
    assert_eq!(summary.formula("B8").unwrap(), Some("='Scope3 Significance'!B15"));
    assert_eq!(summary.formula("C8").unwrap(), Some("='Scope3 Significance'!C15"));
    assert_eq!(summary.formula("B9").unwrap(), Some("='Scope3 Significance'!B11"));
    assert_eq!(summary.get_value("B10").unwrap(), CellValue::Empty);
    assert_eq!(summary.get_value("B11").unwrap(), CellValue::Empty);

    assert!(report.notes.is_empty(), "{:?}", report.notes);
}

#[test]
fn test_significance_falls_back_to_literals_without_screening() {
    let mut spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let data = cycle_data(&sample_entries());
    let mut wb = standard_template();
    // screening sheet absent: that stage is skipped, the next writes values
    spec.sheets.insert("scope3Screening".into(), "Missing Sheet".into());

    let report = export_document(&mut wb, ExportJob::new(&spec, &adapter, &data, "x.xlsx")).unwrap();
    assert!(report.notes.iter().any(|n| n.contains("Missing Sheet")), "{:?}", report.notes);

    let significance = wb.worksheet_by_name("Scope3 Significance").unwrap();
    assert!(significance.formula("B11").unwrap().is_none());
    assert_eq!(significance.get_value("B11").unwrap(), CellValue::string("Paper"));
    assert_eq!(significance.get_value("C11").unwrap(), CellValue::Number(2.0));
    // summary still links to the significance sheet
    let summary = wb.worksheet_by_name("Scope3 Summary").unwrap();
    assert_eq!(summary.formula("B8").unwrap(), Some("='Scope3 Significance'!B15"));
}

#[test]
fn test_input_formula_cells_are_protected() {
    let spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let mut lpg = entry("l", 1, "1.1", "LPG");
    lpg.fuel_key = Some("LPG_STATIONARY".into());
    lpg.monthly = months(&[3.0, 4.0]);
    let data = cycle_data(&[lpg]);

    let mut wb = standard_template();
    wb.worksheet_by_name_mut("Fuel Stationary")
        .unwrap()
        .set_cell_formula("E9", "=D9*2")
        .unwrap();

    let report = export_document(&mut wb, ExportJob::new(&spec, &adapter, &data, "x.xlsx")).unwrap();
    let ws = wb.worksheet_by_name("Fuel Stationary").unwrap();
    assert_eq!(ws.get_value("D9").unwrap(), CellValue::Number(3.0));
    assert_eq!(ws.formula("E9").unwrap(), Some("=D9*2"));
    assert!(
        report.notes.iter().any(|n| n.contains("formula cell")),
        "{:?}",
        report.notes
    );
}

#[test]
fn test_slot_overflow_is_noted() {
    let spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let entries: Vec<_> = (0..7)
        .map(|i| {
            let mut e = entry(&format!("m{i}"), 1, "1.2", &format!("Vehicle {i}"));
            e.monthly = months(&[1.0]);
            e
        })
        .collect();
    let data = cycle_data(&entries);
    let mut wb = standard_template();

    let report = export_document(&mut wb, ExportJob::new(&spec, &adapter, &data, "x.xlsx")).unwrap();
    let ws = wb.worksheet_by_name("Fuel Mobile").unwrap();
    assert_eq!(ws.get_value("C11").unwrap(), CellValue::string("Vehicle 0"));
    assert_eq!(ws.get_value("C14").unwrap(), CellValue::string("Vehicle 3"));
    assert!(report.notes.iter().any(|n| n.contains("3 item(s)")), "{:?}", report.notes);
}

#[test]
fn test_standard_adapter_support() {
    let adapter = StandardAdapter::default().also_supporting("acme-2025");
    assert!(adapter.supports("vsheet-standard"));
    assert!(adapter.supports("acme-2025"));
    assert!(!adapter.supports("vsheet-standard::fy"));
}

#[test]
fn test_invalid_layout_rows_are_rejected() {
    let spec = standard_spec().unwrap();
    let mut layout = StandardLayout::default();
    layout.monthly[0].fixed_rows[0].row = 0;
    let adapter = StandardAdapter::new(layout);
    assert!(adapter.claimed_regions(&spec).iter().all(|c| c.sheet != "Fuel Stationary"));

    let data = cycle_data(&sample_entries());
    let mut wb = standard_template();
    let err = export_document(&mut wb, ExportJob::new(&spec, &adapter, &data, "x.xlsx"))
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidSpec(_)), "{err:?}");
}

#[test]
fn test_total_cell_inside_screening_block_is_rejected() {
    let spec = standard_spec().unwrap();
    let mut layout = StandardLayout::default();
    layout.screening.total_cell = "H50".into();
    let adapter = StandardAdapter::new(layout);

    let data = cycle_data(&sample_entries());
    let mut wb = standard_template();
    let err = export_document(&mut wb, ExportJob::new(&spec, &adapter, &data, "x.xlsx"))
        .unwrap_err();
    assert!(matches!(&err, ExportError::InvalidSpec(msg) if msg.contains("H50")), "{err:?}");
}
