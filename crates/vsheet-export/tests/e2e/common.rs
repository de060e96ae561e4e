//! Common utilities for E2E tests.

use std::collections::BTreeMap;
use std::io::Cursor;

use vsheet_core::Workbook;
use vsheet_export::{
    build_significance_rows, derive_inventory, standard_spec, Assessment, CanonicalCycleData,
    ExportJob, ExportReport, Exporter, InventoryEntry, MemorySink, SavedAssessment,
    StandardAdapter,
};
use vsheet_xlsx::{XlsxReader, XlsxWriter};

pub const OUTPUT: &str = "vsheet-2024.xlsx";

pub const SHEETS: [&str; 7] = [
    "Fuel Stationary",
    "Fuel Mobile",
    "Refrigerant",
    "EF Library",
    "Scope3 Screening",
    "Scope3 Significance",
    "Scope3 Summary",
];

/// The standard template with its formulas and some stale input left over
/// from an earlier export
pub fn standard_template() -> Workbook {
    standard_template_with(&SHEETS)
}

pub fn standard_template_with(sheets: &[&str]) -> Workbook {
    let mut wb = Workbook::with_sheets(sheets).unwrap();

    if let Some(ws) = wb.worksheet_by_name_mut("Fuel Stationary") {
        for (row, label) in [(8, "Diesel B7"), (9, "LPG"), (10, "Natural gas"), (11, "Fuel oil")] {
            ws.set_cell_value(&format!("C{row}"), label).unwrap();
        }
        for row in 8..=16 {
            ws.set_cell_formula(&format!("P{row}"), &format!("=SUM(D{row}:O{row})"))
                .unwrap();
        }
        ws.set_cell_formula("P18", "=SUM(P8:P16)").unwrap();
        // stale values from a previous export
        ws.set_cell_value("E8", 99.0).unwrap();
        ws.set_cell_value("C15", "Old fuel").unwrap();
        ws.set_cell_value("D15", 7.0).unwrap();
    }
    if let Some(ws) = wb.worksheet_by_name_mut("Fuel Mobile") {
        for row in 8..=14 {
            ws.set_cell_formula(&format!("P{row}"), &format!("=SUM(D{row}:O{row})"))
                .unwrap();
        }
    }
    if let Some(ws) = wb.worksheet_by_name_mut("Refrigerant") {
        for row in 8..=17 {
            ws.set_cell_formula(&format!("P{row}"), &format!("=SUM(D{row}:O{row})"))
                .unwrap();
        }
    }
    if let Some(ws) = wb.worksheet_by_name_mut("EF Library") {
        ws.set_cell_value("A1", "Fuel").unwrap();
        ws.set_cell_value("D1", "kgCO2e/unit").unwrap();
        ws.set_cell_value("A2", "Diesel B7").unwrap();
        ws.set_cell_value("D2", 2.7406).unwrap();
    }
    if let Some(ws) = wb.worksheet_by_name_mut("Scope3 Screening") {
        ws.set_cell_formula("H122", "=SUM(H10:H120)").unwrap();
        ws.set_cell_value("B60", "stale row").unwrap();
    }
    if let Some(ws) = wb.worksheet_by_name_mut("Scope3 Significance") {
        ws.set_cell_value("B30", "stale").unwrap();
    }
    if let Some(ws) = wb.worksheet_by_name_mut("Scope3 Summary") {
        ws.set_cell_value("B8", "old top").unwrap();
        ws.set_cell_value("B11", "stale").unwrap();
    }
    wb
}

pub fn to_bytes(wb: &Workbook) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    XlsxWriter::write(wb, &mut out).unwrap();
    out.into_inner()
}

pub fn read_back(bytes: &[u8]) -> Workbook {
    XlsxReader::read(Cursor::new(bytes)).unwrap()
}

pub fn entry(id: &str, scope: u8, sub_scope: &str, label: &str) -> InventoryEntry {
    InventoryEntry {
        id: id.into(),
        scope,
        sub_scope: sub_scope.into(),
        item_label: label.into(),
        ..Default::default()
    }
}

pub fn months(values: &[f64]) -> Option<Vec<Option<f64>>> {
    Some(values.iter().map(|v| Some(*v)).collect())
}

/// Diesel with months [10, 0, 5, 0, ...], one slotted pellet row and three
/// scope-3 items, two of them significant
pub fn sample_entries() -> Vec<InventoryEntry> {
    let mut diesel = entry("d", 1, "1.1", "Diesel B7");
    diesel.fuel_key = Some("diesel_b7_stationary".into());
    diesel.unit = "L".into();
    diesel.monthly = months(&[10.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

    let mut pellets = entry("p", 1, "1.1", "Wood pellets");
    pellets.fuel_key = Some("PELLETS".into());
    pellets.monthly = months(&[1.0, 2.0]);

    let mut paper = entry("s1", 3, "3.1", "Paper");
    paper.category_label = "Purchased goods".into();
    paper.unit = "kg".into();
    paper.quantity_per_year = Some(1000.0);
    paper.ef = Some(2.0);
    paper.evidence_refs = vec!["inv-1".into(), "inv-2".into()];

    let mut commuting = entry("s2", 3, "3.10", "Commuting");
    commuting.category_label = "Employee commuting".into();
    commuting.unit = "km".into();
    commuting.quantity_per_year = Some(1500.0);
    commuting.ef = Some(4.0);

    let mut capital = entry("s3", 3, "3.2", "Capital goods");
    capital.category_label = "Capital goods".into();
    capital.unit = "t".into();
    capital.quantity_per_year = Some(10.0);
    capital.ef = Some(100.0);

    vec![diesel, pellets, paper, commuting, capital]
}

pub fn sample_assessments() -> BTreeMap<String, SavedAssessment> {
    let mut saved = BTreeMap::new();
    for (key, assessment) in [
        ("3.1|Paper", Assessment::Significant),
        ("3.10|Commuting", Assessment::Significant),
        ("3.2|Capital goods", Assessment::NotSignificant),
    ] {
        saved.insert(
            key.to_string(),
            SavedAssessment {
                assessment,
                selection: String::new(),
            },
        );
    }
    saved
}

pub fn cycle_data(entries: &[InventoryEntry]) -> CanonicalCycleData {
    let inventory = derive_inventory(entries);
    let significance = build_significance_rows(&inventory, &sample_assessments());
    CanonicalCycleData {
        cycle_id: "2024".into(),
        inventory,
        significance,
        ..Default::default()
    }
}

/// Export with the built-in spec and adapter; returns the report and the
/// saved workbook
pub fn export_standard(template: &Workbook, data: &CanonicalCycleData) -> (ExportReport, Workbook) {
    let spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let exporter = Exporter::new(MemorySink::new());
    let job = ExportJob::new(&spec, &adapter, data, OUTPUT).requiring_spec_sheets();
    let report = exporter.export(&to_bytes(template), job).unwrap();
    let saved = exporter.sink().get(OUTPUT).expect("output saved");
    (report, read_back(&saved))
}
