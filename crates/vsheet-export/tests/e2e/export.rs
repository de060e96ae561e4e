//! Full exports through the engine.

use pretty_assertions::assert_eq;
use vsheet_core::CellValue;
use vsheet_export::{
    standard_spec, ExportError, ExportJob, Exporter, FeatureOverrides, FileTemplateSource,
    MemorySink, StandardAdapter,
};

use crate::{
    cycle_data, export_standard, read_back, sample_entries, standard_template,
    standard_template_with, to_bytes, OUTPUT,
};

#[test]
fn test_diesel_months_zero_is_empty() {
    let (report, wb) = export_standard(&standard_template(), &cycle_data(&sample_entries()));
    let ws = wb.worksheet_by_name("Fuel Stationary").unwrap();

    assert_eq!(ws.get_value("D8").unwrap(), CellValue::Number(10.0));
    assert_eq!(ws.get_value("E8").unwrap(), CellValue::Empty);
    assert_eq!(ws.get_value("F8").unwrap(), CellValue::Number(5.0));
    for col in ["G", "H", "I", "J", "K", "L", "M", "N", "O"] {
        assert_eq!(ws.get_value(&format!("{col}8")).unwrap(), CellValue::Empty, "{col}8");
    }
    assert!(report.is_ok(), "{:?}", report.validations);
}

#[test]
fn test_untouched_formulas_survive() {
    let (_, wb) = export_standard(&standard_template(), &cycle_data(&sample_entries()));
    let ws = wb.worksheet_by_name("Fuel Stationary").unwrap();
    assert_eq!(ws.formula("P18").unwrap(), Some("=SUM(P8:P16)"));
    for row in 8..=16 {
        assert_eq!(
            ws.formula(&format!("P{row}")).unwrap().map(str::to_string),
            Some(format!("=SUM(D{row}:O{row})"))
        );
    }
    let screening = wb.worksheet_by_name("Scope3 Screening").unwrap();
    assert_eq!(screening.formula("H122").unwrap(), Some("=SUM(H10:H120)"));
}

#[test]
fn test_declarative_sections_use_legacy_dialect_by_default() {
    let (_, wb) = export_standard(&standard_template(), &cycle_data(&sample_entries()));
    let ws = wb.worksheet_by_name("Fuel Stationary").unwrap();
    assert_eq!(
        ws.formula("Q8").unwrap(),
        Some("=IFERROR(INDEX('EF Library'!$D:$D,MATCH(C8,'EF Library'!$A:$A,0)),\"\")")
    );
    assert_eq!(ws.formula("R16").unwrap(), Some("=P16*Q16/1000"));
    assert!(ws.formula("Q17").unwrap().is_none());

    let summary = wb.worksheet_by_name("Scope3 Summary").unwrap();
    assert_eq!(
        summary.formula("D12").unwrap(),
        Some("=IF(SUM($C$8:$C$12)=0,0,C12/SUM($C$8:$C$12)*100)")
    );
}

#[test]
fn test_feature_override_selects_modern_dialect() {
    let spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let data = cycle_data(&sample_entries());
    let mut overrides = FeatureOverrides::default();
    assert!(overrides.set("dynamicArray", true));

    let exporter = Exporter::new(MemorySink::new());
    let job = ExportJob::new(&spec, &adapter, &data, OUTPUT).with_feature_overrides(overrides);
    exporter.export(&to_bytes(&standard_template()), job).unwrap();

    let wb = read_back(&exporter.sink().get(OUTPUT).unwrap());
    let ws = wb.worksheet_by_name("Fuel Mobile").unwrap();
    assert_eq!(
        ws.formula("Q14").unwrap(),
        Some("=XLOOKUP(C14,'EF Library'!$A:$A,'EF Library'!$D:$D,\"\")")
    );
}

#[test]
fn test_missing_required_sheet_rejected_before_writing() {
    let sheets = [
        "Fuel Stationary",
        "Fuel Mobile",
        "Refrigerant",
        "EF Library",
        "Scope3 Screening",
        "Scope3 Significance",
    ];
    let spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let data = cycle_data(&sample_entries());
    let exporter = Exporter::new(MemorySink::new());
    let job = ExportJob::new(&spec, &adapter, &data, OUTPUT).requiring_spec_sheets();

    let err = exporter
        .export(&to_bytes(&standard_template_with(&sheets)), job)
        .unwrap_err();
    match &err {
        ExportError::MissingSheets(missing) => assert_eq!(missing, &vec!["Scope3 Summary"]),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("Scope3 Summary"));
    assert!(exporter.sink().names().is_empty());
}

#[test]
fn test_section_sheet_missing_without_required_check() {
    let spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let data = cycle_data(&sample_entries());
    let exporter = Exporter::new(MemorySink::new());
    let template = standard_template_with(&["Fuel Stationary", "EF Library"]);

    let err = exporter
        .export(&to_bytes(&template), ExportJob::new(&spec, &adapter, &data, OUTPUT))
        .unwrap_err();
    assert!(
        matches!(&err, ExportError::SectionSheetMissing { sheet, .. } if sheet == "Fuel Mobile"),
        "{err:?}"
    );
}

#[test]
fn test_validation_failures_do_not_block_save() {
    let mut template = standard_template();
    template
        .worksheet_by_name_mut("Fuel Stationary")
        .unwrap()
        .clear_cell("P16")
        .unwrap();

    let (report, wb) = export_standard(&template, &cycle_data(&sample_entries()));
    assert!(!report.is_ok());
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "fuelStationaryMonthTotals");
    assert_eq!(failures[0].cells, vec!["P16"]);
    assert!(wb.worksheet_by_name("Fuel Stationary").is_some());

    let skipped = report
        .validations
        .iter()
        .find(|v| v.id == "summaryNumberFormat")
        .unwrap();
    assert!(skipped.passed);
}

#[test]
fn test_template_errors() {
    let spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let data = cycle_data(&[]);
    let exporter = Exporter::new(MemorySink::new());

    let err = exporter
        .export(b"not a zip", ExportJob::new(&spec, &adapter, &data, OUTPUT))
        .unwrap_err();
    assert!(matches!(err, ExportError::TemplateParse(_)), "{err:?}");

    let dir = tempfile::tempdir().unwrap();
    let source = FileTemplateSource::new(dir.path());
    let err = exporter
        .export_from_source(&source, "missing.xlsx", ExportJob::new(&spec, &adapter, &data, OUTPUT))
        .unwrap_err();
    assert!(
        matches!(&err, ExportError::TemplateFetch { locator, .. } if locator == "missing.xlsx"),
        "{err:?}"
    );
}

#[test]
fn test_export_from_file_source() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("standard.xlsx"), to_bytes(&standard_template())).unwrap();

    let spec = standard_spec().unwrap();
    let adapter = StandardAdapter::default();
    let data = cycle_data(&sample_entries());
    let exporter = Exporter::new(MemorySink::new());
    let report = exporter
        .export_from_source(
            &FileTemplateSource::new(dir.path()),
            "standard.xlsx",
            ExportJob::new(&spec, &adapter, &data, OUTPUT),
        )
        .unwrap();
    assert_eq!(report.template_id, "vsheet-standard");
    assert_eq!(exporter.sink().names(), vec![OUTPUT]);
}

#[test]
fn test_empty_cycle_clears_stale_input() {
    let (report, wb) = export_standard(&standard_template(), &cycle_data(&[]));
    let fuel = wb.worksheet_by_name("Fuel Stationary").unwrap();
    assert_eq!(fuel.get_value("E8").unwrap(), CellValue::Empty);
    assert_eq!(fuel.get_value("C15").unwrap(), CellValue::Empty);
    assert_eq!(fuel.get_value("D15").unwrap(), CellValue::Empty);
    // fixed labels belong to the template
    assert_eq!(fuel.get_value("C8").unwrap(), CellValue::string("Diesel B7"));

    let screening = wb.worksheet_by_name("Scope3 Screening").unwrap();
    assert_eq!(screening.get_value("B60").unwrap(), CellValue::Empty);
    let summary = wb.worksheet_by_name("Scope3 Summary").unwrap();
    assert_eq!(summary.get_value("B8").unwrap(), CellValue::Empty);
    assert!(report.is_ok());
}
