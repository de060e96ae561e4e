//! Common utilities for E2E tests.

use std::io::{Cursor, Read, Write};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Builds a template-like package
pub struct TemplateBuilder {
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
    with_calc_chain: bool,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            shared_strings: Vec::new(),
            with_calc_chain: true,
        }
    }

    /// Add a sheet; `sheet_data` is the inner XML of `<sheetData>`
    pub fn sheet(mut self, name: &str, sheet_data: &str) -> Self {
        self.sheets.push((name.to_string(), sheet_data.to_string()));
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn without_calc_chain(mut self) -> Self {
        self.with_calc_chain = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();

        let mut types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );
        for i in 0..self.sheets.len() {
            types.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }
        if self.with_calc_chain {
            types.push_str(r#"<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#);
        }
        types.push_str("</Types>");
        put(&mut zip, "[Content_Types].xml", &types);

        put(
            &mut zip,
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        );

        let mut workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{MAIN_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><bookViews><workbookView activeTab="0"/></bookViews><sheets>"#
        );
        for (i, (name, _)) in self.sheets.iter().enumerate() {
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                name.replace('&', "&amp;"),
                i + 1,
                i + 1
            ));
        }
        workbook.push_str(
            r#"</sheets><definedNames><definedName name="EF_TABLE">'EF Library'!$A$2:$D$40</definedName></definedNames><calcPr calcId="191029"/></workbook>"#,
        );
        put(&mut zip, "xl/workbook.xml", &workbook);

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for i in 0..self.sheets.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }
        let n = self.sheets.len();
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
            n + 1,
            n + 2
        ));
        if self.with_calc_chain {
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/>"#,
                n + 3
            ));
        }
        rels.push_str("</Relationships>");
        put(&mut zip, "xl/_rels/workbook.xml.rels", &rels);

        put(&mut zip, "xl/styles.xml", STYLES);

        let mut sst = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{MAIN_NS}" count="{0}" uniqueCount="{0}">"#,
            self.shared_strings.len()
        );
        for s in &self.shared_strings {
            sst.push_str(&format!("<si><t>{s}</t></si>"));
        }
        sst.push_str("</sst>");
        put(&mut zip, "xl/sharedStrings.xml", &sst);

        for (i, (_, data)) in self.sheets.iter().enumerate() {
            let sheet = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{MAIN_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac" mc:Ignorable="x14ac"><dimension ref="A1:Z200"/><sheetViews><sheetView workbookViewId="0"><pane ySplit="7" topLeftCell="A8" state="frozen"/></sheetView></sheetViews><cols><col min="3" max="3" width="32" customWidth="1"/></cols><sheetData>{data}</sheetData><mergeCells count="1"><mergeCell ref="B2:F2"/></mergeCells><dataValidations count="1"><dataValidation type="decimal" operator="greaterThanOrEqual" sqref="D8:O16"><formula1>0</formula1></dataValidation></dataValidations><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#
            );
            put(&mut zip, &format!("xl/worksheets/sheet{}.xml", i + 1), &sheet);
        }

        if self.with_calc_chain {
            put(
                &mut zip,
                "xl/calcChain.xml",
                &format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<calcChain xmlns="{MAIN_NS}"><c r="P8" i="1"/></calcChain>"#),
            );
        }

        zip.finish().unwrap().into_inner()
    }
}

const STYLES: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="#,##0.000"/></numFmts><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"##;

fn put<W: Write + std::io::Seek>(zip: &mut zip::ZipWriter<W>, name: &str, content: &str) {
    zip.start_file(name, zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(content.as_bytes()).unwrap();
}

/// Names of all parts in a package
pub fn part_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// Text of one part, if present
pub fn part_text(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    Some(text)
}

/// The fuel sheet most tests start from: labels via shared strings, a styled
/// input row and a row total formula
pub fn fuel_template() -> Vec<u8> {
    TemplateBuilder::new()
        .shared_strings(&["Fuel", "Diesel B7", "Total"])
        .sheet(
            "Fuel Stationary",
            r#"<row r="7" spans="1:16" x14ac:dyDescent="0.25"><c r="C7" t="s" s="2"><v>0</v></c><c r="P7" t="s" s="2"><v>2</v></c></row><row r="8" spans="1:16" ht="18" customHeight="1" x14ac:dyDescent="0.25"><c r="C8" t="s"><v>1</v></c><c r="D8" s="1"/><c r="E8" s="1"/><c r="F8" s="1"/><c r="P8" s="1"><f t="shared" ref="P8:P9" si="0">SUM(D8:O8)</f><v>0</v></c></row><row r="9"><c r="P9" s="1"><f t="shared" si="0"/><v>0</v></c></row>"#,
        )
        .sheet("EF Library", r#"<row r="2"><c r="A2" t="inlineStr"><is><t>DIESEL</t></is></c><c r="D2"><v>2.7406</v></c></row>"#)
        .build()
}
