//! Template-preserving write
//!
//! Parts are streamed through quick-xml and re-emitted unchanged except for:
//! - worksheet `<sheetData>` and `<dimension>`, regenerated from the model
//! - `xl/calcChain.xml`, dropped together with its content type override and
//!   relationship, since cell formulas may have moved
//! - `<calcPr>`, which gets `fullCalcOnLoad="1"` so consumers recalculate

use std::io::{Seek, Write};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::Writer;

use super::sheet_data::{dimension_ref, write_sheet_data};
use crate::error::{XlsxError, XlsxResult};
use crate::package::{
    Package, CALC_CHAIN_PART, CONTENT_TYPES_PART, WORKBOOK_PART, WORKBOOK_RELS_PART,
};
use vsheet_core::{Workbook, Worksheet};

/// Children of `<workbook>` that must come after `<calcPr>`
const AFTER_CALC_PR: &[&[u8]] = &[
    b"oleSize",
    b"customWorkbookViews",
    b"pivotCaches",
    b"smartTagPr",
    b"smartTagTypes",
    b"webPublishing",
    b"fileRecoveryPr",
    b"webPublishObjects",
    b"extLst",
];

/// Write `workbook` into a copy of `package`
pub(crate) fn write_patched<W: Write + Seek>(
    package: &Package,
    workbook: &Workbook,
    writer: W,
) -> XlsxResult<()> {
    for ws in workbook.worksheets() {
        if package.sheet_path(ws.name()).is_none() {
            return Err(XlsxError::UnknownSheet(ws.name().to_string()));
        }
    }

    let mut zip = zip::ZipWriter::new(writer);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, data) in package.parts() {
        let patched = match name {
            CALC_CHAIN_PART => {
                log::debug!("dropping {name}");
                continue;
            }
            CONTENT_TYPES_PART => drop_elements(data, |e| {
                e.local_name().as_ref() == b"Override"
                    && attr_value(e, b"PartName").as_deref() == Some("/xl/calcChain.xml")
            })?,
            WORKBOOK_RELS_PART => drop_elements(data, |e| {
                e.local_name().as_ref() == b"Relationship"
                    && attr_value(e, b"Type").is_some_and(|t| t.ends_with("/calcChain"))
            })?,
            WORKBOOK_PART => patch_workbook_xml(data)?,
            _ => match sheet_for_part(package, workbook, name) {
                Some(sheet) => patch_worksheet(data, sheet)?,
                None => data.to_vec(),
            },
        };

        zip.start_file(name, options)?;
        zip.write_all(&patched)?;
    }

    zip.finish()?;
    Ok(())
}

fn sheet_for_part<'a>(package: &Package, workbook: &'a Workbook, part: &str) -> Option<&'a Worksheet> {
    package
        .sheets()
        .iter()
        .find(|s| s.path == part)
        .and_then(|s| workbook.worksheet_by_name(&s.name))
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `"x:"` for `x:sheetData`, `""` for `sheetData`
fn element_prefix(qualified: &[u8]) -> String {
    match qualified.iter().position(|&b| b == b':') {
        Some(pos) => format!("{}:", String::from_utf8_lossy(&qualified[..pos])),
        None => String::new(),
    }
}

/// Replace `<sheetData>` and `<dimension>`, copy everything else
pub(crate) fn patch_worksheet(data: &[u8], sheet: &Worksheet) -> XlsxResult<Vec<u8>> {
    let mut reader = Reader::from_reader(data);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(data.len()));

    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut replaced = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                let prefix = element_prefix(e.name().as_ref());
                let end = e.to_end().into_owned();
                reader.read_to_end_into(end.name(), &mut skip_buf)?;
                skip_buf.clear();
                writer
                    .get_mut()
                    .extend_from_slice(write_sheet_data(sheet, &prefix, true).as_bytes());
                replaced = true;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                let prefix = element_prefix(e.name().as_ref());
                writer
                    .get_mut()
                    .extend_from_slice(write_sheet_data(sheet, &prefix, true).as_bytes());
                replaced = true;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"dimension" => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut dimension = BytesStart::new(name);
                dimension.push_attribute(("ref", dimension_ref(sheet).as_str()));
                writer.write_event(Event::Empty(dimension))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    if !replaced {
        return Err(XlsxError::MissingSheetData(sheet.name().to_string()));
    }
    Ok(writer.into_inner())
}

/// Build `<calcPr>` keeping the template's attributes, forcing a full recalc
fn calc_pr(name: &str, existing: Option<&BytesStart<'_>>) -> BytesStart<'static> {
    let mut calc = BytesStart::new(name.to_string());
    if let Some(existing) = existing {
        for attr in existing.attributes().flatten() {
            if attr.key.as_ref() != b"fullCalcOnLoad" {
                calc.push_attribute(attr);
            }
        }
    }
    calc.push_attribute(("fullCalcOnLoad", "1"));
    calc
}

/// Force `fullCalcOnLoad="1"` in workbook.xml, inserting `<calcPr>` if absent
pub(crate) fn patch_workbook_xml(data: &[u8]) -> XlsxResult<Vec<u8>> {
    let mut reader = Reader::from_reader(data);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(data.len() + 64));

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut prefix = String::new();
    let mut done = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if depth == 0 {
                    prefix = element_prefix(e.name().as_ref());
                } else if depth == 1 && !done {
                    let local = e.local_name();
                    if local.as_ref() == b"calcPr" {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        writer.write_event(Event::Start(calc_pr(&name, Some(&e))))?;
                        done = true;
                        depth += 1;
                        buf.clear();
                        continue;
                    }
                    if AFTER_CALC_PR.contains(&local.as_ref()) {
                        let name = format!("{prefix}calcPr");
                        writer.write_event(Event::Empty(calc_pr(&name, None)))?;
                        done = true;
                    }
                }
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if depth == 1 && !done {
                    let local = e.local_name();
                    if local.as_ref() == b"calcPr" {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        writer.write_event(Event::Empty(calc_pr(&name, Some(&e))))?;
                        done = true;
                        buf.clear();
                        continue;
                    }
                    if AFTER_CALC_PR.contains(&local.as_ref()) {
                        let name = format!("{prefix}calcPr");
                        writer.write_event(Event::Empty(calc_pr(&name, None)))?;
                        done = true;
                    }
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 && !done {
                    let name = format!("{prefix}calcPr");
                    writer.write_event(Event::Empty(calc_pr(&name, None)))?;
                    done = true;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

/// Copy an XML part, leaving out the empty elements matching `reject`
fn drop_elements<F>(data: &[u8], reject: F) -> XlsxResult<Vec<u8>>
where
    F: Fn(&BytesStart<'_>) -> bool,
{
    let mut reader = Reader::from_reader(data);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(data.len()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) if reject(&e) => {}
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}
