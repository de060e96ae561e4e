//! In-memory view of an XLSX (OPC) package
//!
//! Every zip entry is kept as raw bytes, in archive order, so parts this crate
//! does not understand (drawings, printer settings, custom XML, ...) can be
//! written back untouched.

use std::io::{Read, Seek};

use crate::error::{XlsxError, XlsxResult};
use crate::reader::{read_workbook_rels, read_workbook_xml};

/// Path of the workbook part
pub const WORKBOOK_PART: &str = "xl/workbook.xml";
/// Path of the workbook relationships part
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
/// Path of the content types part
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
/// Path of the shared strings part
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
/// Path of the calculation chain part
pub const CALC_CHAIN_PART: &str = "xl/calcChain.xml";

/// A worksheet entry of the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPart {
    /// Sheet name as shown in the tab
    pub name: String,
    /// Zip path of the worksheet part, e.g. `xl/worksheets/sheet1.xml`
    pub path: String,
}

/// Raw package contents
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
    sheets: Vec<SheetPart>,
}

impl Package {
    /// Load every part of a zip archive into memory
    pub fn from_reader<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push((name, data));
        }

        let mut package = Self {
            parts,
            sheets: Vec::new(),
        };

        if package.part(CONTENT_TYPES_PART).is_none() {
            return Err(XlsxError::NotAWorkbook(format!(
                "missing {CONTENT_TYPES_PART}"
            )));
        }

        let workbook_xml = package
            .part(WORKBOOK_PART)
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_PART.into()))?;
        let sheet_info = read_workbook_xml(workbook_xml)?;

        let rels_xml = package
            .part(WORKBOOK_RELS_PART)
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_RELS_PART.into()))?;
        let sheet_paths = read_workbook_rels(rels_xml)?;

        let mut sheets = Vec::with_capacity(sheet_info.len());
        for (name, r_id) in sheet_info {
            match sheet_paths.get(&r_id) {
                Some(path) => sheets.push(SheetPart {
                    name,
                    path: path.clone(),
                }),
                None => log::warn!("sheet {name:?} has no worksheet relationship ({r_id})"),
            }
        }
        package.sheets = sheets;

        Ok(package)
    }

    /// Raw bytes of a part
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Names of all parts in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// All parts in archive order
    pub fn parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().map(|(n, d)| (n.as_str(), d.as_slice()))
    }

    /// Worksheets in workbook order
    pub fn sheets(&self) -> &[SheetPart] {
        &self.sheets
    }

    /// Part path of the worksheet with the given name
    pub fn sheet_path(&self, sheet_name: &str) -> Option<&str> {
        self.sheets
            .iter()
            .find(|s| s.name == sheet_name)
            .map(|s| s.path.as_str())
    }
}
