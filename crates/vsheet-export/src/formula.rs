//! Formula builder: row-parameterized templates and spreadsheet dialects

use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};

/// Token replaced by the target row number
pub const ROW_PLACEHOLDER: &str = "{row}";

/// Capabilities of the spreadsheet application the template targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlags {
    /// XLOOKUP and friends
    pub xlookup: bool,
    /// Dynamic-array functions (FILTER, SORT, UNIQUE, ...)
    pub dynamic_array: bool,
    pub named_ranges: bool,
}

impl FeatureFlags {
    /// Apply overrides; a set override always wins
    pub fn merged(self, overrides: &FeatureOverrides) -> Self {
        Self {
            xlookup: overrides.xlookup.unwrap_or(self.xlookup),
            dynamic_array: overrides.dynamic_array.unwrap_or(self.dynamic_array),
            named_ranges: overrides.named_ranges.unwrap_or(self.named_ranges),
        }
    }

    /// Whether the modern formula dialect may be used
    pub fn prefers_modern(&self) -> bool {
        self.xlookup || self.dynamic_array
    }
}

/// Per-call feature flag overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureOverrides {
    pub xlookup: Option<bool>,
    pub dynamic_array: Option<bool>,
    pub named_ranges: Option<bool>,
}

impl FeatureOverrides {
    /// Set one override by its flag name (`xlookup`, `dynamicArray`,
    /// `namedRanges`; snake_case accepted). Returns false for unknown names.
    pub fn set(&mut self, name: &str, value: bool) -> bool {
        let slot = match name {
            "xlookup" => &mut self.xlookup,
            "dynamicArray" | "dynamic_array" => &mut self.dynamic_array,
            "namedRanges" | "named_ranges" => &mut self.named_ranges,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// Where a column's formula comes from.
///
/// In JSON either a bare string (`"=P{row}*Q{row}/1000"`) or
/// `{"byExcel": {"modern": "...", "legacy": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FormulaSourceRepr", into = "FormulaSourceRepr")]
pub enum FormulaSource {
    /// One pattern for every application
    Fixed(String),
    /// Dialect-dependent alternatives
    ByExcel { modern: String, legacy: String },
}

#[derive(Clone, Serialize, Deserialize)]
struct DialectPair {
    modern: String,
    legacy: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FormulaSourceRepr {
    Fixed(String),
    ByExcel {
        #[serde(rename = "byExcel")]
        by_excel: DialectPair,
    },
}

impl From<FormulaSourceRepr> for FormulaSource {
    fn from(repr: FormulaSourceRepr) -> Self {
        match repr {
            FormulaSourceRepr::Fixed(pattern) => FormulaSource::Fixed(pattern),
            FormulaSourceRepr::ByExcel { by_excel } => FormulaSource::ByExcel {
                modern: by_excel.modern,
                legacy: by_excel.legacy,
            },
        }
    }
}

impl From<FormulaSource> for FormulaSourceRepr {
    fn from(source: FormulaSource) -> Self {
        match source {
            FormulaSource::Fixed(pattern) => FormulaSourceRepr::Fixed(pattern),
            FormulaSource::ByExcel { modern, legacy } => FormulaSourceRepr::ByExcel {
                by_excel: DialectPair { modern, legacy },
            },
        }
    }
}

impl FormulaSource {
    /// The pattern chosen for a feature set
    pub fn pattern(&self, features: &FeatureFlags) -> &str {
        match self {
            FormulaSource::Fixed(pattern) => pattern,
            FormulaSource::ByExcel { modern, legacy } => {
                if features.prefers_modern() {
                    modern
                } else {
                    legacy
                }
            }
        }
    }
}

/// Substitute the row placeholder in a pattern
pub fn substitute_row(pattern: &str, row: u32) -> String {
    pattern.replace(ROW_PLACEHOLDER, &row.to_string())
}

/// Concrete formula of `source` for a 1-based `row`
pub fn build_formula(source: &FormulaSource, features: &FeatureFlags, row: u32) -> String {
    substitute_row(source.pattern(features), row)
}

/// Quote a sheet name for use in a reference when it needs it
pub fn quote_sheet_name(sheet: &str) -> String {
    let plain = regex_is_match!(r"^[A-Za-z_][A-Za-z0-9_.]*$", sheet)
        && !regex_is_match!(r"^(?i)([A-Z]{1,3}[0-9]+|R[0-9]*C[0-9]*|TRUE|FALSE)$", sheet);
    if plain {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

/// Cross-sheet reference such as `'Scope3 Screening'!H12`
pub fn sheet_ref(sheet: &str, column: &str, row: u32) -> String {
    format!("{}!{column}{row}", quote_sheet_name(sheet))
}
