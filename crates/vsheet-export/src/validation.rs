//! Validation engine: advisory post-write checks

use serde::{Deserialize, Serialize};
use vsheet_core::{normalize_formula, CellRange};

use crate::document::SpreadsheetDocument;
use crate::formula::substitute_row;
use crate::spec::{Severity, TemplateSpec, ValidationRule};

/// Maximum offending cells listed per result
pub const MAX_REPORTED_CELLS: usize = 5;

/// Check kind implemented by the engine
pub const FORMULA_EQUALS: &str = "formulaEquals";

/// Outcome of one validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub id: String,
    pub severity: Severity,
    pub passed: bool,
    pub message: String,
    /// Offending cells, capped, with a trailing `+N more` marker
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<String>,
}

impl ValidationResult {
    fn pass(rule: &ValidationRule, message: impl Into<String>) -> Self {
        Self {
            id: rule.id.clone(),
            severity: rule.severity,
            passed: true,
            message: message.into(),
            cells: Vec::new(),
        }
    }

    fn fail(rule: &ValidationRule, message: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            id: rule.id.clone(),
            severity: rule.severity,
            passed: false,
            message: message.into(),
            cells,
        }
    }
}

/// Run every validation rule of the spec. Never fails; problems with the
/// rule itself (unknown sheet, bad range) are reported as failed results.
pub fn run_validations(
    document: &dyn SpreadsheetDocument,
    spec: &TemplateSpec,
) -> Vec<ValidationResult> {
    let results: Vec<ValidationResult> = spec
        .validations
        .iter()
        .map(|rule| run_validation(document, spec, rule))
        .collect();

    let failed = results.iter().filter(|r| !r.passed).count();
    log::info!("validations: {} run, {failed} failed", results.len());
    for result in results.iter().filter(|r| !r.passed) {
        log::warn!("validation {} failed: {}", result.id, result.message);
    }
    results
}

/// Run one rule
pub fn run_validation(
    document: &dyn SpreadsheetDocument,
    spec: &TemplateSpec,
    rule: &ValidationRule,
) -> ValidationResult {
    if rule.check.kind != FORMULA_EQUALS {
        return ValidationResult::pass(
            rule,
            format!("check kind {:?} not yet implemented; skipped", rule.check.kind),
        );
    }

    let Some(pattern) = rule.check.pattern.as_deref() else {
        return ValidationResult::fail(rule, "formulaEquals check has no pattern", Vec::new());
    };
    let Some(sheet_name) = spec.sheet_name(&rule.sheet) else {
        return ValidationResult::fail(
            rule,
            format!("unknown sheet key {:?}", rule.sheet),
            Vec::new(),
        );
    };
    let Some(sheet) = document.worksheet(sheet_name) else {
        return ValidationResult::fail(
            rule,
            format!("sheet {sheet_name:?} not found"),
            Vec::new(),
        );
    };
    let range = match CellRange::parse(&rule.range) {
        Ok(range) => range,
        Err(e) => {
            return ValidationResult::fail(rule, format!("bad range {:?}: {e}", rule.range), Vec::new())
        }
    };
    if !range.is_single_column() {
        return ValidationResult::fail(
            rule,
            format!("range {} spans more than one column", rule.range),
            Vec::new(),
        );
    }

    let mut offending = Vec::new();
    for addr in range.cells() {
        let expected = normalize_formula(&substitute_row(pattern, addr.row_number()));
        let actual = sheet.formula_at(addr.row, addr.col);
        if !actual.is_some_and(|f| formulas_match(f, &expected)) {
            offending.push(addr.to_a1_string());
        }
    }

    if offending.is_empty() {
        return ValidationResult::pass(
            rule,
            format!("{} cell(s) match {pattern}", range.cell_count()),
        );
    }

    let total = offending.len();
    let mut cells: Vec<String> = offending.into_iter().take(MAX_REPORTED_CELLS).collect();
    if total > MAX_REPORTED_CELLS {
        cells.push(format!("+{} more", total - MAX_REPORTED_CELLS));
    }
    ValidationResult::fail(
        rule,
        format!("{total} cell(s) in {sheet_name}!{} do not match {pattern}", rule.range),
        cells,
    )
}

/// Formula text comparison, insensitive to case outside string literals and
/// to the leading `=`
fn formulas_match(actual: &str, expected: &str) -> bool {
    canonical_formula(actual) == canonical_formula(expected)
}

fn canonical_formula(formula: &str) -> String {
    let formula = normalize_formula(formula);
    let mut out = String::with_capacity(formula.len());
    let mut in_string = false;
    for c in formula.chars() {
        if c == '"' {
            in_string = !in_string;
        }
        if in_string {
            out.push(c);
        } else if !c.is_whitespace() {
            out.extend(c.to_uppercase());
        }
    }
    out
}
