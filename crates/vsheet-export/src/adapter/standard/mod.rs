//! The standard V-Sheet adapter: monthly scope-1 sheets, then the scope-3
//! screening → significance → summary chain

mod layout;
mod monthly;
mod screening;
mod significance;
mod summary;

pub use layout::{
    FixedRow, MonthlySheet, ScreeningBlock, SignificanceBlock, SlotGroup, StandardLayout,
    SummaryBlock,
};

use vsheet_core::CellRange;

use super::{ClaimedRegion, CompanyAdapter, ExportContext, RowLookup};
use crate::error::ExportResult;
use crate::formula::sheet_ref;
use crate::spec::TemplateSpec;

/// Template id served by [`StandardAdapter`]
pub const TEMPLATE_ID: &str = "vsheet-standard";

/// Rows written on one sheet, for a later sheet to link to
#[derive(Debug, Clone)]
pub(crate) struct LinkedRows {
    /// Worksheet name
    pub sheet: String,
    pub lookup: RowLookup,
    pub label_column: String,
    pub value_column: String,
    pub share_column: String,
}

impl LinkedRows {
    fn label_ref(&self, row: u32) -> String {
        format!("={}", sheet_ref(&self.sheet, &self.label_column, row))
    }

    fn value_ref(&self, row: u32) -> String {
        format!("={}", sheet_ref(&self.sheet, &self.value_column, row))
    }

    fn share_ref(&self, row: u32) -> String {
        format!("={}", sheet_ref(&self.sheet, &self.share_column, row))
    }
}

#[derive(Debug, Clone)]
pub struct StandardAdapter {
    layout: StandardLayout,
    template_ids: Vec<String>,
}

impl Default for StandardAdapter {
    fn default() -> Self {
        Self::new(StandardLayout::default())
    }
}

impl StandardAdapter {
    pub fn new(layout: StandardLayout) -> Self {
        Self {
            layout,
            template_ids: vec![TEMPLATE_ID.to_string()],
        }
    }

    /// Serve additional template ids with the same layout
    pub fn also_supporting(mut self, template_id: impl Into<String>) -> Self {
        self.template_ids.push(template_id.into());
        self
    }

    pub fn layout(&self) -> &StandardLayout {
        &self.layout
    }
}

impl CompanyAdapter for StandardAdapter {
    fn name(&self) -> &str {
        "standard"
    }

    fn supports(&self, template_id: &str) -> bool {
        self.template_ids.iter().any(|id| id == template_id)
    }

    /// Monthly sheets with an invalid layout claim nothing; `apply` reports them
    fn claimed_regions(&self, spec: &TemplateSpec) -> Vec<ClaimedRegion> {
        let mut claimed = Vec::new();
        for sheet in &self.layout.monthly {
            let (Some(name), Ok(regions)) = (spec.sheet_name(&sheet.sheet), sheet.regions()) else {
                continue;
            };
            claimed.extend(regions.into_iter().map(|r| ClaimedRegion::new(name, r)));
        }
        let blocks = [
            (&self.layout.screening.sheet, &self.layout.screening.range),
            (&self.layout.significance.sheet, &self.layout.significance.range),
            (&self.layout.summary.sheet, &self.layout.summary.range),
        ];
        for (key, range) in blocks {
            if let (Some(name), Ok(range)) = (spec.sheet_name(key), CellRange::parse(range)) {
                claimed.push(ClaimedRegion::new(name, range));
            }
        }
        claimed
    }

    fn apply(&self, ctx: &mut ExportContext<'_>) -> ExportResult<()> {
        self.layout.validate()?;
        for sheet in &self.layout.monthly {
            monthly::write_monthly_sheet(ctx, sheet)?;
        }

        let screened = screening::write_screening(ctx, &self.layout.screening)?;
        let evaluated =
            significance::write_significance(ctx, &self.layout.significance, screened.as_ref())?;
        summary::write_summary(ctx, &self.layout.summary, evaluated.as_ref())?;
        Ok(())
    }
}

/// Resolve a sheet key to a present worksheet name, noting why a stage is
/// skipped otherwise
pub(crate) fn stage_sheet(ctx: &mut ExportContext<'_>, stage: &str, key: &str) -> Option<String> {
    let Some(name) = ctx.spec.sheet_name(key).map(str::to_string) else {
        ctx.note(format!("{stage}: sheet key {key:?} not declared; skipped"));
        return None;
    };
    if !ctx.document.has_sheet(&name) {
        ctx.note(format!("{stage}: sheet {name:?} not in template; skipped"));
        return None;
    }
    log::debug!("{stage}: writing {name}");
    Some(name)
}
