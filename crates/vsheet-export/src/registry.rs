//! Template id → spec, adapter and template location

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::adapter::standard::{StandardAdapter, TEMPLATE_ID};
use crate::adapter::CompanyAdapter;
use crate::error::ExportResult;
use crate::spec::TemplateSpec;

/// Spec of the built-in standard template
pub const STANDARD_SPEC_JSON: &str = include_str!("../templates/vsheet-standard.json");

/// Parse the built-in standard spec
pub fn standard_spec() -> ExportResult<TemplateSpec> {
    TemplateSpec::from_json(STANDARD_SPEC_JSON)
}

/// Strip an optional `::variant` suffix
pub fn base_template_id(template_id: &str) -> &str {
    template_id
        .split_once("::")
        .map_or(template_id, |(base, _)| base)
}

/// Everything needed to export one template
#[derive(Clone)]
pub struct TemplateEntry {
    pub spec: TemplateSpec,
    pub adapter: Arc<dyn CompanyAdapter>,
    /// Where the template workbook is fetched from
    pub locator: String,
}

impl std::fmt::Debug for TemplateEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEntry")
            .field("template_id", &self.spec.template_id)
            .field("adapter", &self.adapter.name())
            .field("locator", &self.locator)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    entries: BTreeMap<String, TemplateEntry>,
}

impl TemplateRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in templates
    pub fn builtin() -> ExportResult<Self> {
        let mut registry = Self::new();
        registry.register(
            TEMPLATE_ID,
            TemplateEntry {
                spec: standard_spec()?,
                adapter: Arc::new(StandardAdapter::default()),
                locator: format!("{TEMPLATE_ID}.xlsx"),
            },
        );
        Ok(registry)
    }

    /// Add or replace an entry. Any `::` suffix of `template_id` is ignored.
    pub fn register(&mut self, template_id: &str, entry: TemplateEntry) {
        let id = base_template_id(template_id).to_string();
        if self.entries.insert(id.clone(), entry).is_some() {
            log::debug!("template {id} re-registered");
        }
    }

    /// Look up by template id, ignoring any `::` suffix
    pub fn resolve(&self, template_id: &str) -> Option<&TemplateEntry> {
        self.entries.get(base_template_id(template_id))
    }

    /// Registered ids, sorted
    pub fn template_ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
