//! Key → row lookup built while writing a source sheet and consumed by the
//! sheet that links to it

use ahash::AHashMap;

/// Which key matched in [`RowLookup::resolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTier {
    /// `sub-scope|label|unit`
    Full,
    /// `sub-scope|label`
    Short,
    /// `label`
    Label,
}

/// Trim, collapse inner whitespace and lowercase
pub fn normalize_key(part: &str) -> String {
    part.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn full_key(sub_scope: &str, label: &str, unit: &str) -> String {
    format!(
        "{}|{}|{}",
        normalize_key(sub_scope),
        normalize_key(label),
        normalize_key(unit)
    )
}

fn short_key(sub_scope: &str, label: &str) -> String {
    format!("{}|{}", normalize_key(sub_scope), normalize_key(label))
}

/// Three-tier row lookup.
///
/// The full key is authoritative; the short and label-only keys are
/// fallbacks that keep the first row written under them.
#[derive(Debug, Clone, Default)]
pub struct RowLookup {
    full: AHashMap<String, u32>,
    short: AHashMap<String, u32>,
    label: AHashMap<String, u32>,
}

impl RowLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written row (1-based). Returns `false` when the full key was
    /// already taken; the earlier row is kept.
    pub fn insert(&mut self, sub_scope: &str, label: &str, unit: &str, row: u32) -> bool {
        let key = full_key(sub_scope, label, unit);
        let fresh = !self.full.contains_key(&key);
        if fresh {
            self.full.insert(key, row);
        }
        self.short.entry(short_key(sub_scope, label)).or_insert(row);
        self.label.entry(normalize_key(label)).or_insert(row);
        fresh
    }

    /// Find the row for an item: full key, then short key, then label
    pub fn resolve(&self, sub_scope: &str, label: &str, unit: &str) -> Option<(u32, LookupTier)> {
        if let Some(&row) = self.full.get(&full_key(sub_scope, label, unit)) {
            return Some((row, LookupTier::Full));
        }
        if let Some(&row) = self.short.get(&short_key(sub_scope, label)) {
            return Some((row, LookupTier::Short));
        }
        self.label
            .get(&normalize_key(label))
            .map(|&row| (row, LookupTier::Label))
    }

    /// Row for an item, ignoring which tier matched
    pub fn row(&self, sub_scope: &str, label: &str, unit: &str) -> Option<u32> {
        self.resolve(sub_scope, label, unit).map(|(row, _)| row)
    }

    /// Number of distinct full keys
    pub fn len(&self) -> usize {
        self.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}
