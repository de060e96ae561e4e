//! Read side of the cycle persistence boundary

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::ExportResult;

/// The independently persisted documents of a reporting cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Activity entries (all scopes)
    Entries,
    /// Saved `subScope|itemLabel` → evaluation map
    Significance,
    /// Spreadsheet-editor state
    SheetState,
    /// Evidence attachments
    Evidence,
    /// Organisation profile
    OrgProfile,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Entries,
        DocumentKind::Significance,
        DocumentKind::SheetState,
        DocumentKind::Evidence,
        DocumentKind::OrgProfile,
    ];

    /// File stem used by [`JsonDirStore`]
    pub fn file_stem(&self) -> &'static str {
        match self {
            DocumentKind::Entries => "entries",
            DocumentKind::Significance => "significance",
            DocumentKind::SheetState => "sheet-state",
            DocumentKind::Evidence => "evidence",
            DocumentKind::OrgProfile => "org-profile",
        }
    }
}

/// Keyed read access to persisted cycle documents.
///
/// `Ok(None)` means the document was never saved; callers treat that as empty.
pub trait CycleStore {
    fn load(&self, cycle_id: &str, kind: DocumentKind) -> ExportResult<Option<serde_json::Value>>;
}

/// Documents stored as `<root>/<cycle>/<kind>.json`
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of one document
    pub fn document_path(&self, cycle_id: &str, kind: DocumentKind) -> PathBuf {
        self.root
            .join(cycle_id)
            .join(format!("{}.json", kind.file_stem()))
    }
}

impl CycleStore for JsonDirStore {
    fn load(&self, cycle_id: &str, kind: DocumentKind) -> ExportResult<Option<serde_json::Value>> {
        let path = self.document_path(cycle_id, kind);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no {} document at {}", kind.file_stem(), path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// In-memory store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(String, DocumentKind), serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a document
    pub fn put(&self, cycle_id: &str, kind: DocumentKind, document: serde_json::Value) {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        documents.insert((cycle_id.to_string(), kind), document);
    }
}

impl CycleStore for MemoryStore {
    fn load(&self, cycle_id: &str, kind: DocumentKind) -> ExportResult<Option<serde_json::Value>> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(documents.get(&(cycle_id.to_string(), kind)).cloned())
    }
}
