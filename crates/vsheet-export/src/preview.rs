//! Read-only sheet previews and a cancellable loader for them

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use vsheet_core::{CellAddress, CellRange, CellValue, Worksheet};
use vsheet_xlsx::XlsxDocument;

/// One displayed cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PreviewCell {
    Empty,
    Text(String),
    Number(f64),
    Formula {
        text: String,
        /// Last calculated result, when the file carried one
        cached: Option<String>,
    },
}

impl PreviewCell {
    fn from_value(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => PreviewCell::Empty,
            CellValue::Number(n) => PreviewCell::Number(*n),
            CellValue::Formula {
                text, cached_value, ..
            } => PreviewCell::Formula {
                text: text.clone(),
                cached: cached_value.as_ref().map(|v| v.to_string()),
            },
            other => PreviewCell::Text(other.to_string()),
        }
    }

    /// Text shown for the cell; formulas show their cached result if known
    pub fn display(&self) -> String {
        match self {
            PreviewCell::Empty => String::new(),
            PreviewCell::Text(s) => s.clone(),
            PreviewCell::Number(n) => n.to_string(),
            PreviewCell::Formula {
                cached: Some(cached),
                ..
            } => cached.clone(),
            PreviewCell::Formula { text, .. } => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    /// 1-based row number
    pub number: u32,
    pub cells: Vec<PreviewCell>,
}

/// A rectangular snapshot of a worksheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPreview {
    pub sheet: String,
    pub range: String,
    /// Column letters
    pub columns: Vec<String>,
    pub rows: Vec<PreviewRow>,
}

/// Snapshot `range` of a worksheet
pub fn build_preview(sheet: &Worksheet, range: &CellRange) -> SheetPreview {
    let columns = (range.start.col..=range.end.col)
        .map(CellAddress::column_to_letters)
        .collect();
    let rows = (range.start.row..=range.end.row)
        .map(|row| PreviewRow {
            number: row + 1,
            cells: (range.start.col..=range.end.col)
                .map(|col| {
                    sheet
                        .cell_at(row, col)
                        .map_or(PreviewCell::Empty, |cell| PreviewCell::from_value(&cell.value))
                })
                .collect(),
        })
        .collect();
    SheetPreview {
        sheet: sheet.name().to_string(),
        range: range.to_a1_string(),
        columns,
        rows,
    }
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("no workbook for cycle {0:?}")]
    CycleNotFound(String),

    #[error("sheet {0:?} not found")]
    SheetNotFound(String),

    #[error("preview cancelled")]
    Cancelled,

    #[error("preview timed out after {0:?}")]
    TimedOut(Duration),

    #[error("preview failed: {0}")]
    Backend(String),
}

/// Produces previews for a cycle's workbook
pub trait PreviewBackend: Send + Sync + 'static {
    fn load(&self, cycle_id: &str, sheet: &str, range: &CellRange) -> Result<SheetPreview, PreviewError>;
}

/// Reads `<root>/<cycle>.xlsx`
#[derive(Debug, Clone)]
pub struct WorkbookPreviewBackend {
    root: PathBuf,
}

impl WorkbookPreviewBackend {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn workbook_path(&self, cycle_id: &str) -> PathBuf {
        self.root.join(format!("{cycle_id}.xlsx"))
    }
}

impl PreviewBackend for WorkbookPreviewBackend {
    fn load(&self, cycle_id: &str, sheet: &str, range: &CellRange) -> Result<SheetPreview, PreviewError> {
        let path = self.workbook_path(cycle_id);
        if !path.is_file() {
            return Err(PreviewError::CycleNotFound(cycle_id.to_string()));
        }
        let document = XlsxDocument::open(&path).map_err(|e| PreviewError::Backend(e.to_string()))?;
        let worksheet = document
            .worksheet(sheet)
            .ok_or_else(|| PreviewError::SheetNotFound(sheet.to_string()))?;
        Ok(build_preview(worksheet, range))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    pub timeout: Duration,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    cancel: oneshot::Sender<()>,
}

/// Loads one preview at a time: starting a load cancels the one in flight.
///
/// The backend runs on the blocking pool. A cancelled or timed-out load
/// returns at once; the blocking call itself finishes in the background and
/// its result is discarded.
pub struct PreviewLoader<B: PreviewBackend> {
    backend: Arc<B>,
    config: PreviewConfig,
    next_id: AtomicU64,
    in_flight: Mutex<Option<InFlight>>,
}

impl<B: PreviewBackend> PreviewLoader<B> {
    pub fn new(backend: B, config: PreviewConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            config,
            next_id: AtomicU64::new(1),
            in_flight: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Cancel the load in flight, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(previous) => {
                log::debug!("cancelling preview #{}", previous.id);
                let _ = previous.cancel.send(());
                true
            }
            None => false,
        }
    }

    pub async fn load(
        &self,
        cycle_id: &str,
        sheet: &str,
        range: CellRange,
    ) -> Result<SheetPreview, PreviewError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = oneshot::channel();
        {
            let mut slot = self.slot();
            if let Some(previous) = slot.replace(InFlight { id, cancel }) {
                log::debug!("preview #{} superseded by #{id}", previous.id);
                let _ = previous.cancel.send(());
            }
        }

        let backend = Arc::clone(&self.backend);
        let (cycle, sheet) = (cycle_id.to_string(), sheet.to_string());
        let task = tokio::task::spawn_blocking(move || backend.load(&cycle, &sheet, &range));

        let timeout = self.config.timeout;
        let outcome = tokio::select! {
            _ = cancelled => Err(PreviewError::Cancelled),
            result = tokio::time::timeout(timeout, task) => match result {
                Err(_) => Err(PreviewError::TimedOut(timeout)),
                Ok(Err(join)) => Err(PreviewError::Backend(join.to_string())),
                Ok(Ok(preview)) => preview,
            },
        };

        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|f| f.id == id) {
            *slot = None;
        }
        outcome
    }

    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
