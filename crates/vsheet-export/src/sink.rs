//! Output sinks: where finished workbooks go

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persist finished bytes under a file name. Fire-and-forget: failures are
/// logged by the sink and never reach the exporter.
pub trait OutputSink {
    fn save(&self, bytes: &[u8], filename: &str);
}

impl<T: OutputSink + ?Sized> OutputSink for &T {
    fn save(&self, bytes: &[u8], filename: &str) {
        (**self).save(bytes, filename)
    }
}

/// Writes files into a directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write and report the outcome. Only the final path component of
    /// `filename` is used.
    pub fn try_save(&self, bytes: &[u8], filename: &str) -> io::Result<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty file name"))?;
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

impl OutputSink for DirectorySink {
    fn save(&self, bytes: &[u8], filename: &str) {
        match self.try_save(bytes, filename) {
            Ok(path) => log::info!("saved {}", path.display()),
            Err(e) => log::error!("failed to save {filename} to {}: {e}", self.dir.display()),
        }
    }
}

/// Keeps saved files in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of saved files, in save order
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Bytes of the most recent save under `filename`
    pub fn get(&self, filename: &str) -> Option<Vec<u8>> {
        self.lock()
            .iter()
            .rev()
            .find(|(name, _)| name == filename)
            .map(|(_, bytes)| bytes.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Vec<u8>)>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputSink for MemorySink {
    fn save(&self, bytes: &[u8], filename: &str) {
        log::debug!("keeping {filename} in memory ({} bytes)", bytes.len());
        self.lock().push((filename.to_string(), bytes.to_vec()));
    }
}
