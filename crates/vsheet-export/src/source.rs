//! Template sources: where template workbooks come from

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Fetch template bytes by locator
pub trait TemplateSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads templates from disk; relative locators resolve against a base
/// directory
#[derive(Debug, Clone, Default)]
pub struct FileTemplateSource {
    base: PathBuf,
}

impl FileTemplateSource {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    pub fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}

impl TemplateSource for FileTemplateSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.resolve(locator);
        log::debug!("reading template {}", path.display());
        Ok(fs::read(path)?)
    }
}

/// Fetches templates over HTTP(S). Any non-success status is a
/// [`FetchError::Status`].
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTemplateSource {
    client: reqwest::blocking::Client,
    base_url: Option<String>,
}

#[cfg(feature = "http")]
impl HttpTemplateSource {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest::blocking::Client::builder().build()?,
            base_url: None,
        })
    }

    /// Resolve locators without a scheme against `base_url`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn url(&self, locator: &str) -> String {
        match &self.base_url {
            Some(base) if !locator.contains("://") => {
                format!("{}/{}", base.trim_end_matches('/'), locator.trim_start_matches('/'))
            }
            _ => locator.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl TemplateSource for HttpTemplateSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url(locator);
        log::debug!("GET {url}");
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}
