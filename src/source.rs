use crate::error::{EtlError, Result};
use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Where the raw HTML document comes from.
pub trait DocumentSource {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<String>;
}

/// Plain HTTP GET, no authentication and no retries.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EtlError::Fetch {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, url })
    }
}

impl DocumentSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    #[instrument(skip(self), fields(url = %self.url))]
    fn fetch(&self) -> Result<String> {
        let fetch_err = |reason: String| EtlError::Fetch {
            url: self.url.clone(),
            reason,
        };
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP status {}", status)));
        }
        let body = response.text().map_err(|e| fetch_err(e.to_string()))?;
        info!(bytes = body.len(), "fetched source document");
        Ok(body)
    }
}

/// A saved snapshot of the page on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String> {
        debug!(path = %self.path.display(), "reading source document");
        fs::read_to_string(&self.path).map_err(|source| EtlError::SourceFile {
            path: self.path.clone(),
            source,
        })
    }
}
