use crate::error::{EtlError, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// `2024-Mar-05-14:07:09`
pub const TIMESTAMP_FORMAT: &str = "%Y-%h-%d-%H:%M:%S";

const SEPARATOR: &str = " : ";

/// One line of the stage log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    pub fn at(time: DateTime<Local>, message: &str) -> Self {
        Self {
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
            message: message.to_string(),
        }
    }

    /// Parse a line previously written by `StageLogger`.
    pub fn parse(line: &str) -> Option<Self> {
        let (timestamp, message) = line.split_once(SEPARATOR)?;
        Some(Self {
            timestamp: timestamp.to_string(),
            message: message.to_string(),
        })
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.timestamp, SEPARATOR, self.message)
    }
}

/// Append-only stage log. The file is opened, appended and closed on every
/// call; no handle is held between entries.
#[derive(Debug, Clone)]
pub struct StageLogger {
    path: PathBuf,
}

impl StageLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `message` with the current local time. A failed append is fatal.
    pub fn log(&self, message: &str) -> Result<LogEntry> {
        let entry = LogEntry::at(Local::now(), message);
        self.append(&entry)?;
        info!(log = %self.path.display(), "{}", message);
        Ok(entry)
    }

    fn append(&self, entry: &LogEntry) -> Result<()> {
        let wrap = |source| EtlError::LogWrite {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(wrap)?;
        writeln!(file, "{}", entry).map_err(wrap)?;
        Ok(())
    }

    /// Every entry currently in the log, oldest first. A missing file reads as empty.
    pub fn read_entries(&self) -> Result<Vec<LogEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(EtlError::LogWrite {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(content.lines().filter_map(LogEntry::parse).collect())
    }
}
