use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("reading source document {path:?} failed: {source}")]
    SourceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no table body found in source document")]
    MissingTable,

    #[error("malformed value in row {row}: {reason} (raw: {raw:?})")]
    MalformedValue {
        row: usize,
        raw: String,
        reason: String,
    },

    #[error("no exchange rate for currency {0}")]
    UnknownCurrency(String),

    #[error("rate file {path:?}: {reason}")]
    RateFile { path: PathBuf, reason: String },

    #[error("column {column} has {actual} values, table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("writing {target} failed: {reason}")]
    SinkWrite { target: String, reason: String },

    #[error("query `{sql}` failed: {source}")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("appending to log {path:?} failed: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EtlError {
    pub(crate) fn sink(target: impl Into<String>, reason: impl ToString) -> Self {
        EtlError::SinkWrite {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
