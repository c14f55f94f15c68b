use crate::constants;
use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Deployment settings. Every field defaults to the fixed constant in
/// `constants`, so an absent or empty config file gives the stock job.
/// The report queries are not configurable; unknown keys are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_url: String,
    /// Saved HTML snapshot to read instead of fetching `source_url`.
    pub source_file: Option<PathBuf>,
    pub rates_path: PathBuf,
    pub csv_output_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,
    pub diagnostics_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: constants::SOURCE_URL.to_string(),
            source_file: None,
            rates_path: PathBuf::from(constants::RATES_PATH),
            csv_output_path: PathBuf::from(constants::CSV_OUTPUT_PATH),
            db_path: PathBuf::from(constants::DB_PATH),
            table_name: constants::TABLE_NAME.to_string(),
            log_path: PathBuf::from(constants::LOG_PATH),
            diagnostics_dir: PathBuf::from(constants::DIAGNOSTICS_DIR),
        }
    }
}

impl Config {
    /// Load from `path`, or from `etl.toml` in the working directory when it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(constants::CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("no {} found, using built-in defaults", constants::CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        info!(path = %path.display(), "loaded config");
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.table_name) {
            return Err(EtlError::Config(format!(
                "table_name '{}' is not a plain SQL identifier",
                self.table_name
            )));
        }
        Ok(())
    }

    /// The fixed report queries against the configured table, in execution order.
    pub fn query_list(&self) -> Vec<String> {
        constants::default_queries(&self.table_name)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
