use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct RateRecord {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: f64,
}

/// Currency code to multiplier against the base currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateMap {
    rates: HashMap<String, f64>,
}

impl RateMap {
    /// Read a `Currency,Rate` file. A repeated code keeps its last rate.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let rate_err = |reason: String| EtlError::RateFile {
            path: path.to_path_buf(),
            reason,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| rate_err(e.to_string()))?;

        let mut map = RateMap::default();
        for result in reader.deserialize() {
            let record: RateRecord = result.map_err(|e| rate_err(e.to_string()))?;
            map.insert(&record.currency, record.rate).map_err(rate_err)?;
        }
        debug!(currencies = map.len(), "loaded exchange rates");
        Ok(map)
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        let mut map = RateMap::default();
        for (code, rate) in pairs {
            map.insert(code, rate).map_err(EtlError::Config)?;
        }
        Ok(map)
    }

    fn insert(&mut self, code: &str, rate: f64) -> std::result::Result<(), String> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(format!("rate for {} must be a positive number, got {}", code, rate));
        }
        self.rates.insert(code.to_string(), rate);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Result<f64> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| EtlError::UnknownCurrency(code.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
