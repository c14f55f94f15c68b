use crate::error::{EtlError, Result};
use crate::table::Table;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// Writes a table as CSV with a leading 0-based row index column.
pub struct FlatFileSink;

impl FlatFileSink {
    /// Overwrites any existing file at `path`.
    #[instrument(skip(table), fields(rows = table.len()))]
    pub fn write(table: &Table, path: &Path) -> Result<()> {
        let target = path.display().to_string();
        let fail = |reason: String| EtlError::sink(target.clone(), reason);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(|e| fail(e.to_string()))?;

        // Index column has an empty header
        let mut header = vec![""];
        header.extend(table.column_names());
        writer.write_record(&header).map_err(|e| fail(e.to_string()))?;

        for (index, (name, values)) in table.records().enumerate() {
            let mut record = Vec::with_capacity(2 + values.len());
            record.push(index.to_string());
            record.push(name.to_string());
            record.extend(values.iter().map(|v| format_float(*v)));
            writer.write_record(&record).map_err(|e| fail(e.to_string()))?;
        }
        writer.flush().map_err(|e| fail(e.to_string()))?;

        info!(path = %target, "wrote flat file");
        Ok(())
    }
}

/// Shortest round-trip form, keeping `.0` on integral values (`80.0`, `23.25`).
fn format_float(v: f64) -> String {
    format!("{:?}", v)
}
