/// Fixed deployment constants. `Config` defaults to these values.

// Source document: archived snapshot of the largest-banks list
pub const SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

// Local files
pub const RATES_PATH: &str = "exchange_rate.csv";
pub const CSV_OUTPUT_PATH: &str = "Largest_banks_data.csv";
pub const DB_PATH: &str = "Banks.db";
pub const LOG_PATH: &str = "code_log.txt";
pub const DIAGNOSTICS_DIR: &str = "logs";
pub const CONFIG_FILE: &str = "etl.toml";

pub const TABLE_NAME: &str = "Largest_banks";

// Columns produced by extraction
pub const NAME_COLUMN: &str = "Name";
pub const BASE_COLUMN: &str = "MC_USD_Billion";
pub const TABLE_ATTRIBS: [&str; 2] = [NAME_COLUMN, BASE_COLUMN];

/// Target currencies, in output column order.
pub const TARGET_CURRENCIES: [&str; 3] = ["GBP", "INR", "EUR"];

/// Column holding `base * rate(code)`.
pub fn derived_column_name(code: &str) -> String {
    format!("MC_{}_Billion", code)
}

/// The fixed report queries, rendered against `table`.
pub fn default_queries(table: &str) -> Vec<String> {
    vec![
        format!("SELECT * FROM {}", table),
        format!("SELECT AVG(MC_GBP_Billion) FROM {}", table),
        format!("SELECT Name from {} LIMIT 5", table),
    ]
}
