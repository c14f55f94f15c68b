use anyhow::Result;
use bank_etl::config::Config;
use bank_etl::query::QueryRunner;
use bank_etl::source::FileSource;
use bank_etl::stage_log::StageLogger;
use bank_etl::{EtlError, Pipeline, Stage};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/resources/largest_banks.html");

fn config_in(dir: &Path, rates: &str) -> Config {
    let rates_path = dir.join("exchange_rate.csv");
    fs::write(&rates_path, rates).unwrap();
    Config {
        source_file: Some(PathBuf::from(FIXTURE)),
        rates_path,
        csv_output_path: dir.join("Largest_banks_data.csv"),
        db_path: dir.join("Banks.db"),
        log_path: dir.join("code_log.txt"),
        diagnostics_dir: dir.join("logs"),
        ..Config::default()
    }
}

fn standard_setup() -> (TempDir, Config) {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path(), "Currency,Rate\nGBP,0.8\nINR,90.0\nEUR,0.93\n");
    (dir, config)
}

fn log_messages(config: &Config) -> Vec<String> {
    StageLogger::new(&config.log_path)
        .read_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.message)
        .collect()
}

#[test]
fn end_to_end_writes_csv_store_and_log() -> Result<()> {
    let (_dir, config) = standard_setup();
    let pipeline = Pipeline::new(config.clone());
    let source = pipeline.default_source()?;
    let report = pipeline.run(source.as_ref())?;

    assert_eq!(report.stage, Stage::Done);
    assert_eq!(report.table.len(), 3);

    // Flat file: header plus exactly three data rows
    let mut reader = csv::Reader::from_path(&config.csv_output_path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    assert_eq!(
        headers,
        vec!["", "Name", "MC_USD_Billion", "MC_GBP_Billion", "MC_INR_Billion", "MC_EUR_Billion"]
    );
    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 3);
    let gbp: Vec<f64> = records.iter().map(|r| r[3].parse().unwrap()).collect();
    assert_eq!(gbp, vec![80.0, 40.0, 20.0]);
    let names: Vec<&str> = records.iter().map(|r| &r[1]).collect();
    assert_eq!(
        names,
        vec!["JPMorgan Chase", "Bank of America", "Industrial and Commercial Bank of China"]
    );

    // Store: query (1) returns the same rows as the table, ignoring order
    let conn = Connection::open(&config.db_path)?;
    let mut stmt = conn.prepare("SELECT * FROM Largest_banks")?;
    let mut stored: Vec<(String, f64, f64, f64, f64)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)))?
        .collect::<rusqlite::Result<_>>()?;
    stored.sort_by(|a, b| a.0.cmp(&b.0));
    let mut expected: Vec<(String, f64, f64, f64, f64)> = report
        .table
        .records()
        .map(|(name, v)| (name.to_string(), v[0], v[1], v[2], v[3]))
        .collect();
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(stored, expected);

    // Fixed queries: all rows, GBP average, first names
    assert_eq!(report.query_results.len(), 3);
    assert_eq!(report.query_results[0].rows.len(), 3);
    assert_eq!(
        report.query_results[1].rows[0][0],
        rusqlite::types::Value::Real((80.0 + 40.0 + 20.0) / 3.0)
    );
    assert!(report.query_results[2].rows.len() <= 5);

    // Stage log: one entry per transition, in order
    assert_eq!(
        log_messages(&config),
        vec![
            "Preliminaries complete. Initiating ETL process.",
            "Data extraction complete. Initiating Transformation process.",
            "Data transformation complete. Initiating loading process.",
            "Data saved to CSV file.",
            "SQL Connection initiated.",
            "Data loaded to Database as table. Running the query.",
            "Queries executed. Closing SQL connection.",
            "Process Complete.",
        ]
    );
    Ok(())
}

#[test]
fn missing_currency_stops_before_any_sink() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path(), "Currency,Rate\nGBP,0.8\nINR,90.0\n");
    let pipeline = Pipeline::new(config.clone());

    let err = pipeline.run(&FileSource::new(FIXTURE)).unwrap_err();

    assert!(matches!(err, EtlError::UnknownCurrency(ref c) if c == "EUR"));
    assert!(!config.csv_output_path.exists());
    assert!(!config.db_path.exists());
    assert_eq!(log_messages(&config).len(), 2);
}

#[test]
fn rerun_replaces_store_and_appends_log() -> Result<()> {
    let (_dir, config) = standard_setup();
    let pipeline = Pipeline::new(config.clone());
    pipeline.run(&FileSource::new(FIXTURE))?;
    pipeline.run(&FileSource::new(FIXTURE))?;

    let conn = Connection::open(&config.db_path)?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM Largest_banks", [], |r| r.get(0))?;
    assert_eq!(count, 3);
    assert_eq!(log_messages(&config).len(), 16);
    Ok(())
}

#[test]
fn missing_table_body_halts_after_init() {
    let (dir, config) = standard_setup();
    let page = dir.path().join("empty.html");
    fs::write(&page, "<html><body><p>archived page unavailable</p></body></html>").unwrap();

    let err = Pipeline::new(config.clone())
        .run(&FileSource::new(&page))
        .unwrap_err();

    assert!(matches!(err, EtlError::MissingTable));
    assert_eq!(
        log_messages(&config),
        vec!["Preliminaries complete. Initiating ETL process."]
    );
}

#[test]
fn failing_query_leaves_loaded_outputs_in_place() -> Result<()> {
    let (_dir, config) = standard_setup();
    let queries = QueryRunner::new(vec![
        "SELECT * FROM Largest_banks".to_string(),
        "SELECT nonsense FROM".to_string(),
    ]);
    let err = Pipeline::new(config.clone())
        .with_queries(queries)
        .run(&FileSource::new(FIXTURE))
        .unwrap_err();

    assert!(matches!(err, EtlError::Query { .. }));
    assert!(config.csv_output_path.exists());

    // Connection was released, the store is readable and holds the load
    let conn = Connection::open(&config.db_path)?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM Largest_banks", [], |r| r.get(0))?;
    assert_eq!(count, 3);

    let messages = log_messages(&config);
    assert_eq!(messages.len(), 6);
    assert_eq!(
        messages.last().map(String::as_str),
        Some("Data loaded to Database as table. Running the query.")
    );
    Ok(())
}
