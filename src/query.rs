use crate::error::{EtlError, Result};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::fmt;
use tracing::{debug, instrument};

/// A fully materialised result set for one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Values of `column` in row order.
    pub fn column(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.sql)?;
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(render_value).collect())
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rendered
                    .iter()
                    .map(|r| r[i].len())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:>w$}", "", w = index_width)?;
        for (name, w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", name, w = *w)?;
        }
        writeln!(f)?;
        for (i, row) in rendered.iter().enumerate() {
            write!(f, "{:>w$}", i, w = index_width)?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {:>w$}", cell, w = *w)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => format!("{:?}", r),
        Value::Text(t) => t.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Runs a fixed, ordered list of read-only statements.
#[derive(Debug, Clone)]
pub struct QueryRunner {
    queries: Vec<String>,
}

impl QueryRunner {
    pub fn new(queries: Vec<String>) -> Self {
        Self { queries }
    }

    /// Execute each statement in order, reading every row of one before the
    /// next is prepared. `on_result` sees each result set as soon as it is
    /// read, so earlier results are still reported when a later one fails.
    #[instrument(skip_all, fields(queries = self.queries.len()))]
    pub fn run<F>(&self, conn: &Connection, mut on_result: F) -> Result<Vec<QueryResult>>
    where
        F: FnMut(&QueryResult),
    {
        let mut results = Vec::with_capacity(self.queries.len());
        for sql in &self.queries {
            let result = run_query(conn, sql)?;
            on_result(&result);
            results.push(result);
        }
        Ok(results)
    }
}

pub fn run_query(conn: &Connection, sql: &str) -> Result<QueryResult> {
    let wrap = |source| EtlError::Query {
        sql: sql.to_string(),
        source,
    };
    let mut stmt = conn.prepare(sql).map_err(wrap)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .map_err(wrap)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(wrap)?;

    debug!(sql, rows = rows.len(), "query complete");
    Ok(QueryResult {
        sql: sql.to_string(),
        columns,
        rows,
    })
}
