use crate::error::{EtlError, Result};
use crate::table::Table;
use rusqlite::{params_from_iter, types::Value, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Owns the single store connection for a run.
///
/// `close` releases it and reports failures; if the session is dropped while
/// still open (early return, panic) the connection is closed there instead.
pub struct StoreSession {
    conn: Option<Connection>,
    path: PathBuf,
}

impl StoreSession {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| EtlError::sink(path.display().to_string(), e))?;
        }
        let conn =
            Connection::open(path).map_err(|e| EtlError::sink(path.display().to_string(), e))?;
        info!(path = %path.display(), "opened store connection");
        Ok(Self {
            conn: Some(conn),
            path: path.to_path_buf(),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| EtlError::sink(":memory:", e))?;
        Ok(Self {
            conn: Some(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| self.closed_error())
    }

    pub fn connection_mut(&mut self) -> Result<&mut Connection> {
        match self.conn.as_mut() {
            Some(conn) => Ok(conn),
            None => Err(EtlError::sink(
                self.path.display().to_string(),
                "connection already closed",
            )),
        }
    }

    pub fn close(mut self) -> Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close()
            .map_err(|(_, e)| EtlError::sink(self.path.display().to_string(), e))?;
        info!(path = %self.path.display(), "closed store connection");
        Ok(())
    }

    fn closed_error(&self) -> EtlError {
        EtlError::sink(self.path.display().to_string(), "connection already closed")
    }
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        if self.conn.is_some() {
            if let Err(e) = self.close_inner() {
                warn!("closing store connection on drop failed: {}", e);
            }
        }
    }
}

/// Full-replace writer: the named table is dropped and rebuilt on every load.
pub struct RelationalSink;

impl RelationalSink {
    #[instrument(skip(table, conn), fields(rows = table.len()))]
    pub fn write(table: &Table, conn: &mut Connection, table_name: &str) -> Result<()> {
        let fail = |e: rusqlite::Error| EtlError::sink(format!("table {}", table_name), e);
        let quoted = quote_ident(table_name);

        let mut columns = vec![format!("{} TEXT", quote_ident(table.name_column()))];
        columns.extend(
            table
                .value_column_names()
                .into_iter()
                .map(|c| format!("{} REAL", quote_ident(c))),
        );
        let placeholders = vec!["?"; columns.len()].join(", ");

        let tx = conn.transaction().map_err(fail)?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quoted), [])
            .map_err(fail)?;
        tx.execute(
            &format!("CREATE TABLE {} ({})", quoted, columns.join(", ")),
            [],
        )
        .map_err(fail)?;
        {
            let mut insert = tx
                .prepare(&format!("INSERT INTO {} VALUES ({})", quoted, placeholders))
                .map_err(fail)?;
            for (name, values) in table.records() {
                let mut row = Vec::with_capacity(1 + values.len());
                row.push(Value::Text(name.to_string()));
                row.extend(values.into_iter().map(Value::Real));
                insert.execute(params_from_iter(row)).map_err(fail)?;
            }
        }
        tx.commit().map_err(fail)?;

        debug!(table = table_name, "replaced table contents");
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
