use crate::error::{EtlError, Result};
use crate::table::{Row, Table};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

static TBODY: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").expect("valid selector"));
static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));

/// Build the ranked table from the first `tbody` of `document`.
///
/// `expected_columns` names the two output columns: entity name, then base
/// value. Rows without data cells are headers and are skipped, as are rows
/// whose second cell lacks a second link. Any value that does not parse as a
/// finite number aborts the whole extraction.
#[instrument(skip(document))]
pub fn extract(document: &Html, expected_columns: &[&str]) -> Result<Table> {
    let (name_column, base_column) = match expected_columns {
        [name, base] => (*name, *base),
        other => {
            return Err(EtlError::Config(format!(
                "extraction needs exactly two columns, got {:?}",
                other
            )))
        }
    };

    let body = document.select(&TBODY).next().ok_or(EtlError::MissingTable)?;

    let mut table = Table::new(name_column, base_column);
    for (index, tr) in body.select(&TR).enumerate() {
        let row_number = index + 1;
        let cells: Vec<ElementRef> = tr.select(&TD).collect();
        if cells.is_empty() {
            continue;
        }
        if let Some(row) = parse_row(row_number, &cells)? {
            table.push(row)?;
        }
    }

    info!(rows = table.len(), "extracted table");
    Ok(table)
}

fn parse_row(row_number: usize, cells: &[ElementRef]) -> Result<Option<Row>> {
    let Some(link) = cells.get(1).and_then(|cell| cell.select(&LINK).nth(1)) else {
        // Entries without a detail link are not ranked entities
        debug!(row = row_number, "no second link in name cell, skipping");
        return Ok(None);
    };

    let Some(value_cell) = cells.get(2) else {
        return Err(EtlError::MalformedValue {
            row: row_number,
            raw: cells.iter().map(element_text).collect::<Vec<_>>().join(" | "),
            reason: format!("expected at least 3 data cells, found {}", cells.len()),
        });
    };

    let name = element_text(&link).trim().to_string();
    if name.is_empty() {
        return Err(EtlError::MalformedValue {
            row: row_number,
            raw: link.html(),
            reason: "empty entity name".into(),
        });
    }

    let raw = element_text(value_cell);
    let value_base = parse_value(&raw).map_err(|reason| EtlError::MalformedValue {
        row: row_number,
        raw: raw.clone(),
        reason,
    })?;

    Ok(Some(Row { name, value_base }))
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect()
}

/// Strip embedded line breaks and parse as a finite `f64`.
pub fn parse_value(raw: &str) -> std::result::Result<f64, String> {
    let cleaned: String = raw.chars().filter(|&c| c != '\n').collect();
    let value: f64 = cleaned
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {}", e))?;
    if !value.is_finite() {
        return Err("value is not finite".into());
    }
    Ok(value)
}
