use crate::constants::{derived_column_name, TARGET_CURRENCIES};
use crate::error::Result;
use crate::rates::RateMap;
use crate::table::Table;
use tracing::{debug, instrument};

/// Round to two decimals, ties to even on the scaled value.
///
/// `1.005` is stored as `1.00499999...` and so rounds down to `1.0`; an exact
/// tie such as `0.125` rounds to `0.12`.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Append one `MC_<CODE>_Billion` column per target currency (GBP, INR, EUR),
/// each `round2(base * rate)`. Every rate is resolved before the table is
/// touched, so an unknown currency leaves it unchanged.
#[instrument(skip_all, fields(rows = table.len()))]
pub fn transform(mut table: Table, rates: &RateMap) -> Result<Table> {
    let resolved = TARGET_CURRENCIES
        .iter()
        .map(|code| rates.get(code).map(|rate| (*code, rate)))
        .collect::<Result<Vec<_>>>()?;

    for (code, rate) in resolved {
        let values = table.base_values().map(|v| round2(v * rate)).collect();
        table.add_derived_column(derived_column_name(code), values)?;
        debug!(currency = code, rate, "added derived column");
    }
    Ok(table)
}
