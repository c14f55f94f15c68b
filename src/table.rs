use crate::error::{EtlError, Result};

/// One ranked entity as extracted from the source page.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub value_base: f64,
}

/// A numeric column computed from the base column, one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Ordered rows plus any derived columns. Row order is rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name_column: String,
    base_column: String,
    rows: Vec<Row>,
    derived: Vec<DerivedColumn>,
}

impl Table {
    pub fn new(name_column: impl Into<String>, base_column: impl Into<String>) -> Self {
        Self {
            name_column: name_column.into(),
            base_column: base_column.into(),
            rows: Vec::new(),
            derived: Vec::new(),
        }
    }

    /// Append a row. Fails once a derived column exists, since that column
    /// would no longer cover every row.
    pub fn push(&mut self, row: Row) -> Result<()> {
        if let Some(column) = self.derived.first() {
            return Err(EtlError::ColumnLength {
                column: column.name.clone(),
                expected: self.rows.len() + 1,
                actual: column.values.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn name_column(&self) -> &str {
        &self.name_column
    }

    pub fn derived_columns(&self) -> &[DerivedColumn] {
        &self.derived
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.name.as_str())
    }

    pub fn base_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.value_base)
    }

    /// All column names: name, base, then derived in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec![self.name_column.as_str(), self.base_column.as_str()];
        names.extend(self.derived.iter().map(|c| c.name.as_str()));
        names
    }

    /// Names of the numeric columns (base and derived).
    pub fn value_column_names(&self) -> Vec<&str> {
        self.column_names().split_off(1)
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        if name == self.base_column {
            return Some(self.base_values().collect());
        }
        self.derived
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.clone())
    }

    /// Add a derived column, replacing an existing one of the same name in place.
    pub fn add_derived_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(EtlError::ColumnLength {
                column: name,
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        match self.derived.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.derived.push(DerivedColumn { name, values }),
        }
        Ok(())
    }

    /// Numeric values of row `index`: base first, then derived columns.
    pub fn row_values(&self, index: usize) -> Option<Vec<f64>> {
        let row = self.rows.get(index)?;
        let mut values = Vec::with_capacity(1 + self.derived.len());
        values.push(row.value_base);
        for column in &self.derived {
            values.push(*column.values.get(index)?);
        }
        Some(values)
    }

    /// Rows as `(name, values)` pairs in table order.
    pub fn records(&self) -> impl Iterator<Item = (&str, Vec<f64>)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, row)| (row.name.as_str(), self.row_values(i).unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new("Name", "MC_USD_Billion");
        table.push(Row { name: "Alpha".into(), value_base: 10.0 }).unwrap();
        table.push(Row { name: "Beta".into(), value_base: 5.0 }).unwrap();
        table
    }

    #[test]
    fn derived_columns_follow_base_column() {
        let mut table = sample();
        table.add_derived_column("MC_GBP_Billion", vec![8.0, 4.0]).unwrap();
        table.add_derived_column("MC_EUR_Billion", vec![9.3, 4.65]).unwrap();

        assert_eq!(
            table.column_names(),
            vec!["Name", "MC_USD_Billion", "MC_GBP_Billion", "MC_EUR_Billion"]
        );
        assert_eq!(
            table.value_column_names(),
            vec!["MC_USD_Billion", "MC_GBP_Billion", "MC_EUR_Billion"]
        );
        assert_eq!(table.row_values(1), Some(vec![5.0, 4.0, 4.65]));
    }

    #[test]
    fn rejects_column_of_wrong_length() {
        let mut table = sample();
        let err = table.add_derived_column("MC_GBP_Billion", vec![1.0]).unwrap_err();
        assert!(matches!(err, EtlError::ColumnLength { expected: 2, actual: 1, .. }));
        assert!(table.derived_columns().is_empty());
    }

    #[test]
    fn re_adding_a_column_replaces_it() {
        let mut table = sample();
        table.add_derived_column("MC_GBP_Billion", vec![1.0, 2.0]).unwrap();
        table.add_derived_column("MC_GBP_Billion", vec![8.0, 4.0]).unwrap();

        assert_eq!(table.derived_columns().len(), 1);
        assert_eq!(table.column("MC_GBP_Billion"), Some(vec![8.0, 4.0]));
    }

    #[test]
    fn records_preserve_row_order() {
        let mut table = sample();
        table.add_derived_column("MC_GBP_Billion", vec![8.0, 4.0]).unwrap();
        let records: Vec<_> = table.records().collect();
        assert_eq!(records[0], ("Alpha", vec![10.0, 8.0]));
        assert_eq!(records[1], ("Beta", vec![5.0, 4.0]));
    }

    #[test]
    fn push_after_derived_column_is_rejected() {
        let mut table = sample();
        table.add_derived_column("MC_GBP_Billion", vec![8.0, 4.0]).unwrap();

        let err = table
            .push(Row { name: "Gamma".into(), value_base: 1.0 })
            .unwrap_err();
        assert!(matches!(
            err,
            EtlError::ColumnLength { ref column, expected: 3, actual: 2 } if column == "MC_GBP_Billion"
        ));
        assert_eq!(table.len(), 2);
        assert_eq!(table.records().count(), 2);
    }
}
