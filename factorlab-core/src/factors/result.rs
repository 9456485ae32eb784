//! Factor result: one value per symbol as of a date.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// The latest point of one symbol's derived series.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRow {
    pub symbol: String,
    /// Date of the bar the value was taken from (<= as_of).
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Cross-section of a factor, sorted by symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorResult {
    name: String,
    symbol_key: String,
    as_of: NaiveDate,
    rows: Vec<FactorRow>,
}

impl FactorResult {
    pub fn new(
        name: impl Into<String>,
        symbol_key: impl Into<String>,
        as_of: NaiveDate,
        mut rows: Vec<FactorRow>,
    ) -> Self {
        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Self {
            name: name.into(),
            symbol_key: symbol_key.into(),
            as_of,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol_key(&self) -> &str {
        &self.symbol_key
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn rows(&self) -> &[FactorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&FactorRow> {
        self.rows
            .binary_search_by(|row| row.symbol.as_str().cmp(symbol))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Value for `symbol`; `None` if the symbol is absent or its value is null.
    pub fn value(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).and_then(|row| row.value)
    }

    pub fn to_map(&self) -> BTreeMap<String, Option<f64>> {
        self.rows
            .iter()
            .map(|row| (row.symbol.clone(), row.value))
            .collect()
    }

}
