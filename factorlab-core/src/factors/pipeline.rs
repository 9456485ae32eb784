//! Two-stage factor pipeline.
//!
//! 1. `derive`: split the table by symbol and run a [`SeriesTransform`] over
//!    each symbol's full visible history.
//! 2. `latest_per_symbol`: keep each symbol's last derived point dated on or
//!    before the as-of date.
//!
//! Both stages are pure; providers compose them after loading the store.

use super::result::{FactorResult, FactorRow};
use crate::domain::Bar;
use crate::indicators::{DerivedPoint, SeriesTransform};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Bars grouped by symbol, each group sorted by date ascending.
pub type Panel = BTreeMap<String, Vec<Bar>>;

/// Derived series grouped by symbol.
pub type DerivedPanel = BTreeMap<String, Vec<DerivedPoint>>;

pub fn group_by_symbol(bars: Vec<Bar>) -> Panel {
    let mut panel: Panel = BTreeMap::new();
    for bar in bars {
        panel.entry(bar.symbol.clone()).or_default().push(bar);
    }
    for series in panel.values_mut() {
        series.sort_by_key(|b| b.date);
    }
    panel
}

/// Stage 1: apply `transform` to every symbol's series.
pub fn derive(panel: &Panel, transform: &dyn SeriesTransform) -> DerivedPanel {
    panel
        .iter()
        .map(|(symbol, bars)| (symbol.clone(), transform.apply(bars)))
        .collect()
}

/// Stage 2: one row per symbol, taken from its latest point dated <= `as_of`.
///
/// Symbols with no point on or before `as_of` are omitted.
pub fn latest_per_symbol(derived: &DerivedPanel, as_of: NaiveDate) -> Vec<FactorRow> {
    derived
        .iter()
        .filter_map(|(symbol, points)| {
            points
                .iter()
                .rev()
                .find(|p| p.date <= as_of)
                .map(|p| FactorRow {
                    symbol: symbol.clone(),
                    date: p.date,
                    value: p.value,
                })
        })
        .collect()
}

/// Run both stages over a visible history and name the result.
pub fn evaluate(
    bars: Vec<Bar>,
    transform: &dyn SeriesTransform,
    name: &str,
    symbol_key: &str,
    as_of: NaiveDate,
) -> FactorResult {
    let visible: Vec<Bar> = bars.into_iter().filter(|b| b.date <= as_of).collect();
    let panel = group_by_symbol(visible);
    let derived = derive(&panel, transform);
    let rows = latest_per_symbol(&derived, as_of);

    tracing::debug!(
        factor = name,
        transform = transform.name(),
        as_of = %as_of,
        symbols = rows.len(),
        "factor evaluated"
    );
    FactorResult::new(name, symbol_key, as_of, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{FieldValue, PriceField, Sma};

    fn bar(day: u32, symbol: &str, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            symbol: symbol.into(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            volume_valued: 0.0,
        }
    }

    #[test]
    fn grouping_sorts_each_symbol_by_date() {
        let panel = group_by_symbol(vec![bar(3, "A", 3.0), bar(2, "B", 1.0), bar(2, "A", 2.0)]);
        assert_eq!(panel.len(), 2);
        let a: Vec<f64> = panel["A"].iter().map(|b| b.close).collect();
        assert_eq!(a, vec![2.0, 3.0]);
    }

    #[test]
    fn latest_skips_points_after_as_of() {
        let mut derived = DerivedPanel::new();
        derived.insert(
            "A".into(),
            vec![
                DerivedPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    value: Some(1.0),
                },
                DerivedPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                    value: Some(2.0),
                },
            ],
        );
        derived.insert("B".into(), Vec::new());

        let rows = latest_per_symbol(&derived, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, Some(1.0));
    }

    #[test]
    fn evaluate_keeps_symbols_that_stopped_trading() {
        // B has no bar on the last date but still reports its latest value
        let bars = vec![bar(2, "A", 1.0), bar(2, "B", 5.0), bar(3, "A", 2.0)];
        let transform = FieldValue::new(PriceField::Close);
        let result = evaluate(
            bars,
            &transform,
            "close",
            "code",
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        );

        assert_eq!(result.len(), 2);
        assert_eq!(result.value("A"), Some(2.0));
        assert_eq!(result.get("B").unwrap().date.to_string(), "2024-01-02");
    }

    #[test]
    fn evaluate_reports_null_for_short_history() {
        let bars = vec![bar(2, "A", 1.0), bar(3, "A", 2.0)];
        let sma = Sma::new(5).unwrap();
        let result = evaluate(
            bars,
            &sma,
            "sma5",
            "code",
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.value("A"), None);
    }
}
