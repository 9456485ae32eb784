//! Series transforms: one symbol's bar history in, a derived series out.
//!
//! Transforms are pure and causal: the value at bar t depends only on bars
//! 0..=t. They run over a symbol's entire visible history; the factor
//! pipeline then keeps the latest point. Missing inputs (NaN) and
//! insufficient history both yield `None`.

pub mod field;
pub mod momentum;
pub mod relative_strength;
pub mod rolling_extreme;
pub mod sma;

pub use field::{FieldValue, PriceField};
pub use momentum::{MomentumBasis, SignMomentum, SmaMomentum};
pub use relative_strength::{pct_change, RelativeStrength};
pub use rolling_extreme::{ExtremeField, RollingExtreme};
pub use sma::{rolling_mean, Sma};

use crate::domain::Bar;
use chrono::NaiveDate;

/// One point of a derived series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Trait for series transforms.
///
/// `bars` holds a single symbol's history sorted by date ascending. The output
/// normally has one point per input bar; a transform that joins against
/// another series (relative strength) may drop dates the join cannot match.
pub trait SeriesTransform: Send + Sync {
    /// Human-readable name (e.g., "sma20", "high52").
    fn name(&self) -> &str;

    /// Compute the derived series for one symbol.
    fn apply(&self, bars: &[Bar]) -> Vec<DerivedPoint>;
}

/// NaN is treated as a missing observation.
pub(crate) fn present(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Pair each bar's date with a computed value.
pub(crate) fn zip_dates(bars: &[Bar], values: Vec<Option<f64>>) -> Vec<DerivedPoint> {
    bars.iter()
        .zip(values)
        .map(|(bar, value)| DerivedPoint {
            date: bar.date,
            value,
        })
        .collect()
}

/// Create synthetic bars from close prices for testing.
///
/// One bar per calendar day starting 2024-01-01; high = close + 1,
/// low = close - 1, open = close.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            symbol: "TEST".to_string(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
            volume_valued: close * 1000.0,
        })
        .collect()
}

/// Assert an optional value is present and approximately equal.
#[cfg(test)]
pub fn assert_approx(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
    assert!(
        (actual - expected).abs() < 1e-10,
        "assert_approx failed: actual={actual}, expected={expected}"
    );
}

#[cfg(test)]
pub fn values(points: &[DerivedPoint]) -> Vec<Option<f64>> {
    points.iter().map(|p| p.value).collect()
}
