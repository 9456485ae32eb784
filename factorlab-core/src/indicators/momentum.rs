//! Momentum factors.
//!
//! `SmaMomentum`: lagged one-step difference.
//!   basis=close: momentum[t] = close[t-P] - close[t-P-1]
//!   basis=sma:   momentum[t] = sma[t-P] - sma[t-P-1]
//!
//! `SignMomentum`: sum of sign(return) over the trailing P observations,
//! where the first return of a series is 0.

use super::relative_strength::pct_change;
use super::sma::rolling_mean;
use super::{present, zip_dates, DerivedPoint, SeriesTransform};
use crate::domain::Bar;
use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};

/// Which series the lagged difference is taken over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumBasis {
    /// Difference of raw closes (the SMA is computed but does not feed the result).
    #[default]
    Close,
    /// Difference of the SMA series.
    Sma,
}

#[derive(Debug, Clone)]
pub struct SmaMomentum {
    window: usize,
    period: usize,
    basis: MomentumBasis,
}

impl SmaMomentum {
    pub fn new(window: usize, period: usize, basis: MomentumBasis) -> Result<Self> {
        if window == 0 {
            return Err(DataError::InvalidParameter {
                factor: "sma_momentum",
                reason: "window must be >= 1".into(),
            });
        }
        Ok(Self {
            window,
            period,
            basis,
        })
    }
}

impl SeriesTransform for SmaMomentum {
    fn name(&self) -> &str {
        "sma_momentum"
    }

    fn apply(&self, bars: &[Bar]) -> Vec<DerivedPoint> {
        let closes: Vec<Option<f64>> = bars.iter().map(|b| present(b.close)).collect();
        let base = match self.basis {
            MomentumBasis::Close => closes,
            MomentumBasis::Sma => rolling_mean(&closes, self.window),
        };
        zip_dates(bars, shift(&diff(&base), self.period))
    }
}

#[derive(Debug, Clone)]
pub struct SignMomentum {
    period: usize,
    name: String,
}

impl SignMomentum {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(DataError::InvalidParameter {
                factor: "sign_momentum",
                reason: "period must be >= 1".into(),
            });
        }
        Ok(Self {
            period,
            name: format!("sign_momentum{period}"),
        })
    }
}

impl SeriesTransform for SignMomentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, bars: &[Bar]) -> Vec<DerivedPoint> {
        let signs: Vec<Option<f64>> = pct_change(bars)
            .into_iter()
            .map(|r| {
                r.map(|r| {
                    if r > 0.0 {
                        1.0
                    } else if r < 0.0 {
                        -1.0
                    } else {
                        0.0
                    }
                })
            })
            .collect();
        // rolling sum = rolling mean * period
        let sums = rolling_mean(&signs, self.period)
            .into_iter()
            .map(|m| m.map(|m| (m * self.period as f64).round()))
            .collect();
        zip_dates(bars, sums)
    }
}

/// One-step difference; the first element has no predecessor.
fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let d = match (i.checked_sub(1).and_then(|p| values[p]), values[i]) {
            (Some(prev), Some(curr)) => Some(curr - prev),
            _ => None,
        };
        out.push(d);
    }
    out
}

/// Lag a series by `period` positions, filling the head with missing values.
fn shift(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(period).and_then(|j| values[j]))
        .collect()
}
