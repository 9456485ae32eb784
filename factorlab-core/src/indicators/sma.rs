//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over the trailing `window` observations.
//! The first valid value is at index window-1; any missing close inside the
//! window makes that point missing.

use super::{present, zip_dates, DerivedPoint, SeriesTransform};
use crate::domain::Bar;
use crate::error::{DataError, Result};

#[derive(Debug, Clone)]
pub struct Sma {
    window: usize,
    name: String,
}

impl Sma {
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(DataError::InvalidParameter {
                factor: "sma",
                reason: "window must be >= 1".into(),
            });
        }
        Ok(Self {
            window,
            name: format!("sma{window}"),
        })
    }
}

impl SeriesTransform for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, bars: &[Bar]) -> Vec<DerivedPoint> {
        let closes: Vec<Option<f64>> = bars.iter().map(|b| present(b.close)).collect();
        zip_dates(bars, rolling_mean(&closes, self.window))
    }
}

/// Trailing mean over `window` observations.
///
/// Keeps a running sum and a count of missing values in the window, so a
/// missing input only poisons the windows that contain it.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if window == 0 || n < window {
        return result;
    }

    let mut sum = 0.0;
    let mut missing = 0usize;
    for i in 0..n {
        match values[i] {
            Some(v) => sum += v,
            None => missing += 1,
        }
        if i >= window {
            match values[i - window] {
                Some(v) => sum -= v,
                None => missing -= 1,
            }
        }
        if i + 1 >= window && missing == 0 {
            result[i] = Some(sum / window as f64);
        }
    }

    result
}
