//! Relative strength versus a benchmark index.
//!
//! rs[t] = return[t] / index_return[t], joined on date. Dates absent from
//! the benchmark are dropped (inner join). A zero benchmark return yields a
//! missing value instead of an infinity.

use super::{present, DerivedPoint, SeriesTransform};
use crate::domain::Bar;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Daily percent change of close. The first observation has no prior value
/// and is 0; a missing close on either side is missing.
pub fn pct_change(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                return Some(0.0);
            }
            match (present(bars[i - 1].close), present(bar.close)) {
                (Some(prev), Some(curr)) if prev != 0.0 => Some(curr / prev - 1.0),
                _ => None,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct RelativeStrength {
    index_returns: HashMap<NaiveDate, f64>,
}

impl RelativeStrength {
    /// Build from the benchmark's own bars (one symbol, sorted by date).
    pub fn from_index_bars(index_bars: &[Bar]) -> Self {
        let index_returns = index_bars
            .iter()
            .zip(pct_change(index_bars))
            .filter_map(|(bar, r)| r.map(|r| (bar.date, r)))
            .collect();
        Self { index_returns }
    }

    pub fn benchmark_len(&self) -> usize {
        self.index_returns.len()
    }
}

impl SeriesTransform for RelativeStrength {
    fn name(&self) -> &str {
        "rs"
    }

    fn apply(&self, bars: &[Bar]) -> Vec<DerivedPoint> {
        bars.iter()
            .zip(pct_change(bars))
            .filter_map(|(bar, r)| {
                let index_return = *self.index_returns.get(&bar.date)?;
                let value = match r {
                    Some(r) if index_return != 0.0 => Some(r / index_return),
                    _ => None,
                };
                Some(DerivedPoint {
                    date: bar.date,
                    value,
                })
            })
            .collect()
    }
}
