//! Rolling high / low over a trailing calendar window of N weeks.
//!
//! The window for a bar dated t covers (t - 7·weeks days, t], so a 52-week
//! high on a daily series is the max high of the last 364 calendar days
//! including today. Missing values inside the window are skipped.

use super::{present, zip_dates, DerivedPoint, SeriesTransform};
use crate::domain::Bar;
use crate::error::{DataError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeField {
    /// Max of `high`.
    High,
    /// Min of `low`.
    Low,
}

impl ExtremeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtremeField::High => "high",
            ExtremeField::Low => "low",
        }
    }
}

impl FromStr for ExtremeField {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "high" => Ok(ExtremeField::High),
            "low" => Ok(ExtremeField::Low),
            other => Err(DataError::InvalidField {
                factor: "rolling_extreme",
                field: other.to_string(),
                expected: "high, low",
            }),
        }
    }
}

/// Longest accepted window, about a century.
pub const MAX_WEEKS: u32 = 5_200;

#[derive(Debug, Clone)]
pub struct RollingExtreme {
    weeks: u32,
    field: ExtremeField,
    name: String,
}

impl RollingExtreme {
    pub fn new(weeks: u32, field: ExtremeField) -> Result<Self> {
        if weeks == 0 || weeks > MAX_WEEKS {
            return Err(DataError::InvalidParameter {
                factor: "rolling_extreme",
                reason: format!("weeks must be in 1..={MAX_WEEKS}, got {weeks}"),
            });
        }
        Ok(Self {
            weeks,
            field,
            name: format!("{}{weeks}", field.as_str()),
        })
    }

    /// Parse the field name, rejecting anything but `high` / `low`.
    pub fn parse(weeks: u32, field: &str) -> Result<Self> {
        Self::new(weeks, field.parse()?)
    }

    fn span(&self) -> Duration {
        Duration::weeks(i64::from(self.weeks))
    }
}

impl SeriesTransform for RollingExtreme {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, bars: &[Bar]) -> Vec<DerivedPoint> {
        let span = self.span();
        let mut values = Vec::with_capacity(bars.len());
        let mut start = 0;

        for (i, bar) in bars.iter().enumerate() {
            if let Some(cutoff) = bar.date.checked_sub_signed(span) {
                while bars[start].date <= cutoff {
                    start += 1;
                }
            }

            let window = bars[start..=i].iter();
            let value = match self.field {
                ExtremeField::High => window
                    .filter_map(|b| present(b.high))
                    .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v)))),
                ExtremeField::Low => window
                    .filter_map(|b| present(b.low))
                    .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v)))),
            };
            values.push(value);
        }

        zip_dates(bars, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars, values};

    #[test]
    fn one_week_high_drops_bars_older_than_seven_days() {
        // Daily bars, highs 11, 12, ..., 20
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0]);
        let out = values(&RollingExtreme::new(1, ExtremeField::High).unwrap().apply(&bars));

        assert_eq!(out[0], Some(11.0));
        assert_eq!(out[9], Some(20.0));
    }

    #[test]
    fn one_week_low_covers_exactly_seven_days() {
        // Falling series, then a jump: the low stays in the window for seven days
        let bars = make_bars(&[20.0, 19.0, 18.0, 17.0, 16.0, 15.0, 14.0, 30.0, 30.0]);
        let out = values(&RollingExtreme::new(1, ExtremeField::Low).unwrap().apply(&bars));

        // bar 7 (day 8) window = days 2..=8 → lows 18..13, 29 → min 13
        assert_eq!(out[7], Some(13.0));
        // bar 8 (day 9) window = days 3..=9 → min 13
        assert_eq!(out[8], Some(13.0));
    }

    #[test]
    fn window_boundary_is_exclusive_on_the_left() {
        let mut bars = make_bars(&[50.0, 10.0]);
        // Exactly 7 days apart: the older bar falls out of a 1-week window
        bars[1].date = bars[0].date + Duration::days(7);
        let out = values(&RollingExtreme::new(1, ExtremeField::High).unwrap().apply(&bars));
        assert_eq!(out[1], Some(11.0));
    }

    #[test]
    fn missing_values_are_skipped() {
        let mut bars = make_bars(&[10.0, 30.0, 12.0]);
        bars[1].high = f64::NAN;
        let out = values(&RollingExtreme::new(4, ExtremeField::High).unwrap().apply(&bars));
        assert_eq!(out[2], Some(13.0));
    }

    #[test]
    fn bogus_field_is_invalid() {
        let err = RollingExtreme::parse(52, "bogus_field").unwrap_err();
        assert!(matches!(err, DataError::InvalidField { field, .. } if field == "bogus_field"));
    }

    #[test]
    fn weeks_outside_the_date_range_are_invalid() {
        for weeks in [0, MAX_WEEKS + 1, u32::MAX] {
            let err = RollingExtreme::new(weeks, ExtremeField::High).unwrap_err();
            assert!(matches!(err, DataError::InvalidParameter { .. }), "weeks = {weeks}");
        }

        let bars = make_bars(&[10.0, 12.0, 11.0]);
        let widest = RollingExtreme::new(MAX_WEEKS, ExtremeField::High).unwrap();
        let out = values(&widest.apply(&bars));
        assert_eq!(out[2], Some(13.0));
    }

    #[test]
    fn name_follows_field_and_weeks() {
        assert_eq!(RollingExtreme::parse(52, "low").unwrap().name(), "low52");
    }
}
