//! Raw field passthrough (the Price factor).

use super::{present, zip_dates, DerivedPoint, SeriesTransform};
use crate::domain::Bar;
use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A numeric column of the bar tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
    VolumeValued,
}

impl PriceField {
    pub const EXPECTED: &'static str = "open, high, low, close, volume, volume_valued";

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
            PriceField::VolumeValued => "volume_valued",
        }
    }

    pub fn value(&self, bar: &Bar) -> f64 {
        match self {
            PriceField::Open => bar.open,
            PriceField::High => bar.high,
            PriceField::Low => bar.low,
            PriceField::Close => bar.close,
            PriceField::Volume => bar.volume,
            PriceField::VolumeValued => bar.volume_valued,
        }
    }
}

impl FromStr for PriceField {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "volume" => Ok(PriceField::Volume),
            "volume_valued" => Ok(PriceField::VolumeValued),
            other => Err(DataError::InvalidField {
                factor: "price",
                field: other.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

/// Emits the observed value of one field on each bar.
#[derive(Debug, Clone)]
pub struct FieldValue {
    field: PriceField,
}

impl FieldValue {
    pub fn new(field: PriceField) -> Self {
        Self { field }
    }
}

impl SeriesTransform for FieldValue {
    fn name(&self) -> &str {
        self.field.as_str()
    }

    fn apply(&self, bars: &[Bar]) -> Vec<DerivedPoint> {
        let values = bars.iter().map(|b| present(self.field.value(b))).collect();
        zip_dates(bars, values)
    }
}
