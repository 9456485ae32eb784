//! Configuration file (TOML).
//!
//! ```toml
//! [store]
//! stock_path = "resource/kr_stock_ohlcv.parquet"
//! index_path = "resource/index.parquet"
//!
//! [krx]
//! timeout_secs = 30
//!
//! [[factors]]
//! type = "sma"
//! window = 20
//! ```
//!
//! Every section is optional and falls back to its defaults.

use crate::data::Datasets;
use crate::error::{DataError, Result};
use crate::factors::FactorDescriptor;
use crate::krx::KrxConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub stock_path: PathBuf,
    pub index_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            stock_path: PathBuf::from("resource/kr_stock_ohlcv.parquet"),
            index_path: PathBuf::from("resource/index.parquet"),
        }
    }
}

impl StoreConfig {
    pub fn datasets(&self) -> Datasets {
        Datasets::new(&self.stock_path, &self.index_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FactorLabConfig {
    pub store: StoreConfig,
    pub krx: KrxConfig,
    pub factors: Vec<FactorDescriptor>,
}

impl FactorLabConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| DataError::InvalidParameter {
            factor: "config",
            reason: e.to_string(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DataError::unavailable(path, e))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(
            path = %path.display(),
            factors = config.factors.len(),
            "config loaded"
        );
        Ok(config)
    }

    /// The configured factors, or a default set when none are declared.
    pub fn factors_or_default(&self) -> Vec<FactorDescriptor> {
        if self.factors.is_empty() {
            default_factors()
        } else {
            self.factors.clone()
        }
    }
}

/// Close, SMA(20), 52-week high/low, SMA momentum and relative strength.
pub fn default_factors() -> Vec<FactorDescriptor> {
    vec![
        FactorDescriptor::price("close"),
        FactorDescriptor::sma(20),
        FactorDescriptor::rolling_extreme(52, "high"),
        FactorDescriptor::rolling_extreme(52, "low"),
        FactorDescriptor::sma_momentum(20, 5),
        FactorDescriptor::relative_strength(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::FactorKind;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = FactorLabConfig::from_toml("").unwrap();
        assert_eq!(config, FactorLabConfig::default());
        assert_eq!(config.factors_or_default().len(), 6);
    }

    #[test]
    fn reads_every_section() {
        let config = FactorLabConfig::from_toml(
            r#"
[store]
stock_path = "/data/stock.parquet"

[krx]
timeout_secs = 10

[[factors]]
type = "rolling_extreme"
weeks = 26
field = "low"

[[factors]]
name = "close"
type = "price"
field = "close"
"#,
        )
        .unwrap();

        assert_eq!(config.store.stock_path, PathBuf::from("/data/stock.parquet"));
        assert_eq!(config.store.index_path, StoreConfig::default().index_path);
        assert_eq!(config.krx.timeout_secs, 10);
        assert_eq!(config.factors.len(), 2);
        assert_eq!(config.factors[0].column_name(), "low26");
        assert!(matches!(config.factors[1].kind, FactorKind::Price { .. }));
    }

    #[test]
    fn unknown_factor_type_is_rejected() {
        let err = FactorLabConfig::from_toml("[[factors]]\ntype = \"vwap\"\n").unwrap_err();
        assert!(matches!(err, DataError::InvalidParameter { .. }));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = FactorLabConfig::from_file("/nonexistent/factorlab.toml").unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }
}
