//! Concrete factor providers over the stock and index tables.
//!
//! Parquet reads and series transforms are CPU/disk bound, so every fetch runs
//! on the blocking pool and joins back into the async caller.

use super::descriptor::{FactorDescriptor, FactorKind};
use super::pipeline;
use super::provider::FactorProvider;
use super::result::FactorResult;
use crate::data::{DatasetStore, Datasets};
use crate::domain::DatasetKind;
use crate::error::{DataError, Result};
use crate::indicators::{
    ExtremeField, FieldValue, MomentumBasis, PriceField, RelativeStrength, RollingExtreme,
    SeriesTransform, SignMomentum, Sma, SmaMomentum,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Reject a descriptor asking for something other than what the provider
/// was built to compute.
fn ensure_kind(built: &FactorKind, factor: &FactorDescriptor) -> Result<()> {
    if &factor.kind == built {
        return Ok(());
    }
    Err(DataError::InvalidParameter {
        factor: built.tag(),
        reason: format!(
            "provider computes {built:?}, descriptor '{}' asks for {:?}",
            factor.column_name(),
            factor.kind
        ),
    })
}

/// Evaluate `transform` over `store` on the blocking pool.
async fn evaluate_store(
    store: &DatasetStore,
    transform: Arc<dyn SeriesTransform>,
    name: String,
    symbol_key: &str,
    as_of: NaiveDate,
) -> Result<FactorResult> {
    let store = store.clone();
    let symbol_key = symbol_key.to_string();
    tokio::task::spawn_blocking(move || {
        let bars = store.load_until(as_of)?;
        Ok(pipeline::evaluate(
            bars,
            transform.as_ref(),
            &name,
            &symbol_key,
            as_of,
        ))
    })
    .await?
}

/// Latest observed value of one stored column per symbol.
pub struct PriceProvider {
    store: DatasetStore,
    kind: FactorKind,
    transform: Arc<FieldValue>,
}

impl PriceProvider {
    pub fn new(store: DatasetStore, field: PriceField) -> Self {
        Self {
            store,
            kind: FactorKind::Price {
                field: field.as_str().to_string(),
            },
            transform: Arc::new(FieldValue::new(field)),
        }
    }

    /// Fails with `InvalidField` if `field` is not a stored column.
    pub fn parse(store: DatasetStore, field: &str) -> Result<Self> {
        Ok(Self::new(store, field.parse()?))
    }
}

#[async_trait]
impl FactorProvider for PriceProvider {
    async fn fetch(&self, factor: &FactorDescriptor, as_of: NaiveDate) -> Result<FactorResult> {
        ensure_kind(&self.kind, factor)?;
        evaluate_store(
            &self.store,
            self.transform.clone(),
            factor.column_name(),
            self.symbol_key_name(),
            as_of,
        )
        .await
    }
}

/// Simple moving average of close.
pub struct SmaProvider {
    store: DatasetStore,
    kind: FactorKind,
    transform: Arc<Sma>,
}

impl SmaProvider {
    pub fn new(store: DatasetStore, window: usize) -> Result<Self> {
        Ok(Self {
            store,
            kind: FactorKind::Sma { window },
            transform: Arc::new(Sma::new(window)?),
        })
    }
}

#[async_trait]
impl FactorProvider for SmaProvider {
    async fn fetch(&self, factor: &FactorDescriptor, as_of: NaiveDate) -> Result<FactorResult> {
        ensure_kind(&self.kind, factor)?;
        evaluate_store(
            &self.store,
            self.transform.clone(),
            factor.column_name(),
            self.symbol_key_name(),
            as_of,
        )
        .await
    }
}

/// Calendar-window high or low (e.g. 52-week high).
pub struct RollingExtremeProvider {
    store: DatasetStore,
    kind: FactorKind,
    transform: Arc<RollingExtreme>,
}

impl RollingExtremeProvider {
    /// Fails with `InvalidField` unless `field` is "high" or "low".
    pub fn new(store: DatasetStore, weeks: u32, field: &str) -> Result<Self> {
        let field: ExtremeField = field.parse()?;
        Ok(Self {
            store,
            kind: FactorKind::RollingExtreme {
                weeks,
                field: field.as_str().to_string(),
            },
            transform: Arc::new(RollingExtreme::new(weeks, field)?),
        })
    }
}

#[async_trait]
impl FactorProvider for RollingExtremeProvider {
    async fn fetch(&self, factor: &FactorDescriptor, as_of: NaiveDate) -> Result<FactorResult> {
        ensure_kind(&self.kind, factor)?;
        evaluate_store(
            &self.store,
            self.transform.clone(),
            factor.column_name(),
            self.symbol_key_name(),
            as_of,
        )
        .await
    }
}

pub struct SmaMomentumProvider {
    store: DatasetStore,
    kind: FactorKind,
    transform: Arc<SmaMomentum>,
}

impl SmaMomentumProvider {
    pub fn new(
        store: DatasetStore,
        window: usize,
        period: usize,
        basis: MomentumBasis,
    ) -> Result<Self> {
        Ok(Self {
            store,
            kind: FactorKind::SmaMomentum {
                window,
                period,
                basis,
            },
            transform: Arc::new(SmaMomentum::new(window, period, basis)?),
        })
    }
}

#[async_trait]
impl FactorProvider for SmaMomentumProvider {
    async fn fetch(&self, factor: &FactorDescriptor, as_of: NaiveDate) -> Result<FactorResult> {
        ensure_kind(&self.kind, factor)?;
        evaluate_store(
            &self.store,
            self.transform.clone(),
            factor.column_name(),
            self.symbol_key_name(),
            as_of,
        )
        .await
    }
}

pub struct SignMomentumProvider {
    store: DatasetStore,
    kind: FactorKind,
    transform: Arc<SignMomentum>,
}

impl SignMomentumProvider {
    pub fn new(store: DatasetStore, period: usize) -> Result<Self> {
        Ok(Self {
            store,
            kind: FactorKind::SignMomentum { period },
            transform: Arc::new(SignMomentum::new(period)?),
        })
    }
}

#[async_trait]
impl FactorProvider for SignMomentumProvider {
    async fn fetch(&self, factor: &FactorDescriptor, as_of: NaiveDate) -> Result<FactorResult> {
        ensure_kind(&self.kind, factor)?;
        evaluate_store(
            &self.store,
            self.transform.clone(),
            factor.column_name(),
            self.symbol_key_name(),
            as_of,
        )
        .await
    }
}

/// Stock daily return relative to a benchmark index's daily return.
pub struct RelativeStrengthProvider {
    stock: DatasetStore,
    index: DatasetStore,
    benchmark: String,
}

impl RelativeStrengthProvider {
    pub fn new(stock: DatasetStore, index: DatasetStore, benchmark: impl Into<String>) -> Self {
        Self {
            stock,
            index,
            benchmark: benchmark.into(),
        }
    }
}

#[async_trait]
impl FactorProvider for RelativeStrengthProvider {
    async fn fetch(&self, factor: &FactorDescriptor, as_of: NaiveDate) -> Result<FactorResult> {
        ensure_kind(
            &FactorKind::RelativeStrength {
                benchmark: self.benchmark.clone(),
            },
            factor,
        )?;
        let index = self.index.clone();
        let benchmark = self.benchmark.clone();
        let transform = tokio::task::spawn_blocking(move || -> Result<RelativeStrength> {
            let mut bars = index.load_until(as_of)?;
            bars.retain(|b| b.symbol == benchmark);
            Ok(RelativeStrength::from_index_bars(&bars))
        })
        .await??;

        if transform.benchmark_len() == 0 {
            tracing::warn!(
                benchmark = %self.benchmark,
                as_of = %as_of,
                "benchmark has no rows; relative strength will be empty"
            );
        }

        evaluate_store(
            &self.stock,
            Arc::new(transform),
            factor.column_name(),
            self.symbol_key_name(),
            as_of,
        )
        .await
    }
}

/// Build the provider for a factor kind over the configured tables.
///
/// Parameter and field errors surface here, before any data is read.
pub fn build_provider(kind: &FactorKind, datasets: &Datasets) -> Result<Box<dyn FactorProvider>> {
    let stock = datasets.get(DatasetKind::Stock).clone();
    let provider: Box<dyn FactorProvider> = match kind {
        FactorKind::Price { field } => Box::new(PriceProvider::parse(stock, field)?),
        FactorKind::Sma { window } => Box::new(SmaProvider::new(stock, *window)?),
        FactorKind::RollingExtreme { weeks, field } => {
            Box::new(RollingExtremeProvider::new(stock, *weeks, field)?)
        }
        FactorKind::SmaMomentum {
            window,
            period,
            basis,
        } => Box::new(SmaMomentumProvider::new(stock, *window, *period, *basis)?),
        FactorKind::SignMomentum { period } => {
            Box::new(SignMomentumProvider::new(stock, *period)?)
        }
        FactorKind::RelativeStrength { benchmark } => Box::new(RelativeStrengthProvider::new(
            stock,
            datasets.get(DatasetKind::Index).clone(),
            benchmark.clone(),
        )),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::error::DataError;

    fn bar(day: u32, symbol: &str, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            symbol: symbol.into(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
            volume_valued: close * 1_000.0,
        }
    }

    fn datasets(dir: &tempfile::TempDir) -> Datasets {
        Datasets::new(
            dir.path().join("kr_stock_ohlcv.parquet"),
            dir.path().join("index.parquet"),
        )
    }

    #[test]
    fn build_rejects_bad_field_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_provider(
            &FactorKind::RollingExtreme {
                weeks: 52,
                field: "close".into(),
            },
            &datasets(&dir),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DataError::InvalidField { .. }));

        let err = build_provider(&FactorKind::Sma { window: 0 }, &datasets(&dir))
            .err()
            .unwrap();
        assert!(matches!(err, DataError::InvalidParameter { .. }));

        let err = build_provider(
            &FactorKind::RollingExtreme {
                weeks: u32::MAX,
                field: "high".into(),
            },
            &datasets(&dir),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DataError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn missing_table_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = build_provider(&FactorKind::Sma { window: 2 }, &datasets(&dir)).unwrap();
        let err = provider
            .fetch(
                &FactorDescriptor::sma(2),
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn price_uses_descriptor_name() {
        let dir = tempfile::tempdir().unwrap();
        let sets = datasets(&dir);
        sets.get(DatasetKind::Stock)
            .write(&[bar(4, "005930", 70_000.0), bar(5, "005930", 71_000.0)])
            .unwrap();

        let descriptor = FactorDescriptor::price("close").named("last");
        let provider = build_provider(&descriptor.kind, &sets).unwrap();
        let result = provider
            .fetch(&descriptor, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
            .await
            .unwrap();

        assert_eq!(result.name(), "last");
        assert_eq!(provider.symbol_key_name(), "code");
        assert_eq!(result.symbol_key(), provider.symbol_key_name());
        assert_eq!(result.value("005930"), Some(70_000.0));
    }

    #[tokio::test]
    async fn descriptor_of_another_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sets = datasets(&dir);
        sets.get(DatasetKind::Stock)
            .write(&(1..=9).map(|d| bar(d, "A", f64::from(d))).collect::<Vec<_>>())
            .unwrap();
        let day9 = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        let provider = SmaProvider::new(sets.get(DatasetKind::Stock).clone(), 2).unwrap();
        let err = provider
            .fetch(&FactorDescriptor::sma(5), day9)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidParameter { factor: "sma", .. }));

        let err = provider
            .fetch(&FactorDescriptor::price("close"), day9)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidParameter { .. }));

        // same kind under a custom name is fine
        let result = provider
            .fetch(&FactorDescriptor::sma(2).named("fast"), day9)
            .await
            .unwrap();
        assert_eq!(result.name(), "fast");
        assert_eq!(result.value("A"), Some(8.5));
    }

    #[tokio::test]
    async fn relative_strength_filters_to_benchmark() {
        let dir = tempfile::tempdir().unwrap();
        let sets = datasets(&dir);
        sets.get(DatasetKind::Stock)
            .write(&[bar(4, "A", 100.0), bar(5, "A", 102.0)])
            .unwrap();
        sets.get(DatasetKind::Index)
            .write(&[
                bar(4, "kospi", 1000.0),
                bar(5, "kospi", 1010.0),
                bar(4, "kosdaq", 500.0),
                bar(5, "kosdaq", 600.0),
            ])
            .unwrap();

        let descriptor = FactorDescriptor::relative_strength();
        let provider = build_provider(&descriptor.kind, &sets).unwrap();
        let result = provider
            .fetch(&descriptor, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
            .await
            .unwrap();

        let rs = result.value("A").unwrap();
        assert!((rs - 2.0).abs() < 1e-9, "rs = {rs}");
    }
}
