//! Ingestion job.
//!
//! Both datasets move together: both remote fetches must succeed and both
//! merged tables are staged to temp files before either is renamed into
//! place. A failed run leaves the store as it was.

use super::calendar::is_weekend;
use super::source::MarketDataSource;
use crate::data::Datasets;
use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Saturday or Sunday; nothing fetched.
    Weekend,
    /// Exchange holiday; nothing fetched beyond the calendar.
    Holiday,
    Ingested {
        /// Rows fetched for the date.
        stock_rows: usize,
        index_rows: usize,
        /// Table sizes after the merge.
        stock_total: usize,
        index_total: usize,
    },
}

pub struct IngestionJob<S> {
    source: S,
    datasets: Datasets,
}

impl<S: MarketDataSource> IngestionJob<S> {
    pub fn new(source: S, datasets: Datasets) -> Self {
        Self { source, datasets }
    }

    pub fn datasets(&self) -> &Datasets {
        &self.datasets
    }

    /// Whether the exchange is closed on `date`.
    pub async fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        if is_weekend(date) {
            return Ok(true);
        }
        let holidays = self.source.holidays(date.year()).await?;
        Ok(holidays.contains(&date))
    }

    pub async fn run(&self, date: NaiveDate) -> Result<IngestOutcome> {
        if is_weekend(date) {
            tracing::info!(date = %date, "weekend, nothing to ingest");
            return Ok(IngestOutcome::Weekend);
        }
        if self.is_holiday(date).await? {
            tracing::info!(date = %date, "exchange holiday, nothing to ingest");
            return Ok(IngestOutcome::Holiday);
        }

        let (stock, index) = tokio::try_join!(
            self.source.stock_bars(date),
            self.source.index_bars(date)
        )?;
        let stock_rows = stock.len();
        let index_rows = index.len();
        // a trading day always has both; an empty side means the report changed
        if stock_rows == 0 || index_rows == 0 {
            tracing::warn!(
                date = %date,
                stock_rows,
                index_rows,
                "source returned an empty report"
            );
            return Err(DataError::RemoteRequestFailed(format!(
                "{date}: trading day returned {stock_rows} stock rows and {index_rows} index rows"
            )));
        }

        let datasets = self.datasets.clone();
        let (stock_total, index_total) = tokio::task::spawn_blocking(move || -> Result<_> {
            let stock_stage = datasets.stock.merge(stock)?;
            let index_stage = datasets.index.merge(index)?;
            let totals = (stock_stage.rows(), index_stage.rows());
            stock_stage.commit()?;
            index_stage.commit()?;
            Ok(totals)
        })
        .await??;

        tracing::info!(
            date = %date,
            stock_rows,
            index_rows,
            stock_total,
            index_total,
            "ingestion complete"
        );
        Ok(IngestOutcome::Ingested {
            stock_rows,
            index_rows,
            stock_total,
            index_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataSource for CountingSource {
        async fn holidays(&self, _year: i32) -> Result<BTreeSet<NaiveDate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok([NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()].into())
        }

        async fn stock_bars(&self, _date: NaiveDate) -> Result<Vec<Bar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn index_bars(&self, _date: NaiveDate) -> Result<Vec<Bar>> {
            Err(DataError::RemoteRequestFailed("unreachable".into()))
        }
    }

    fn job(dir: &tempfile::TempDir) -> IngestionJob<CountingSource> {
        IngestionJob::new(
            CountingSource::default(),
            Datasets::new(dir.path().join("stock.parquet"), dir.path().join("index.parquet")),
        )
    }

    #[tokio::test]
    async fn weekend_skips_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(&dir);
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert_eq!(job.run(saturday).await.unwrap(), IngestOutcome::Weekend);
        assert_eq!(job.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn holiday_skips_the_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(&dir);
        let new_year = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(job.run(new_year).await.unwrap(), IngestOutcome::Holiday);
        assert_eq!(job.source.calls.load(Ordering::SeqCst), 1);
        assert!(!job.datasets().stock.exists());
    }

    #[tokio::test]
    async fn fetch_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(&dir);
        let err = job
            .run(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::RemoteRequestFailed(_)));
        assert!(!job.datasets().stock.exists());
        assert!(!job.datasets().index.exists());
    }
}
