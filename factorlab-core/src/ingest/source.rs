//! Market data source trait.
//!
//! The ingestion job only depends on this trait so tests can substitute an
//! in-memory source for the KRX client.

use crate::domain::Bar;
use crate::error::Result;
use crate::krx::KrxClient;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Exchange holidays (weekdays without trading) of `year`.
    async fn holidays(&self, year: i32) -> Result<BTreeSet<NaiveDate>>;

    /// All stock bars traded on `date`.
    async fn stock_bars(&self, date: NaiveDate) -> Result<Vec<Bar>>;

    /// Benchmark index bars for `date`.
    async fn index_bars(&self, date: NaiveDate) -> Result<Vec<Bar>>;
}

#[async_trait]
impl MarketDataSource for KrxClient {
    async fn holidays(&self, year: i32) -> Result<BTreeSet<NaiveDate>> {
        self.fetch_holidays(year).await
    }

    async fn stock_bars(&self, date: NaiveDate) -> Result<Vec<Bar>> {
        self.fetch_stock_bars(date).await
    }

    async fn index_bars(&self, date: NaiveDate) -> Result<Vec<Bar>> {
        self.fetch_index_bars(date).await
    }
}
