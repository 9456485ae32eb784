//! FactorLab Core: dataset store, factor providers, KRX client, ingestion.
//!
//! This crate contains:
//! - Domain types (daily bars, dataset kinds)
//! - Parquet dataset store with staged, atomic writes
//! - Series transforms (SMA, rolling extremes, momentum, relative strength)
//! - Factor providers that evaluate a cross-section as of a date
//! - KRX data portal client and the daily ingestion job

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod factors;
pub mod indicators;
pub mod ingest;
pub mod krx;

pub use error::{DataError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared across tasks are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<data::Datasets>();
        require_sync::<data::Datasets>();
        require_send::<factors::FactorResult>();
        require_sync::<factors::FactorResult>();
        require_send::<factors::FactorDescriptor>();
        require_sync::<factors::FactorDescriptor>();
        require_send::<krx::KrxClient>();
        require_sync::<krx::KrxClient>();
        require_send::<error::DataError>();
        require_sync::<error::DataError>();
        require_send::<Box<dyn factors::FactorProvider>>();
        require_sync::<Box<dyn factors::FactorProvider>>();
    }
}
