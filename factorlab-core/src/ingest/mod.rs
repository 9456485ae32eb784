//! Daily ingestion: fetch one trading day from the market data source and
//! merge it into the stock and index tables.

pub mod calendar;
pub mod job;
pub mod source;

pub use calendar::is_weekend;
pub use job::{IngestOutcome, IngestionJob};
pub use source::MarketDataSource;
