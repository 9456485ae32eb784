//! Parquet-backed dataset tables

pub mod schema;
pub mod store;

pub use schema::{BarSchema, SchemaError, DATE_COLUMN, SYMBOL_COLUMN, VALUE_COLUMNS};
pub use store::{merge_bars, DatasetStore, Datasets, StagedWrite, StoreStatus};
