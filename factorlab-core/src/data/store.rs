//! Parquet dataset store.
//!
//! One file per dataset (`kr_stock_ohlcv.parquet`, `index.parquet`), keyed by
//! `(dt, code)`. Reads and writes are whole-file:
//! - Atomic writes (write to .tmp, rename into place)
//! - Merge = read, concatenate, dedupe on (date, symbol) keeping the new row,
//!   sort, rewrite
//! - Staged writes so two datasets can be committed together
//! - Schema validation on load

use super::schema::{BarSchema, DATE_COLUMN, SYMBOL_COLUMN, VALUE_COLUMNS};
use crate::domain::{Bar, DatasetKind};
use crate::error::{DataError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// A single Parquet-backed table of daily bars.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load every bar in the table, sorted by (date, symbol).
    ///
    /// A missing or unreadable file is `DataUnavailable`.
    pub fn load(&self) -> Result<Vec<Bar>> {
        if !self.exists() {
            return Err(DataError::unavailable(&self.path, "file not found"));
        }

        let df = read_parquet(&self.path).map_err(|e| DataError::unavailable(&self.path, e))?;
        BarSchema::validate(&df).map_err(|e| DataError::unavailable(&self.path, e))?;
        let mut bars =
            dataframe_to_bars(&df).map_err(|e| DataError::unavailable(&self.path, e))?;
        bars.sort_by(|a, b| a.key().cmp(&b.key()));

        tracing::debug!(path = %self.path.display(), rows = bars.len(), "dataset loaded");
        Ok(bars)
    }

    /// Load the bars visible as of `as_of` (date <= as_of).
    pub fn load_until(&self, as_of: NaiveDate) -> Result<Vec<Bar>> {
        let mut bars = self.load()?;
        bars.retain(|b| b.date <= as_of);
        Ok(bars)
    }

    /// Like [`load`](Self::load), but a table that does not exist yet is empty.
    pub fn load_or_empty(&self) -> Result<Vec<Bar>> {
        if self.exists() {
            self.load()
        } else {
            Ok(Vec::new())
        }
    }

    /// Overwrite the table with `bars` atomically.
    pub fn write(&self, bars: &[Bar]) -> Result<()> {
        self.stage(bars)?.commit()
    }

    /// Merge `incoming` into the table and stage the rewritten file.
    pub fn merge(&self, incoming: Vec<Bar>) -> Result<StagedWrite> {
        let existing = self.load_or_empty()?;
        let before = existing.len();
        let merged = merge_bars(existing, incoming);
        tracing::debug!(
            path = %self.path.display(),
            before,
            after = merged.len(),
            "merged dataset staged"
        );
        self.stage(&merged)
    }

    /// Write `bars` to a temp file next to the table without replacing it.
    ///
    /// Nothing is visible to readers until [`StagedWrite::commit`]. Dropping the
    /// stage without committing removes the temp file.
    pub fn stage(&self, bars: &[Bar]) -> Result<StagedWrite> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| DataError::write_failed(parent, format!("create dir: {e}")))?;
            }
        }

        let tmp_path = self.path.with_extension("parquet.tmp");
        let mut df = bars_to_dataframe(bars).map_err(|e| DataError::write_failed(&tmp_path, e))?;
        write_parquet(&mut df, &tmp_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::write_failed(&tmp_path, e)
        })?;

        Ok(StagedWrite {
            tmp_path,
            target: self.path.clone(),
            rows: bars.len(),
            committed: false,
        })
    }

    /// Summary of the table contents.
    pub fn status(&self) -> Result<StoreStatus> {
        let bars = self.load()?;
        let bytes = fs::read(&self.path).map_err(|e| DataError::unavailable(&self.path, e))?;
        let symbols: BTreeSet<&str> = bars.iter().map(|b| b.symbol.as_str()).collect();

        Ok(StoreStatus {
            path: self.path.clone(),
            rows: bars.len(),
            symbols: symbols.len(),
            first_date: bars.first().map(|b| b.date),
            last_date: bars.last().map(|b| b.date),
            content_hash: blake3::hash(&bytes).to_hex().to_string(),
        })
    }
}

/// A table rewrite that has been written to disk but not yet renamed into place.
#[derive(Debug)]
pub struct StagedWrite {
    tmp_path: PathBuf,
    target: PathBuf,
    rows: usize,
    committed: bool,
}

impl StagedWrite {
    /// Number of rows in the staged table.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Atomically replace the table with the staged file.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp_path, &self.target)
            .map_err(|e| DataError::write_failed(&self.target, format!("atomic rename: {e}")))?;
        self.committed = true;
        tracing::info!(path = %self.target.display(), rows = self.rows, "dataset written");
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

/// The stock and index tables used together by providers and ingestion.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub stock: DatasetStore,
    pub index: DatasetStore,
}

impl Datasets {
    pub fn new(stock_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            stock: DatasetStore::new(stock_path),
            index: DatasetStore::new(index_path),
        }
    }

    pub fn get(&self, kind: DatasetKind) -> &DatasetStore {
        match kind {
            DatasetKind::Stock => &self.stock,
            DatasetKind::Index => &self.index,
        }
    }
}

/// Contents summary for `store status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub path: PathBuf,
    pub rows: usize,
    pub symbols: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub content_hash: String,
}

/// Concatenate and deduplicate on (date, symbol); `incoming` wins on conflict.
///
/// Output is sorted by (date, symbol).
pub fn merge_bars(existing: Vec<Bar>, incoming: Vec<Bar>) -> Vec<Bar> {
    let mut by_key: BTreeMap<(NaiveDate, String), Bar> = BTreeMap::new();
    for bar in existing.into_iter().chain(incoming) {
        by_key.insert((bar.date, bar.symbol.clone()), bar);
    }
    by_key.into_values().collect()
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

fn bars_to_dataframe(bars: &[Bar]) -> PolarsResult<DataFrame> {
    let dates: Vec<i64> = bars.iter().map(|b| date_to_millis(b.date)).collect();
    let codes: Vec<&str> = bars.iter().map(|b| b.symbol.as_str()).collect();

    let mut columns = vec![
        Column::new(DATE_COLUMN.into(), dates)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        Column::new(SYMBOL_COLUMN.into(), codes),
    ];
    for name in VALUE_COLUMNS {
        let values: Vec<f64> = bars.iter().map(|b| value_of(b, name)).collect();
        columns.push(Column::new(name.into(), values));
    }

    DataFrame::new(columns)
}

fn value_of(bar: &Bar, column: &str) -> f64 {
    match column {
        "open" => bar.open,
        "high" => bar.high,
        "low" => bar.low,
        "close" => bar.close,
        "volume" => bar.volume,
        "volume_valued" => bar.volume_valued,
        _ => f64::NAN,
    }
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> PolarsResult<()> {
    let file = fs::File::create(path)?;
    ParquetWriter::new(file).finish(df)?;
    Ok(())
}

fn read_parquet(path: &Path) -> PolarsResult<DataFrame> {
    let file = fs::File::open(path)?;
    ParquetReader::new(file).finish()
}

fn float_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn dataframe_to_bars(df: &DataFrame) -> PolarsResult<Vec<Bar>> {
    let millis = df
        .column(DATE_COLUMN)?
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    let millis = millis.i64()?;
    let codes = df.column(SYMBOL_COLUMN)?.str()?;

    let open = float_column(df, "open")?;
    let high = float_column(df, "high")?;
    let low = float_column(df, "low")?;
    let close = float_column(df, "close")?;
    let volume = float_column(df, "volume")?;
    let volume_valued = float_column(df, "volume_valued")?;

    let mut bars = Vec::with_capacity(df.height());
    for (i, (ms, code)) in millis.into_iter().zip(codes.into_iter()).enumerate() {
        let date = ms
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                PolarsError::ComputeError(format!("null or invalid date at row {i}").into())
            })?;
        let symbol = code
            .ok_or_else(|| {
                PolarsError::ComputeError(format!("null symbol at row {i}").into())
            })?
            .to_string();

        bars.push(Bar {
            date,
            symbol,
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
            volume_valued: volume_valued[i],
        });
    }

    Ok(bars)
}
