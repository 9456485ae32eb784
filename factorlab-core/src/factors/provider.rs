//! Factor provider trait.
//!
//! The FactorProvider trait abstracts over factor kinds (price, SMA, rolling
//! extremes, momentum, relative strength) so callers can hold a mixed list
//! and fetch them concurrently.

use super::descriptor::FactorDescriptor;
use super::result::FactorResult;
use crate::data::SYMBOL_COLUMN;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait FactorProvider: Send + Sync {
    /// Column identifying a symbol in the returned table.
    fn symbol_key_name(&self) -> &str {
        SYMBOL_COLUMN
    }

    /// Compute the factor's cross-section as of `as_of`.
    ///
    /// Only bars dated on or before `as_of` are visible. The descriptor names
    /// the output column and must ask for the same kind and parameters the
    /// provider was built with, otherwise the fetch fails with
    /// `InvalidParameter`. Fails with `DataUnavailable` if a backing table
    /// cannot be read.
    async fn fetch(&self, factor: &FactorDescriptor, as_of: NaiveDate) -> Result<FactorResult>;
}
