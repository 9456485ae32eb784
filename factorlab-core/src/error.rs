//! Structured error types shared by the store, factor providers and ingestion.
//!
//! Errors are never recovered locally: every failure surfaces to the caller
//! unchanged so a factor fetch never degrades into an empty table and an
//! ingestion run never half-completes silently.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("dataset unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    #[error("invalid field '{field}' for {factor} (expected one of: {expected})")]
    InvalidField {
        factor: &'static str,
        field: String,
        expected: &'static str,
    },

    #[error("invalid parameter for {factor}: {reason}")]
    InvalidParameter {
        factor: &'static str,
        reason: String,
    },

    #[error("remote request failed: {0}")]
    RemoteRequestFailed(String),

    #[error("otp acquisition failed: {0}")]
    OtpAcquisitionFailed(String),

    #[error("store write failed at {}: {reason}", path.display())]
    StoreWriteFailed { path: PathBuf, reason: String },

    #[error("background task failed: {0}")]
    TaskFailed(String),
}

impl DataError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DataError::DataUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DataError::StoreWriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for DataError {
    fn from(err: tokio::task::JoinError) -> Self {
        DataError::TaskFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
