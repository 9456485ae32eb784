//! Domain types for FactorLab

pub mod bar;

pub use bar::{Bar, DatasetKind};
