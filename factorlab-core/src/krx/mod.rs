//! KRX data portal: OTP-authorized daily reports and the holiday calendar.

pub mod client;
pub mod config;
pub mod rows;

pub use client::{KrxClient, INDEX_REPORT_BLD, STOCK_REPORT_BLD};
pub use config::{IndexSeries, KrxConfig};
pub use rows::parse_number;
