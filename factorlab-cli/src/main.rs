//! FactorLab CLI: ingestion, factor evaluation and store inspection.
//!
//! Commands:
//! - `ingest`: fetch one trading day from KRX and merge it into the store
//! - `factors`: evaluate the configured factors as of a date
//! - `store status`: row count, symbols, date range and hash of each table

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use factorlab_core::config::FactorLabConfig;
use factorlab_core::data::Datasets;
use factorlab_core::domain::DatasetKind;
use factorlab_core::factors::{build_provider, FactorDescriptor, FactorProvider, FactorResult};
use factorlab_core::ingest::{IngestOutcome, IngestionJob};
use factorlab_core::krx::KrxClient;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "factorlab.toml";

#[derive(Parser)]
#[command(
    name = "factorlab",
    about = "FactorLab CLI: KRX daily bars and cross-sectional factors"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one day of stock and index bars and merge them into the store.
    Ingest {
        /// Trading date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Evaluate every configured factor as of a date.
    Factors {
        /// As-of date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Only print these symbols (repeatable).
        #[arg(long = "symbol")]
        symbols: Vec<String>,
    },
    /// Dataset store commands.
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Report rows, symbols, date range and content hash of each table.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("factorlab={0},factorlab_core={0}", cli.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(
        stock = %config.store.stock_path.display(),
        index = %config.store.index_path.display(),
        factors = config.factors.len(),
        "config ready"
    );

    match cli.command {
        Commands::Ingest { date } => run_ingest(&config, parse_date(date.as_deref())?).await,
        Commands::Factors { as_of, symbols } => {
            run_factors(&config, parse_date(as_of.as_deref())?, &symbols).await
        }
        Commands::Store { action } => match action {
            StoreAction::Status => run_store_status(&config.store.datasets()),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<FactorLabConfig> {
    match path {
        Some(path) => FactorLabConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).is_file() => FactorLabConfig::from_file(DEFAULT_CONFIG)
            .with_context(|| format!("loading config {DEFAULT_CONFIG}")),
        None => Ok(FactorLabConfig::default()),
    }
}

fn parse_date(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

async fn run_ingest(config: &FactorLabConfig, date: NaiveDate) -> Result<()> {
    let client = KrxClient::new(config.krx.clone()).context("building KRX client")?;
    let job = IngestionJob::new(client, config.store.datasets());

    let outcome = job
        .run(date)
        .await
        .with_context(|| format!("ingesting {date}"))?;

    match outcome {
        IngestOutcome::Weekend => println!("{date}: weekend, nothing to ingest"),
        IngestOutcome::Holiday => println!("{date}: exchange holiday, nothing to ingest"),
        IngestOutcome::Ingested {
            stock_rows,
            index_rows,
            stock_total,
            index_total,
        } => println!(
            "{date}: {stock_rows} stock rows ({stock_total} stored), \
             {index_rows} index rows ({index_total} stored)"
        ),
    }
    Ok(())
}

async fn run_factors(
    config: &FactorLabConfig,
    as_of: NaiveDate,
    symbols: &[String],
) -> Result<()> {
    let datasets = config.store.datasets();
    let descriptors = config.factors_or_default();
    tracing::info!(as_of = %as_of, factors = descriptors.len(), "evaluating factors");

    let providers = descriptors
        .iter()
        .map(|d| {
            build_provider(&d.kind, &datasets)
                .with_context(|| format!("factor '{}'", d.column_name()))
        })
        .collect::<Result<Vec<Box<dyn FactorProvider>>>>()?;

    let results = futures::future::try_join_all(
        descriptors
            .iter()
            .zip(&providers)
            .map(|(descriptor, provider)| fetch_one(provider.as_ref(), descriptor, as_of)),
    )
    .await?;

    print!("{}", render_table(&results, symbols));
    Ok(())
}

async fn fetch_one(
    provider: &dyn FactorProvider,
    descriptor: &FactorDescriptor,
    as_of: NaiveDate,
) -> Result<FactorResult> {
    let result = provider
        .fetch(descriptor, as_of)
        .await
        .with_context(|| format!("evaluating '{}' as of {as_of}", descriptor.column_name()))?;
    tracing::debug!(
        factor = result.name(),
        as_of = %result.as_of(),
        symbols = result.len(),
        "factor evaluated"
    );
    Ok(result)
}

/// Symbol × factor table. An empty `symbols` filter prints every symbol.
fn render_table(results: &[FactorResult], symbols: &[String]) -> String {
    let mut rows: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| r.rows().iter().map(|row| row.symbol.as_str()))
        .collect();
    if !symbols.is_empty() {
        rows.retain(|s| symbols.iter().any(|wanted| wanted.as_str() == *s));
    }

    let key = results.first().map_or("code", |r| r.symbol_key());
    let mut out = String::new();
    let _ = write!(out, "{key:<10}");
    for result in results {
        let _ = write!(out, " {:>16}", result.name());
    }
    out.push('\n');

    for symbol in rows {
        let _ = write!(out, "{symbol:<10}");
        for result in results {
            match result.value(symbol) {
                Some(v) => {
                    let _ = write!(out, " {v:>16.4}");
                }
                None => {
                    let _ = write!(out, " {:>16}", "-");
                }
            }
        }
        out.push('\n');
    }
    out
}

fn run_store_status(datasets: &Datasets) -> Result<()> {
    for kind in [DatasetKind::Stock, DatasetKind::Index] {
        let store = datasets.get(kind);
        println!("{kind}: {}", store.path().display());
        if !store.exists() {
            println!("  (missing)");
            continue;
        }

        let status = store
            .status()
            .with_context(|| format!("reading {kind} dataset"))?;
        println!("  rows:    {}", status.rows);
        println!("  symbols: {}", status.symbols);
        match (status.first_date, status.last_date) {
            (Some(first), Some(last)) => println!("  dates:   {first} .. {last}"),
            _ => println!("  dates:   (empty)"),
        }
        println!("  blake3:  {}", status.content_hash);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorlab_core::factors::FactorRow;

    fn result(name: &str, values: &[(&str, Option<f64>)]) -> FactorResult {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        FactorResult::new(
            name,
            "code",
            date,
            values
                .iter()
                .map(|(symbol, value)| FactorRow {
                    symbol: symbol.to_string(),
                    date,
                    value: *value,
                })
                .collect(),
        )
    }

    #[test]
    fn table_joins_factors_by_symbol() {
        let results = vec![
            result("close", &[("005930", Some(71000.0)), ("000660", Some(135500.0))]),
            result("sma20", &[("005930", None)]),
        ];
        let table = render_table(&results, &[]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("code"));
        assert!(lines[1].starts_with("000660"));
        assert!(lines[1].trim_end().ends_with('-'));
        assert!(lines[2].contains("71000.0000"));
    }

    #[test]
    fn table_filters_symbols() {
        let results = vec![result("close", &[("005930", Some(1.0)), ("000660", Some(2.0))])];
        let table = render_table(&results, &["005930".to_string()]);
        assert_eq!(table.lines().count(), 2);
        assert!(!table.contains("000660"));
    }

    #[test]
    fn dates_are_iso() {
        assert_eq!(
            parse_date(Some("2024-01-05")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(parse_date(Some("20240105")).is_err());
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "factorlab",
            "factors",
            "--as-of",
            "2024-01-05",
            "--symbol",
            "005930",
            "--symbol",
            "000660",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Factors { as_of, symbols } => {
                assert_eq!(as_of.as_deref(), Some("2024-01-05"));
                assert_eq!(symbols, vec!["005930", "000660"]);
            }
            _ => panic!("expected factors"),
        }
    }
}
