//! Factor descriptors: which derived quantity to compute, and under what name.

use crate::indicators::MomentumBasis;
use serde::{Deserialize, Serialize};

/// Benchmark series used by relative strength unless configured otherwise.
pub const DEFAULT_BENCHMARK: &str = "kospi";

fn default_benchmark() -> String {
    DEFAULT_BENCHMARK.to_string()
}

/// Factor kind with its parameters (serializable, tagged by `type`).
///
/// Field names stay strings here so that a bad value in a config file
/// surfaces as `InvalidField` when the provider is built, not as a parse
/// error with no context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactorKind {
    /// Latest observed value of a stored column.
    Price { field: String },

    /// Moving average of close over `window` observations.
    Sma { window: usize },

    /// Max high / min low over a trailing window of `weeks` weeks.
    RollingExtreme { weeks: u32, field: String },

    /// Lagged one-step difference of close (or of SMA(window)).
    SmaMomentum {
        window: usize,
        period: usize,
        #[serde(default)]
        basis: MomentumBasis,
    },

    /// Sum of return signs over the trailing `period` observations.
    SignMomentum { period: usize },

    /// Daily return divided by the benchmark's daily return.
    RelativeStrength {
        #[serde(default = "default_benchmark")]
        benchmark: String,
    },
}

impl FactorKind {
    /// The `type` tag used in config files.
    pub fn tag(&self) -> &'static str {
        match self {
            FactorKind::Price { .. } => "price",
            FactorKind::Sma { .. } => "sma",
            FactorKind::RollingExtreme { .. } => "rolling_extreme",
            FactorKind::SmaMomentum { .. } => "sma_momentum",
            FactorKind::SignMomentum { .. } => "sign_momentum",
            FactorKind::RelativeStrength { .. } => "relative_strength",
        }
    }

    /// Output column name when the descriptor does not set one.
    pub fn default_name(&self) -> String {
        match self {
            FactorKind::Price { field } => field.clone(),
            FactorKind::Sma { window } => format!("sma{window}"),
            FactorKind::RollingExtreme { weeks, field } => format!("{field}{weeks}"),
            FactorKind::SmaMomentum { .. } => "sma_momentum".to_string(),
            FactorKind::SignMomentum { period } => format!("sign_momentum{period}"),
            FactorKind::RelativeStrength { .. } => "rs".to_string(),
        }
    }
}

/// A named factor request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: FactorKind,
}

impl FactorDescriptor {
    pub fn new(kind: FactorKind) -> Self {
        Self { name: None, kind }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Column name of the factor value in the result table.
    pub fn column_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.kind.default_name())
    }

    pub fn price(field: impl Into<String>) -> Self {
        Self::new(FactorKind::Price {
            field: field.into(),
        })
    }

    pub fn sma(window: usize) -> Self {
        Self::new(FactorKind::Sma { window })
    }

    pub fn rolling_extreme(weeks: u32, field: impl Into<String>) -> Self {
        Self::new(FactorKind::RollingExtreme {
            weeks,
            field: field.into(),
        })
    }

    pub fn sma_momentum(window: usize, period: usize) -> Self {
        Self::new(FactorKind::SmaMomentum {
            window,
            period,
            basis: MomentumBasis::default(),
        })
    }

    pub fn sign_momentum(period: usize) -> Self {
        Self::new(FactorKind::SignMomentum { period })
    }

    pub fn relative_strength() -> Self {
        Self::new(FactorKind::RelativeStrength {
            benchmark: default_benchmark(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_match_result_columns() {
        assert_eq!(FactorDescriptor::price("close").column_name(), "close");
        assert_eq!(FactorDescriptor::sma(20).column_name(), "sma20");
        assert_eq!(
            FactorDescriptor::rolling_extreme(52, "high").column_name(),
            "high52"
        );
        assert_eq!(
            FactorDescriptor::sma_momentum(20, 5).column_name(),
            "sma_momentum"
        );
        assert_eq!(FactorDescriptor::relative_strength().column_name(), "rs");
        assert_eq!(
            FactorDescriptor::sma(5).named("fast").column_name(),
            "fast"
        );
    }

    #[test]
    fn parses_tagged_toml() {
        #[derive(Deserialize)]
        struct Doc {
            factors: Vec<FactorDescriptor>,
        }

        let doc: Doc = toml::from_str(
            r#"
[[factors]]
type = "sma"
window = 20

[[factors]]
name = "mom"
type = "sma_momentum"
window = 20
period = 5
basis = "sma"

[[factors]]
type = "relative_strength"
"#,
        )
        .unwrap();

        assert_eq!(doc.factors[0], FactorDescriptor::sma(20));
        assert_eq!(doc.factors[1].column_name(), "mom");
        assert!(matches!(
            doc.factors[1].kind,
            FactorKind::SmaMomentum {
                basis: MomentumBasis::Sma,
                ..
            }
        ));
        assert_eq!(
            doc.factors[2].kind,
            FactorKind::RelativeStrength {
                benchmark: "kospi".into()
            }
        );
    }
}
