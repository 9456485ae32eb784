//! Factor descriptors, providers, and cross-sectional results.

pub mod descriptor;
pub mod pipeline;
pub mod provider;
pub mod providers;
pub mod result;

pub use descriptor::{FactorDescriptor, FactorKind, DEFAULT_BENCHMARK};
pub use provider::FactorProvider;
pub use providers::{
    build_provider, PriceProvider, RelativeStrengthProvider, RollingExtremeProvider,
    SignMomentumProvider, SmaMomentumProvider, SmaProvider,
};
pub use result::{FactorResult, FactorRow};
