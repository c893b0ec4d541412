//! # hedge-risk-engine
//!
//! Pricing and portfolio risk for FX and commodity hedging books.
//!
//! A book holds commercial exposures (receivables and payables in some asset)
//! and the hedging instruments written against them. From those records and
//! the current market state the engine derives forwards, option values,
//! marks, per-asset exposure summaries, parametric VaR/ES and stress-scenario
//! impacts. Nothing derived is stored.
//!
//! ## Architecture
//!
//! - **core** — Records and state: assets, market data, exposures, instruments, the book
//! - **pricing** — Cost-of-carry forwards, Garman-Kohlhagen, Black-76, digitals, MTM
//! - **risk** — Correlations, exposure aggregation, VaR and Expected Shortfall
//! - **simulation** — Stress scenarios and market ticks
//! - **config** — Engine parameters

pub mod config;
pub mod core;
pub mod pricing;
pub mod risk;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::asset::{AssetClass, AssetId};
    pub use crate::core::book::{BookSnapshot, HedgeBook, SharedBook};
    pub use crate::core::error::{HedgeWarning, RiskError};
    pub use crate::core::exposure::{Exposure, ExposureUpdate};
    pub use crate::core::instrument::{Instrument, InstrumentKind, InstrumentUpdate, OptionType, StrikeSpec};
    pub use crate::core::market::{MarketQuote, MarketState};
    pub use crate::risk::aggregation::PerAssetExposure;
    pub use crate::risk::var::{Confidence, RiskMetrics};
    pub use crate::simulation::stress_test::{ScenarioResult, StressScenario};
}
