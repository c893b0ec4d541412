//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```
//! use hedge_risk_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "trend_threshold": 0.01 }"#).unwrap();
//! assert_eq!(config.trend_threshold, 0.01);
//! assert_eq!(config.trading_days_per_year, 252.0);
//! ```

use crate::core::error::RiskError;
use serde::{Deserialize, Serialize};

/// Tunable parameters for the risk engine, heuristics and market ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annualization basis for volatility scaling.
    pub trading_days_per_year: f64,
    /// VaR holding period in trading days.
    pub horizon_days: f64,
    /// Momentum above/below which an asset trends up/down.
    pub trend_threshold: f64,
    /// Carry rate above/below which a commodity curve is in contango/backwardation.
    pub curve_threshold: f64,
    /// Maximum maturity distance for an instrument to count as hedging an exposure.
    pub hedge_match_window_days: i64,
    /// Length of one market tick, in trading days.
    pub tick_interval_days: f64,
    /// Weight of the previous momentum when folding in a new tick return.
    pub momentum_decay: f64,
    /// Magnitude of the shocks used by the standard scenario library.
    pub default_shock: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: 252.0,
            horizon_days: 1.0,
            trend_threshold: 0.005,
            curve_threshold: 0.005,
            hedge_match_window_days: 31,
            tick_interval_days: 1.0,
            momentum_decay: 0.8,
            default_shock: 0.10,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RiskError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RiskError::InvalidRecord(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks. A config that passes keeps VaR, ES and ticks finite.
    pub fn validate(&self) -> Result<(), RiskError> {
        let positive = [
            ("trading_days_per_year", self.trading_days_per_year),
            ("horizon_days", self.horizon_days),
            ("tick_interval_days", self.tick_interval_days),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(RiskError::InvalidRecord(format!(
                    "{} must be finite and > 0, got {}",
                    name, value
                )));
            }
        }
        let non_negative = [
            ("trend_threshold", self.trend_threshold),
            ("curve_threshold", self.curve_threshold),
            ("default_shock", self.default_shock),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(RiskError::InvalidRecord(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.momentum_decay) {
            return Err(RiskError::InvalidRecord(format!(
                "momentum_decay must be in [0, 1], got {}",
                self.momentum_decay
            )));
        }
        if self.hedge_match_window_days < 0 {
            return Err(RiskError::InvalidRecord(format!(
                "hedge_match_window_days must be >= 0, got {}",
                self.hedge_match_window_days
            )));
        }
        Ok(())
    }

    /// `sqrt(horizon / trading days)`, the factor turning annual into horizon volatility.
    pub fn horizon_scale(&self) -> f64 {
        (self.horizon_days / self.trading_days_per_year).sqrt()
    }
}
