use crate::core::asset::{AssetClass, AssetId};
use crate::core::error::RiskError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Carry inputs that differ between FX and commodities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Carry {
    /// Foreign (base currency) continuously compounded rate.
    Fx { foreign_rate: f64 },
    /// Annualized storage cost and convenience yield.
    Commodity {
        storage_cost: f64,
        convenience_yield: f64,
    },
}

/// Market data for one asset.
///
/// `rate` is the domestic (quote currency) rate for FX and the risk-free
/// rate for commodities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub spot: f64,
    /// Annualized volatility, e.g. `0.10` for 10%.
    pub volatility: f64,
    pub rate: f64,
    pub carry: Carry,
    /// Exponentially weighted tick return, the basis indicator for trend classification.
    #[serde(default)]
    pub momentum: f64,
}

impl MarketQuote {
    pub fn fx(spot: f64, volatility: f64, domestic_rate: f64, foreign_rate: f64) -> Self {
        Self {
            spot,
            volatility,
            rate: domestic_rate,
            carry: Carry::Fx { foreign_rate },
            momentum: 0.0,
        }
    }

    pub fn commodity(
        spot: f64,
        volatility: f64,
        rate: f64,
        storage_cost: f64,
        convenience_yield: f64,
    ) -> Self {
        Self {
            spot,
            volatility,
            rate,
            carry: Carry::Commodity {
                storage_cost,
                convenience_yield,
            },
            momentum: 0.0,
        }
    }

    pub fn class(&self) -> AssetClass {
        match self.carry {
            Carry::Fx { .. } => AssetClass::Fx,
            Carry::Commodity { .. } => AssetClass::Commodity,
        }
    }

    /// Net cost-of-carry rate `b`.
    ///
    /// FX: `r_domestic - r_foreign`. Commodity: `r + storage - convenience`.
    pub fn carry_rate(&self) -> f64 {
        match self.carry {
            Carry::Fx { foreign_rate } => self.rate - foreign_rate,
            Carry::Commodity {
                storage_cost,
                convenience_yield,
            } => self.rate + storage_cost - convenience_yield,
        }
    }

    /// Foreign rate for FX quotes; commodities have none.
    pub fn foreign_rate(&self) -> Option<f64> {
        match self.carry {
            Carry::Fx { foreign_rate } => Some(foreign_rate),
            Carry::Commodity { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(RiskError::InvalidRecord(format!(
                "spot must be finite and > 0, got {}",
                self.spot
            )));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(RiskError::InvalidRecord(format!(
                "volatility must be finite and >= 0, got {}",
                self.volatility
            )));
        }
        if !self.rate.is_finite() || !self.carry_rate().is_finite() {
            return Err(RiskError::InvalidRecord("rates must be finite".to_string()));
        }
        Ok(())
    }
}

/// Session-wide market data keyed by asset.
///
/// Only market-data updates and ticks mutate it. Lookups on a missing asset
/// fail with [`RiskError::UnknownAsset`]; nothing is defaulted.
///
/// Serialized as a plain asset-to-quote map. Deserializing validates every
/// quote, the same as [`set_quote`](Self::set_quote).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<AssetId, MarketQuote>",
    into = "BTreeMap<AssetId, MarketQuote>"
)]
pub struct MarketState {
    quotes: BTreeMap<AssetId, MarketQuote>,
}

impl TryFrom<BTreeMap<AssetId, MarketQuote>> for MarketState {
    type Error = RiskError;

    fn try_from(quotes: BTreeMap<AssetId, MarketQuote>) -> Result<Self, Self::Error> {
        for (asset, quote) in &quotes {
            quote.validate().map_err(|e| match e {
                RiskError::InvalidRecord(reason) => RiskError::InvalidRecord(format!("{}: {}", asset, reason)),
                other => other,
            })?;
        }
        Ok(Self { quotes })
    }
}

impl From<MarketState> for BTreeMap<AssetId, MarketQuote> {
    fn from(state: MarketState) -> Self {
        state.quotes
    }
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the quote for an asset.
    pub fn set_quote(&mut self, asset: AssetId, quote: MarketQuote) -> Result<(), RiskError> {
        quote.validate()?;
        self.quotes.insert(asset, quote);
        Ok(())
    }

    pub fn quote(&self, asset: &AssetId) -> Result<&MarketQuote, RiskError> {
        self.quotes
            .get(asset)
            .ok_or_else(|| RiskError::UnknownAsset(asset.clone()))
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.quotes.contains_key(asset)
    }

    pub fn spot(&self, asset: &AssetId) -> Result<f64, RiskError> {
        Ok(self.quote(asset)?.spot)
    }

    pub fn volatility(&self, asset: &AssetId) -> Result<f64, RiskError> {
        Ok(self.quote(asset)?.volatility)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.quotes.keys()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Move an asset's spot by a log return and fold the simple return into
    /// its momentum.
    pub fn apply_log_return(
        &mut self,
        asset: &AssetId,
        log_return: f64,
        momentum_decay: f64,
    ) -> Result<(), RiskError> {
        let quote = self
            .quotes
            .get_mut(asset)
            .ok_or_else(|| RiskError::UnknownAsset(asset.clone()))?;
        let growth = log_return.exp();
        quote.spot *= growth;
        quote.momentum = momentum_decay * quote.momentum + (1.0 - momentum_decay) * (growth - 1.0);
        Ok(())
    }
}
