//! Cross-asset correlation and volatility lookup.
//!
//! Correlations come from a small calibrated table keyed by the sorted asset
//! pair. Pairs with no entry fall back to [`default_correlation`] for their
//! categories, so a portfolio number can always be produced for newly added
//! assets. A default is a placeholder, not an estimate, and
//! [`CorrelationProvider::resolve`] says which one was used.

use crate::core::asset::{AssetCategory, AssetId};
use crate::core::error::RiskError;
use crate::core::market::MarketState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Calibrated pairs seeded by [`CorrelationTable::standard`].
const STANDARD_PAIRS: &[(&str, &str, f64)] = &[
    ("EURUSD", "GBPUSD", 0.85),
    ("EURUSD", "USDCHF", -0.90),
    ("EURUSD", "USDJPY", -0.30),
    ("GBPUSD", "USDJPY", -0.25),
    ("AUDUSD", "NZDUSD", 0.90),
    ("AUDUSD", "USDCAD", -0.60),
    ("AUDUSD", "EURUSD", 0.60),
    ("USDCAD", "WTI", -0.55),
    ("USDNOK", "BRENT", -0.50),
    ("AUDUSD", "COPPER", 0.55),
    ("AUDUSD", "GOLD", 0.45),
    ("WTI", "BRENT", 0.95),
    ("WTI", "NATGAS", 0.35),
    ("BRENT", "NATGAS", 0.30),
    ("WTI", "HEATING_OIL", 0.85),
    ("GOLD", "SILVER", 0.80),
    ("GOLD", "USDJPY", -0.35),
    ("GOLD", "EURUSD", 0.40),
    ("COPPER", "ALUMINUM", 0.70),
    ("CORN", "WHEAT", 0.65),
    ("CORN", "SOYBEANS", 0.60),
    ("USDBRL", "USDMXN", 0.60),
    ("USDZAR", "USDBRL", 0.55),
];

/// Default correlation between two categories when no calibrated pair exists.
///
/// Same-category pairs get a positive default (weak for majors, moderate for
/// commodity currencies); mixed classes get a value near zero.
pub fn default_correlation(a: AssetCategory, b: AssetCategory) -> f64 {
    use AssetCategory::*;
    match (a, b) {
        (Other, _) | (_, Other) => 0.0,
        (Major, Major) => 0.25,
        (CommodityCurrency, CommodityCurrency) => 0.60,
        (EmergingMarket, EmergingMarket) => 0.45,
        (Energy, Energy) => 0.50,
        (Metal, Metal) => 0.40,
        (Agriculture, Agriculture) => 0.30,
        (CommodityCurrency, x) | (x, CommodityCurrency) if x.is_commodity_sector() => 0.20,
        (x, y) if x.is_commodity_sector() && y.is_commodity_sector() => 0.10,
        _ => -0.05,
    }
}

/// Where a correlation value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationSource {
    /// An asset against itself.
    Identity,
    /// An entry in the calibrated table.
    Calibrated,
    /// Category fallback from [`default_correlation`].
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCorrelation {
    pub value: f64,
    pub source: CorrelationSource,
}

/// Symmetric correlation table keyed by sorted asset pair.
#[derive(Debug, Clone, Default)]
pub struct CorrelationTable {
    pairs: HashMap<(AssetId, AssetId), f64>,
}

fn pair_key(a: &AssetId, b: &AssetId) -> (AssetId, AssetId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl CorrelationTable {
    /// An empty table; every pair resolves to its category default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with the built-in calibrated pairs.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (a, b, rho) in STANDARD_PAIRS {
            table
                .pairs
                .insert(pair_key(&AssetId::new(*a), &AssetId::new(*b)), *rho);
        }
        table
    }

    /// Set or override the correlation of a pair. Setting an asset against
    /// itself is ignored; it is always 1.
    pub fn set_correlation(&mut self, a: AssetId, b: AssetId, rho: f64) -> Result<(), RiskError> {
        if !rho.is_finite() || !(-1.0..=1.0).contains(&rho) {
            return Err(RiskError::InvalidCorrelation { a, b, rho });
        }
        if a != b {
            self.pairs.insert(pair_key(&a, &b), rho);
        }
        Ok(())
    }

    pub fn resolve(&self, a: &AssetId, b: &AssetId) -> ResolvedCorrelation {
        if a == b {
            return ResolvedCorrelation {
                value: 1.0,
                source: CorrelationSource::Identity,
            };
        }
        match self.pairs.get(&pair_key(a, b)) {
            Some(&value) => ResolvedCorrelation {
                value,
                source: CorrelationSource::Calibrated,
            },
            None => ResolvedCorrelation {
                value: default_correlation(AssetCategory::classify(a), AssetCategory::classify(b)),
                source: CorrelationSource::Default,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Read-only view joining a correlation table with the current market state.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationProvider<'a> {
    table: &'a CorrelationTable,
    market: &'a MarketState,
}

impl<'a> CorrelationProvider<'a> {
    pub fn new(table: &'a CorrelationTable, market: &'a MarketState) -> Self {
        Self { table, market }
    }

    /// Correlation in [-1, 1]. Never fails.
    pub fn correlation(&self, a: &AssetId, b: &AssetId) -> f64 {
        self.table.resolve(a, b).value
    }

    pub fn resolve(&self, a: &AssetId, b: &AssetId) -> ResolvedCorrelation {
        self.table.resolve(a, b)
    }

    /// Annualized volatility. Unlike correlation there is no fallback.
    pub fn volatility(&self, asset: &AssetId) -> Result<f64, RiskError> {
        self.market.volatility(asset)
    }

    /// `vol(a) * vol(b) * correlation(a, b)`.
    pub fn covariance(&self, a: &AssetId, b: &AssetId) -> Result<f64, RiskError> {
        Ok(self.volatility(a)? * self.volatility(b)? * self.correlation(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::MarketQuote;

    #[test]
    fn test_identity_is_one() {
        let table = CorrelationTable::standard();
        let eur = AssetId::new("EURUSD");
        let resolved = table.resolve(&eur, &eur);
        assert_eq!(resolved.value, 1.0);
        assert_eq!(resolved.source, CorrelationSource::Identity);
    }

    #[test]
    fn test_symmetric_lookup() {
        let table = CorrelationTable::standard();
        let a = AssetId::new("WTI");
        let b = AssetId::new("BRENT");
        assert_eq!(table.resolve(&a, &b), table.resolve(&b, &a));
        assert_eq!(table.resolve(&a, &b).source, CorrelationSource::Calibrated);
    }

    #[test]
    fn test_unknown_pair_falls_back_to_category_default() {
        let table = CorrelationTable::standard();
        let resolved = table.resolve(&AssetId::new("AUDUSD"), &AssetId::new("USDNOK"));
        assert_eq!(resolved.source, CorrelationSource::Default);
        assert_eq!(
            resolved.value,
            default_correlation(AssetCategory::CommodityCurrency, AssetCategory::CommodityCurrency)
        );
    }

    #[test]
    fn test_category_defaults() {
        use AssetCategory::*;
        assert!(default_correlation(CommodityCurrency, CommodityCurrency) > default_correlation(Major, Major));
        assert!(default_correlation(Major, Major) > 0.0);
        assert!(default_correlation(Major, Energy).abs() <= 0.1);
        assert_eq!(default_correlation(Other, Metal), 0.0);
    }

    #[test]
    fn test_override_and_validation() {
        let mut table = CorrelationTable::new();
        let a = AssetId::new("LITHIUM");
        let b = AssetId::new("COBALT");
        table.set_correlation(a.clone(), b.clone(), 0.7).unwrap();
        assert_eq!(table.resolve(&b, &a).value, 0.7);
        assert!(table.set_correlation(a, b, 1.5).is_err());
    }

    #[test]
    fn test_volatility_has_no_default() {
        let table = CorrelationTable::standard();
        let mut market = MarketState::new();
        market
            .set_quote("GOLD".into(), MarketQuote::commodity(2000.0, 0.15, 0.04, 0.0, 0.0))
            .unwrap();
        let provider = CorrelationProvider::new(&table, &market);
        assert_eq!(provider.volatility(&"GOLD".into()).unwrap(), 0.15);
        assert!(matches!(
            provider.volatility(&"SILVER".into()),
            Err(RiskError::UnknownAsset(_))
        ));
        assert!(provider.covariance(&"GOLD".into(), &"SILVER".into()).is_err());
    }
}
