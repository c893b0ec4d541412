use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a hedgeable underlying.
///
/// FX assets are named by their pair without a separator (`EURUSD`,
/// `USDJPY`), commodities by a short ticker-like name (`WTI`, `GOLD`).
/// Identifiers are case-sensitive and compared as plain strings.
///
/// # Examples
///
/// ```
/// use hedge_risk_engine::core::asset::AssetId;
///
/// let eur = AssetId::new("EURUSD");
/// let gold = AssetId::new("GOLD");
/// assert_ne!(eur, gold);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Pricing class of an asset. Selects the option model and the carry formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Currency pair, priced with Garman-Kohlhagen.
    Fx,
    /// Commodity, priced with Black-76 on the cost-of-carry forward.
    Commodity,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Fx => write!(f, "FX"),
            AssetClass::Commodity => write!(f, "Commodity"),
        }
    }
}

/// Coarse grouping used to pick a default correlation for pairs that have
/// no calibrated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Major,
    CommodityCurrency,
    EmergingMarket,
    Energy,
    Metal,
    Agriculture,
    Other,
}

const MAJORS: &[&str] = &["EURUSD", "GBPUSD", "USDJPY", "USDCHF", "EURGBP", "EURJPY", "EURCHF"];
const COMMODITY_CURRENCIES: &[&str] = &["AUDUSD", "NZDUSD", "USDCAD", "USDNOK", "AUDJPY"];
const EMERGING: &[&str] = &[
    "USDBRL", "USDMXN", "USDZAR", "USDINR", "USDCNY", "USDTRY", "USDKRW", "USDPLN",
];
const ENERGY: &[&str] = &["WTI", "BRENT", "NATGAS", "HEATING_OIL", "GASOLINE", "COAL"];
const METALS: &[&str] = &["GOLD", "SILVER", "COPPER", "ALUMINUM", "PLATINUM", "PALLADIUM", "NICKEL"];
const AGRICULTURE: &[&str] = &["CORN", "WHEAT", "SOYBEANS", "SUGAR", "COFFEE", "COTTON", "COCOA"];

impl AssetCategory {
    /// Classify an asset by name. Unknown names fall into `Other`.
    pub fn classify(asset: &AssetId) -> Self {
        let name = asset.as_str().to_ascii_uppercase();
        let name = name.as_str();
        if MAJORS.contains(&name) {
            AssetCategory::Major
        } else if COMMODITY_CURRENCIES.contains(&name) {
            AssetCategory::CommodityCurrency
        } else if EMERGING.contains(&name) {
            AssetCategory::EmergingMarket
        } else if ENERGY.contains(&name) {
            AssetCategory::Energy
        } else if METALS.contains(&name) {
            AssetCategory::Metal
        } else if AGRICULTURE.contains(&name) {
            AssetCategory::Agriculture
        } else {
            AssetCategory::Other
        }
    }

    pub fn is_commodity_sector(self) -> bool {
        matches!(
            self,
            AssetCategory::Energy | AssetCategory::Metal | AssetCategory::Agriculture
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_equality() {
        let a = AssetId::new("EURUSD");
        let b = AssetId::new("EURUSD");
        let c = AssetId::new("GBPUSD");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_asset_display() {
        assert_eq!(format!("{}", AssetId::new("WTI")), "WTI");
    }

    #[test]
    fn test_classify_known_assets() {
        assert_eq!(AssetCategory::classify(&"EURUSD".into()), AssetCategory::Major);
        assert_eq!(
            AssetCategory::classify(&"AUDUSD".into()),
            AssetCategory::CommodityCurrency
        );
        assert_eq!(
            AssetCategory::classify(&"USDBRL".into()),
            AssetCategory::EmergingMarket
        );
        assert_eq!(AssetCategory::classify(&"brent".into()), AssetCategory::Energy);
        assert_eq!(AssetCategory::classify(&"GOLD".into()), AssetCategory::Metal);
        assert_eq!(AssetCategory::classify(&"WHEAT".into()), AssetCategory::Agriculture);
    }

    #[test]
    fn test_classify_unknown_is_other() {
        assert_eq!(AssetCategory::classify(&"LITHIUM".into()), AssetCategory::Other);
    }
}
