//! Per-asset exposure aggregation.
//!
//! Everything here is recomputed from the exposure and instrument lists on
//! every call. The trend and curve labels are threshold heuristics over
//! stored market indicators, for display; they are not forecasts.

use crate::config::EngineConfig;
use crate::core::asset::{AssetClass, AssetId};
use crate::core::error::HedgeWarning;
use crate::core::exposure::Exposure;
use crate::core::instrument::Instrument;
use crate::core::market::MarketState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn classify(momentum: f64, threshold: f64) -> Self {
        if momentum > threshold {
            Trend::Rising
        } else if momentum < -threshold {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

/// Shape of a commodity forward curve, read off the net carry rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveShape {
    Contango,
    Backwardation,
    Flat,
}

impl CurveShape {
    pub fn classify(carry_rate: f64, threshold: f64) -> Self {
        if carry_rate > threshold {
            CurveShape::Contango
        } else if carry_rate < -threshold {
            CurveShape::Backwardation
        } else {
            CurveShape::Flat
        }
    }
}

/// Derived exposure summary for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerAssetExposure {
    pub asset: AssetId,
    /// `None` when the asset has no market data.
    pub class: Option<AssetClass>,
    /// `Σ|quantity|`
    pub gross_exposure: Decimal,
    /// `Σ quantity`
    pub net_exposure: Decimal,
    /// `Σ|hedged quantity|`
    pub hedged_amount: Decimal,
    /// `Σ(quantity - hedged quantity)`
    pub unhedged_amount: Decimal,
    /// Percent in [0, 100]; 0 when there is no gross exposure.
    pub hedge_ratio: Decimal,
    /// Dollar values (`· unit price`) of the amounts above.
    pub gross_value: f64,
    pub net_value: f64,
    pub hedged_value: f64,
    pub unhedged_value: f64,
    /// Component VaR at 95%, filled in by the risk engine.
    pub var_contribution: f64,
    pub trend: Trend,
    /// Commodities only.
    pub curve: Option<CurveShape>,
    pub exposure_count: usize,
    pub instrument_count: usize,
    /// Instruments matched to at least one exposure on this asset by maturity.
    pub matched_instruments: usize,
}

/// `hedged / gross · 100`, clamped to [0, 100], 0 for zero gross.
pub fn hedge_ratio(hedged: Decimal, gross: Decimal) -> Decimal {
    if gross.is_zero() {
        return Decimal::ZERO;
    }
    hedged
        .checked_div(gross)
        .and_then(|r| r.checked_mul(dec!(100)))
        .unwrap_or(dec!(100))
        .max(Decimal::ZERO)
        .min(dec!(100))
}

/// Groups live exposures and instruments by asset.
#[derive(Debug, Clone, Copy)]
pub struct ExposureAggregator<'a> {
    config: &'a EngineConfig,
}

impl<'a> ExposureAggregator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Instruments on the same asset whose maturity lies within the match
    /// window of the exposure's maturity.
    pub fn matching_instruments<'i>(
        &self,
        exposure: &Exposure,
        instruments: &'i [Instrument],
    ) -> Vec<&'i Instrument> {
        instruments
            .iter()
            .filter(|i| i.asset() == exposure.asset())
            .filter(|i| {
                (i.maturity() - exposure.maturity()).num_days().abs()
                    <= self.config.hedge_match_window_days
            })
            .collect()
    }

    /// Hedge-state warnings for every live exposure.
    pub fn hedge_warnings(&self, exposures: &[Exposure]) -> Vec<HedgeWarning> {
        exposures
            .iter()
            .filter(|e| !e.is_archived())
            .flat_map(|e| e.hedge_warnings())
            .collect()
    }

    /// Per-asset summaries, sorted by asset.
    pub fn aggregate(
        &self,
        exposures: &[Exposure],
        instruments: &[Instrument],
        market: &MarketState,
    ) -> Vec<PerAssetExposure> {
        let mut by_asset: BTreeMap<AssetId, PerAssetExposure> = BTreeMap::new();

        let live: Vec<&Exposure> = exposures.iter().filter(|e| !e.is_archived()).collect();
        for exposure in &live {
            let entry = by_asset
                .entry(exposure.asset().clone())
                .or_insert_with(|| self.empty_summary(exposure.asset(), market));
            entry.gross_exposure = entry.gross_exposure.saturating_add(exposure.quantity().abs());
            entry.net_exposure = entry.net_exposure.saturating_add(exposure.quantity());
            entry.hedged_amount = entry.hedged_amount.saturating_add(exposure.hedged_quantity().abs());
            entry.unhedged_amount = entry.unhedged_amount.saturating_add(exposure.unhedged_quantity());
            entry.gross_value += exposure.value().abs();
            entry.net_value += exposure.value();
            entry.hedged_value += exposure.hedged_value();
            entry.unhedged_value += exposure.unhedged_value();
            entry.exposure_count += 1;
        }

        for instrument in instruments {
            let entry = by_asset
                .entry(instrument.asset().clone())
                .or_insert_with(|| self.empty_summary(instrument.asset(), market));
            entry.instrument_count += 1;
            let matched = live.iter().any(|e| {
                e.asset() == instrument.asset()
                    && (instrument.maturity() - e.maturity()).num_days().abs()
                        <= self.config.hedge_match_window_days
            });
            if matched {
                entry.matched_instruments += 1;
            }
        }

        by_asset
            .into_values()
            .map(|mut summary| {
                summary.hedge_ratio = hedge_ratio(summary.hedged_amount, summary.gross_exposure);
                summary
            })
            .collect()
    }

    fn empty_summary(&self, asset: &AssetId, market: &MarketState) -> PerAssetExposure {
        let quote = market.quote(asset).ok();
        let class = quote.map(|q| q.class());
        let trend = quote
            .map(|q| Trend::classify(q.momentum, self.config.trend_threshold))
            .unwrap_or(Trend::Stable);
        let curve = quote
            .filter(|q| q.class() == AssetClass::Commodity)
            .map(|q| CurveShape::classify(q.carry_rate(), self.config.curve_threshold));
        PerAssetExposure {
            asset: asset.clone(),
            class,
            gross_exposure: Decimal::ZERO,
            net_exposure: Decimal::ZERO,
            hedged_amount: Decimal::ZERO,
            unhedged_amount: Decimal::ZERO,
            hedge_ratio: Decimal::ZERO,
            gross_value: 0.0,
            net_value: 0.0,
            hedged_value: 0.0,
            unhedged_value: 0.0,
            var_contribution: 0.0,
            trend,
            curve,
            exposure_count: 0,
            instrument_count: 0,
            matched_instruments: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::InstrumentKind;
    use crate::core::market::MarketQuote;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn market() -> MarketState {
        let mut market = MarketState::new();
        market
            .set_quote("EURUSD".into(), MarketQuote::fx(1.10, 0.08, 0.05, 0.03))
            .unwrap();
        let mut wti = MarketQuote::commodity(80.0, 0.35, 0.04, 0.02, 0.10);
        wti.momentum = -0.02;
        market.set_quote("WTI".into(), wti).unwrap();
        market
    }

    #[test]
    fn test_gross_net_hedged() {
        let config = EngineConfig::default();
        let exposures = vec![
            Exposure::new("EURUSD".into(), dec!(1_000_000), dec!(1.10), date(2027, 3, 31))
                .unwrap()
                .with_hedged_quantity(dec!(600_000)),
            Exposure::new("EURUSD".into(), dec!(-400_000), dec!(1.10), date(2027, 6, 30))
                .unwrap()
                .with_hedged_quantity(dec!(-100_000)),
        ];
        let summaries = ExposureAggregator::new(&config).aggregate(&exposures, &[], &market());
        assert_eq!(summaries.len(), 1);
        let eur = &summaries[0];
        assert_eq!(eur.gross_exposure, dec!(1_400_000));
        assert_eq!(eur.net_exposure, dec!(600_000));
        assert_eq!(eur.hedged_amount, dec!(700_000));
        assert_eq!(eur.hedge_ratio, dec!(50));
        assert_eq!(eur.unhedged_amount, dec!(100_000));
        assert_eq!(eur.class, Some(AssetClass::Fx));
        assert_eq!(eur.curve, None);
    }

    #[test]
    fn test_zero_gross_has_zero_ratio() {
        assert_eq!(hedge_ratio(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(hedge_ratio(dec!(150), dec!(100)), dec!(100));
    }

    #[test]
    fn test_instrument_only_asset_has_zero_ratio() {
        let config = EngineConfig::default();
        let fwd = Instrument::new("WTI".into(), InstrumentKind::Forward, dec!(-1000), dec!(78), date(2027, 1, 1))
            .unwrap();
        let summaries = ExposureAggregator::new(&config).aggregate(&[], &[fwd], &market());
        assert_eq!(summaries[0].gross_exposure, Decimal::ZERO);
        assert_eq!(summaries[0].hedge_ratio, Decimal::ZERO);
        assert_eq!(summaries[0].instrument_count, 1);
        assert_eq!(summaries[0].matched_instruments, 0);
    }

    #[test]
    fn test_archived_exposures_excluded() {
        let config = EngineConfig::default();
        let mut exposure =
            Exposure::new("WTI".into(), dec!(5000), dec!(80), date(2027, 1, 1)).unwrap();
        exposure.archive();
        let summaries = ExposureAggregator::new(&config).aggregate(&[exposure], &[], &market());
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_commodity_heuristics() {
        let config = EngineConfig::default();
        let exposure = Exposure::new("WTI".into(), dec!(5000), dec!(80), date(2027, 1, 1)).unwrap();
        let summaries = ExposureAggregator::new(&config).aggregate(&[exposure], &[], &market());
        // b = 0.04 + 0.02 - 0.10 < 0
        assert_eq!(summaries[0].curve, Some(CurveShape::Backwardation));
        assert_eq!(summaries[0].trend, Trend::Falling);
    }

    #[test]
    fn test_hedge_matching_by_asset_and_maturity() {
        let config = EngineConfig::default();
        let exposure =
            Exposure::new("EURUSD".into(), dec!(1_000_000), dec!(1.10), date(2027, 3, 31)).unwrap();
        let instruments = vec![
            Instrument::new("EURUSD".into(), InstrumentKind::Forward, dec!(-500_000), dec!(1.12), date(2027, 4, 15))
                .unwrap(),
            Instrument::new("EURUSD".into(), InstrumentKind::Forward, dec!(-500_000), dec!(1.12), date(2027, 12, 31))
                .unwrap(),
            Instrument::new("WTI".into(), InstrumentKind::Forward, dec!(-500), dec!(80), date(2027, 3, 31))
                .unwrap(),
        ];
        let aggregator = ExposureAggregator::new(&config);
        let matched = aggregator.matching_instruments(&exposure, &instruments);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].maturity(), date(2027, 4, 15));

        let summaries = aggregator.aggregate(&[exposure], &instruments, &market());
        let eur = summaries.iter().find(|s| s.asset.as_str() == "EURUSD").unwrap();
        assert_eq!(eur.instrument_count, 2);
        assert_eq!(eur.matched_instruments, 1);
    }
}
