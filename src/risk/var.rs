//! Parametric (variance-covariance) Value-at-Risk and Expected Shortfall.
//!
//! The covariance matrix is implicit: `Cov(i, j) = vol(i) · vol(j) · ρ(i, j)`
//! over the assets with nonzero net dollar exposure. Loss is reported as a
//! positive number.
//!
//! Correlations are hand-specified, so the matrix is not guaranteed to be
//! positive semi-definite. Portfolio standard deviation is taken as
//! `sqrt(|variance|)`; a materially negative variance is logged. This is a
//! known approximation.

use crate::config::EngineConfig;
use crate::core::asset::AssetId;
use crate::core::error::{HedgeWarning, RiskError};
use crate::pricing::mtm::InstrumentMark;
use crate::pricing::normal::normal_pdf;
use crate::risk::aggregation::PerAssetExposure;
use crate::risk::correlation::CorrelationProvider;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Supported confidence levels. Nothing else is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    P95,
    P99,
}

impl Confidence {
    pub const ALL: [Confidence; 2] = [Confidence::P95, Confidence::P99];

    pub fn level(self) -> f64 {
        match self {
            Confidence::P95 => 0.95,
            Confidence::P99 => 0.99,
        }
    }

    /// One-sided normal quantile, as quoted on the desk.
    pub fn z_score(self) -> f64 {
        match self {
            Confidence::P95 => 1.645,
            Confidence::P99 => 2.326,
        }
    }

    /// Tail probability `1 - confidence`.
    pub fn alpha(self) -> f64 {
        match self {
            Confidence::P95 => 0.05,
            Confidence::P99 => 0.01,
        }
    }
}

impl TryFrom<f64> for Confidence {
    type Error = RiskError;

    fn try_from(level: f64) -> Result<Self, Self::Error> {
        if level == 0.95 {
            Ok(Confidence::P95)
        } else if level == 0.99 {
            Ok(Confidence::P99)
        } else {
            Err(RiskError::UnsupportedConfidence(level))
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.level() * 100.0)
    }
}

/// Covariance snapshot of a portfolio of net dollar exposures.
#[derive(Debug, Clone)]
pub struct PortfolioRisk {
    assets: Vec<AssetId>,
    exposures: Vec<f64>,
    covariance: Vec<Vec<f64>>,
    variance: f64,
    horizon_scale: f64,
    skipped: Vec<AssetId>,
}

impl PortfolioRisk {
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Annualized portfolio variance; may be slightly negative for a non-PSD
    /// correlation matrix.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// `sqrt(|variance|)`, annualized.
    pub fn std_dev(&self) -> f64 {
        self.variance.abs().sqrt()
    }

    /// Assets dropped because their volatility could not be looked up.
    pub fn skipped_assets(&self) -> &[AssetId] {
        &self.skipped
    }

    pub fn covariance(&self, i: usize, j: usize) -> f64 {
        self.covariance[i][j]
    }

    /// `z · σ · sqrt(horizon / trading days)`.
    pub fn value_at_risk(&self, confidence: Confidence) -> f64 {
        confidence.z_score() * self.std_dev() * self.horizon_scale
    }

    /// Normal ES derived from VaR with the same z: `VaR · φ(z) / α`.
    pub fn expected_shortfall(&self, confidence: Confidence) -> f64 {
        let z = confidence.z_score();
        self.value_at_risk(confidence) * normal_pdf(z) / confidence.alpha()
    }

    /// `Σ_j exposure(j) · Cov(i, j)` for each asset.
    pub fn marginal_contributions(&self) -> Vec<f64> {
        self.covariance
            .iter()
            .map(|row| row.iter().zip(&self.exposures).map(|(c, e)| c * e).sum())
            .collect()
    }

    /// Euler decomposition of VaR: `exposure(i) · marginal(i) · z · scale / σ`.
    ///
    /// Uses the signed exposure so the components add up to the total VaR.
    /// `σ` carries the sign of the variance, which keeps that sum equal to
    /// VaR when a non-PSD matrix makes the variance negative.
    pub fn component_var(&self, confidence: Confidence) -> Vec<(AssetId, f64)> {
        let std_dev = self.std_dev();
        let signed_std_dev = if self.variance < 0.0 { -std_dev } else { std_dev };
        let marginals = self.marginal_contributions();
        self.assets
            .iter()
            .zip(self.exposures.iter().zip(marginals))
            .map(|(asset, (exposure, marginal))| {
                let component = if std_dev > 0.0 {
                    exposure * marginal * confidence.z_score() * self.horizon_scale / signed_std_dev
                } else {
                    0.0
                };
                (asset.clone(), component)
            })
            .collect()
    }

    /// Stand-alone VaR of each asset, ignoring correlation.
    pub fn standalone_var(&self, confidence: Confidence) -> Vec<(AssetId, f64)> {
        self.assets
            .iter()
            .enumerate()
            .map(|(i, asset)| {
                let sigma = self.exposures[i].abs() * self.covariance[i][i].abs().sqrt();
                (asset.clone(), confidence.z_score() * sigma * self.horizon_scale)
            })
            .collect()
    }

    /// `1 - VaR / Σ stand-alone VaR`; 0 when there is no stand-alone risk.
    pub fn diversification_benefit(&self, confidence: Confidence) -> f64 {
        let standalone: f64 = self.standalone_var(confidence).iter().map(|(_, v)| v).sum();
        if standalone <= 0.0 {
            return 0.0;
        }
        1.0 - self.value_at_risk(confidence) / standalone
    }
}

/// Portfolio risk snapshot. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub var_95: f64,
    pub var_99: f64,
    pub es_95: f64,
    pub es_99: f64,
    /// Gross dollar exposure.
    pub total_exposure: f64,
    pub hedged_exposure: f64,
    pub unhedged_exposure: f64,
    /// Percent in [0, 100].
    pub hedge_ratio: f64,
    /// Sum of the marks that could be computed.
    pub total_mtm: f64,
    pub warnings: Vec<HedgeWarning>,
    /// Instruments whose mark failed and were left out of `total_mtm`.
    pub skipped_instruments: Vec<Uuid>,
    /// Assets left out of VaR for lack of volatility data.
    pub skipped_assets: Vec<AssetId>,
}

impl fmt::Display for RiskMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Risk Metrics ===")?;
        writeln!(f, "VaR 95% (1d):       {:.2}", self.var_95)?;
        writeln!(f, "VaR 99% (1d):       {:.2}", self.var_99)?;
        writeln!(f, "ES 95%:             {:.2}", self.es_95)?;
        writeln!(f, "ES 99%:             {:.2}", self.es_99)?;
        writeln!(f, "Total Exposure:     {:.2}", self.total_exposure)?;
        writeln!(f, "Hedged Exposure:    {:.2}", self.hedged_exposure)?;
        writeln!(f, "Unhedged Exposure:  {:.2}", self.unhedged_exposure)?;
        writeln!(f, "Hedge Ratio:        {:.1}%", self.hedge_ratio)?;
        writeln!(f, "Total MTM:          {:.2}", self.total_mtm)?;
        if !self.warnings.is_empty() {
            writeln!(f, "\nWarnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  {}", warning)?;
            }
        }
        if !self.skipped_instruments.is_empty() {
            writeln!(f, "\nSkipped instruments: {}", self.skipped_instruments.len())?;
        }
        Ok(())
    }
}

/// Parametric risk over per-asset net exposures.
#[derive(Debug, Clone, Copy)]
pub struct RiskEngine<'a> {
    provider: CorrelationProvider<'a>,
    config: &'a EngineConfig,
}

impl<'a> RiskEngine<'a> {
    pub fn new(provider: CorrelationProvider<'a>, config: &'a EngineConfig) -> Self {
        Self { provider, config }
    }

    /// Build the covariance snapshot. Zero exposures are dropped; assets
    /// without a volatility are skipped and logged rather than failing the
    /// whole portfolio.
    pub fn portfolio(&self, net_exposures: &[(AssetId, f64)]) -> PortfolioRisk {
        let mut assets = Vec::new();
        let mut exposures = Vec::new();
        let mut vols = Vec::new();
        let mut skipped = Vec::new();

        for (asset, exposure) in net_exposures {
            if *exposure == 0.0 {
                continue;
            }
            match self.provider.volatility(asset) {
                Ok(vol) => {
                    assets.push(asset.clone());
                    exposures.push(*exposure);
                    vols.push(vol);
                }
                Err(e) => {
                    warn!("excluding {} from VaR: {}", asset, e);
                    skipped.push(asset.clone());
                }
            }
        }

        // every asset left has a volatility, so the lookup cannot fail here
        let covariance: Vec<Vec<f64>> = assets
            .iter()
            .map(|a| {
                assets
                    .iter()
                    .map(|b| self.provider.covariance(a, b).unwrap_or(0.0))
                    .collect()
            })
            .collect();
        let n = assets.len();

        let mut variance = 0.0;
        for i in 0..n {
            for j in 0..n {
                variance += exposures[i] * exposures[j] * covariance[i][j];
            }
        }

        let scale: f64 = exposures
            .iter()
            .zip(&vols)
            .map(|(e, v)| (e * v).powi(2))
            .sum();
        if variance < -1e-9 * scale.max(1.0) {
            warn!(
                "portfolio variance {} is negative; correlation matrix is not positive semi-definite",
                variance
            );
        }

        PortfolioRisk {
            assets,
            exposures,
            covariance,
            variance,
            horizon_scale: self.config.horizon_scale(),
            skipped,
        }
    }

    /// Portfolio snapshot over the net dollar exposure of each asset summary.
    pub fn portfolio_from_summaries(&self, summaries: &[PerAssetExposure]) -> PortfolioRisk {
        let net: Vec<(AssetId, f64)> = summaries
            .iter()
            .map(|s| (s.asset.clone(), s.net_value))
            .collect();
        self.portfolio(&net)
    }

    /// Component VaR at 95% per asset.
    pub fn var_contributions(&self, summaries: &[PerAssetExposure]) -> BTreeMap<AssetId, f64> {
        self.portfolio_from_summaries(summaries)
            .component_var(Confidence::P95)
            .into_iter()
            .collect()
    }

    pub fn metrics(
        &self,
        summaries: &[PerAssetExposure],
        marks: &[InstrumentMark],
        warnings: Vec<HedgeWarning>,
    ) -> RiskMetrics {
        let portfolio = self.portfolio_from_summaries(summaries);

        let total_exposure: f64 = summaries.iter().map(|s| s.gross_value).sum();
        let hedged_exposure: f64 = summaries.iter().map(|s| s.hedged_value).sum();
        let unhedged_exposure = (total_exposure - hedged_exposure).max(0.0);
        let hedge_ratio = if total_exposure > 0.0 {
            (hedged_exposure / total_exposure * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        let total_mtm = marks.iter().filter_map(|m| m.mtm).sum();
        let skipped_instruments = marks.iter().filter(|m| m.mtm.is_none()).map(|m| m.id).collect();

        RiskMetrics {
            var_95: portfolio.value_at_risk(Confidence::P95),
            var_99: portfolio.value_at_risk(Confidence::P99),
            es_95: portfolio.expected_shortfall(Confidence::P95),
            es_99: portfolio.expected_shortfall(Confidence::P99),
            total_exposure,
            hedged_exposure,
            unhedged_exposure,
            hedge_ratio,
            total_mtm,
            warnings,
            skipped_instruments,
            skipped_assets: portfolio.skipped_assets().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::{MarketQuote, MarketState};
    use crate::risk::correlation::CorrelationTable;
    use approx::assert_relative_eq;

    fn setup() -> (CorrelationTable, MarketState, EngineConfig) {
        let mut table = CorrelationTable::new();
        table
            .set_correlation("AAA".into(), "BBB".into(), 0.8)
            .unwrap();
        let mut market = MarketState::new();
        market
            .set_quote("AAA".into(), MarketQuote::fx(1.0, 0.10, 0.0, 0.0))
            .unwrap();
        market
            .set_quote("BBB".into(), MarketQuote::fx(1.0, 0.10, 0.0, 0.0))
            .unwrap();
        market
            .set_quote("CCC".into(), MarketQuote::commodity(50.0, 0.30, 0.0, 0.0, 0.0))
            .unwrap();
        (table, market, EngineConfig::default())
    }

    #[test]
    fn test_confidence_exact_match() {
        assert_eq!(Confidence::try_from(0.95).unwrap(), Confidence::P95);
        assert_eq!(Confidence::try_from(0.99).unwrap(), Confidence::P99);
        assert!(matches!(
            Confidence::try_from(0.975),
            Err(RiskError::UnsupportedConfidence(_))
        ));
    }

    #[test]
    fn test_single_asset_var() {
        let (table, market, config) = setup();
        let engine = RiskEngine::new(CorrelationProvider::new(&table, &market), &config);
        let portfolio = engine.portfolio(&[("AAA".into(), 1_000_000.0)]);
        let expected = 1.645 * 100_000.0 * (1.0f64 / 252.0).sqrt();
        assert_relative_eq!(portfolio.value_at_risk(Confidence::P95), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_es_exceeds_var() {
        let (table, market, config) = setup();
        let engine = RiskEngine::new(CorrelationProvider::new(&table, &market), &config);
        let portfolio = engine.portfolio(&[("AAA".into(), 1_000_000.0), ("CCC".into(), -200_000.0)]);
        for confidence in Confidence::ALL {
            let var = portfolio.value_at_risk(confidence);
            assert!(var > 0.0);
            assert!(portfolio.expected_shortfall(confidence) > var);
        }
    }

    #[test]
    fn test_components_sum_to_total() {
        let (table, market, config) = setup();
        let engine = RiskEngine::new(CorrelationProvider::new(&table, &market), &config);
        let portfolio = engine.portfolio(&[
            ("AAA".into(), 1_000_000.0),
            ("BBB".into(), -300_000.0),
            ("CCC".into(), 250_000.0),
        ]);
        for confidence in Confidence::ALL {
            let sum: f64 = portfolio.component_var(confidence).iter().map(|(_, v)| v).sum();
            assert_relative_eq!(sum, portfolio.value_at_risk(confidence), max_relative = 1e-9);
        }
    }

    #[test]
    fn test_unknown_asset_is_skipped() {
        let (table, market, config) = setup();
        let engine = RiskEngine::new(CorrelationProvider::new(&table, &market), &config);
        let portfolio = engine.portfolio(&[("AAA".into(), 1000.0), ("ZZZ".into(), 1000.0)]);
        assert_eq!(portfolio.assets().len(), 1);
        assert_eq!(portfolio.skipped_assets(), &[AssetId::new("ZZZ")]);
    }

    #[test]
    fn test_empty_portfolio_is_zero() {
        let (table, market, config) = setup();
        let engine = RiskEngine::new(CorrelationProvider::new(&table, &market), &config);
        let portfolio = engine.portfolio(&[]);
        assert_eq!(portfolio.value_at_risk(Confidence::P99), 0.0);
        assert_eq!(portfolio.expected_shortfall(Confidence::P99), 0.0);
        assert!(portfolio.component_var(Confidence::P95).is_empty());
        assert_eq!(portfolio.diversification_benefit(Confidence::P95), 0.0);
    }

    #[test]
    fn test_non_psd_matrix_uses_absolute_variance() {
        let mut table = CorrelationTable::new();
        table.set_correlation("AAA".into(), "BBB".into(), 0.9).unwrap();
        table.set_correlation("AAA".into(), "CCC".into(), 0.9).unwrap();
        table.set_correlation("BBB".into(), "CCC".into(), -0.9).unwrap();
        let (_, market, config) = setup();
        let engine = RiskEngine::new(CorrelationProvider::new(&table, &market), &config);
        // weights chosen to land in the negative eigen-direction
        let portfolio = engine.portfolio(&[
            ("AAA".into(), -1.0),
            ("BBB".into(), 1.0),
            ("CCC".into(), 1.0 / 3.0),
        ]);
        assert!(portfolio.variance() < 0.0);
        assert!(portfolio.std_dev() > 0.0);
        for confidence in Confidence::ALL {
            let var = portfolio.value_at_risk(confidence);
            assert!(var.is_finite() && var > 0.0);
            let sum: f64 = portfolio.component_var(confidence).iter().map(|(_, v)| v).sum();
            assert_relative_eq!(sum, var, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_covariance_matches_provider() {
        let (table, market, config) = setup();
        let provider = CorrelationProvider::new(&table, &market);
        let engine = RiskEngine::new(provider, &config);
        let portfolio = engine.portfolio(&[("AAA".into(), 1.0), ("BBB".into(), -2.0)]);
        let expected = provider.covariance(&"AAA".into(), &"BBB".into()).unwrap();
        assert_relative_eq!(portfolio.covariance(0, 1), expected);
        assert_relative_eq!(portfolio.covariance(0, 1), 0.10 * 0.10 * 0.8, max_relative = 1e-12);
    }
}
