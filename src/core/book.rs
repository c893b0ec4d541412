use crate::config::EngineConfig;
use crate::core::asset::AssetId;
use crate::core::error::RiskError;
use crate::core::exposure::{Exposure, ExposureUpdate};
use crate::core::instrument::{Instrument, InstrumentKind, InstrumentUpdate, OptionType, StrikeSpec};
use crate::core::market::{MarketQuote, MarketState};
use crate::pricing::forward::{cost_of_carry_forward, time_to_maturity, Tenor};
use crate::pricing::mtm::InstrumentMark;
use crate::pricing::options::vanilla_price;
use crate::risk::aggregation::{ExposureAggregator, PerAssetExposure};
use crate::risk::correlation::{CorrelationProvider, CorrelationTable};
use crate::risk::var::{RiskEngine, RiskMetrics};
use crate::simulation::market_tick::perturb_market;
use crate::simulation::stress_test::{standard_scenarios, ScenarioResult, StressScenario, StressScenarioEngine};
use chrono::NaiveDate;
use log::{debug, warn};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// The hedging book: exposures, instruments and the market they are valued
/// against.
///
/// The book is the single owner of all state. Every derived number
/// (aggregates, marks, VaR, scenario impacts) is recomputed from the current
/// records on each call, so a read after a mutation or a tick always sees it.
#[derive(Debug, Clone)]
pub struct HedgeBook {
    market: MarketState,
    correlations: CorrelationTable,
    config: EngineConfig,
    valuation_date: NaiveDate,
    exposures: Vec<Exposure>,
    instruments: Vec<Instrument>,
}

impl HedgeBook {
    /// Empty book over `market`, seeded with the standard correlation table.
    pub fn new(market: MarketState, config: EngineConfig, valuation_date: NaiveDate) -> Self {
        Self {
            market,
            correlations: CorrelationTable::standard(),
            config,
            valuation_date,
            exposures: Vec::new(),
            instruments: Vec::new(),
        }
    }

    pub fn with_correlations(mut self, correlations: CorrelationTable) -> Self {
        self.correlations = correlations;
        self
    }

    // --- Exposures ---

    /// Add an exposure. Its asset must have market data.
    pub fn add_exposure(&mut self, exposure: Exposure) -> Result<Uuid, RiskError> {
        if !self.market.contains(exposure.asset()) {
            return Err(RiskError::UnknownAsset(exposure.asset().clone()));
        }
        if self.exposure(exposure.id()).is_some() {
            return Err(RiskError::InvalidRecord(format!(
                "duplicate exposure id {}",
                exposure.id()
            )));
        }
        let id = exposure.id();
        debug!("adding exposure {} on {}", id, exposure.asset());
        self.exposures.push(exposure);
        Ok(id)
    }

    /// Apply a partial update. Returns `false` when the exposure does not
    /// exist, is archived, or the update is invalid.
    pub fn update_exposure(&mut self, id: Uuid, update: &ExposureUpdate) -> bool {
        let Some(exposure) = self.exposures.iter_mut().find(|e| e.id() == id) else {
            return false;
        };
        match exposure.apply(update) {
            Ok(()) => true,
            Err(e) => {
                warn!("rejected update to exposure {}: {}", id, e);
                false
            }
        }
    }

    pub fn delete_exposure(&mut self, id: Uuid) -> bool {
        let before = self.exposures.len();
        self.exposures.retain(|e| e.id() != id);
        self.exposures.len() != before
    }

    /// Archive an exposure. Returns `false` if it is missing or already archived.
    pub fn archive_exposure(&mut self, id: Uuid) -> bool {
        match self.exposures.iter_mut().find(|e| e.id() == id) {
            Some(exposure) if !exposure.is_archived() => {
                exposure.archive();
                true
            }
            _ => false,
        }
    }

    // --- Instruments ---

    /// Add an instrument. Its asset must have market data.
    pub fn add_instrument(&mut self, instrument: Instrument) -> Result<Uuid, RiskError> {
        if !self.market.contains(instrument.asset()) {
            return Err(RiskError::UnknownAsset(instrument.asset().clone()));
        }
        if self.instrument(instrument.id()).is_some() {
            return Err(RiskError::InvalidRecord(format!(
                "duplicate instrument id {}",
                instrument.id()
            )));
        }
        let id = instrument.id();
        debug!("adding {} {} on {}", instrument.kind(), id, instrument.asset());
        self.instruments.push(instrument);
        Ok(id)
    }

    /// Add an instrument whose strike may be quoted as a percentage of the
    /// current spot. The resolved strike is fixed from then on.
    pub fn add_instrument_spec(
        &mut self,
        asset: AssetId,
        kind: InstrumentKind,
        notional: Decimal,
        strike: StrikeSpec,
        maturity: NaiveDate,
    ) -> Result<Uuid, RiskError> {
        let instrument = Instrument::from_spec(asset, kind, notional, strike, maturity, &self.market)?;
        self.add_instrument(instrument)
    }

    pub fn update_instrument(&mut self, id: Uuid, update: &InstrumentUpdate) -> bool {
        let Some(instrument) = self.instruments.iter_mut().find(|i| i.id() == id) else {
            return false;
        };
        match instrument.apply(update) {
            Ok(()) => true,
            Err(e) => {
                warn!("rejected update to instrument {}: {}", id, e);
                false
            }
        }
    }

    pub fn delete_instrument(&mut self, id: Uuid) -> bool {
        let before = self.instruments.len();
        self.instruments.retain(|i| i.id() != id);
        self.instruments.len() != before
    }

    // --- Market data ---

    pub fn set_market_quote(&mut self, asset: AssetId, quote: MarketQuote) -> Result<(), RiskError> {
        self.market.set_quote(asset, quote)
    }

    pub fn set_correlation(&mut self, a: AssetId, b: AssetId, rho: f64) -> Result<(), RiskError> {
        self.correlations.set_correlation(a, b, rho)
    }

    pub fn set_valuation_date(&mut self, date: NaiveDate) {
        self.valuation_date = date;
    }

    /// Perturb every spot by one random-walk step.
    pub fn tick(&mut self) -> Result<BTreeMap<AssetId, f64>, RiskError> {
        self.tick_with(&mut rand::thread_rng())
    }

    /// [`tick`](Self::tick) with a caller-supplied generator, for reproducible runs.
    pub fn tick_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<BTreeMap<AssetId, f64>, RiskError> {
        let moves = perturb_market(&mut self.market, &self.config, rng)?;
        debug!("market tick moved {} assets", moves.len());
        Ok(moves)
    }

    // --- Queries ---

    fn aggregator(&self) -> ExposureAggregator<'_> {
        ExposureAggregator::new(&self.config)
    }

    fn risk_engine(&self) -> RiskEngine<'_> {
        RiskEngine::new(CorrelationProvider::new(&self.correlations, &self.market), &self.config)
    }

    /// Current mark of every instrument. Failures are reported per mark.
    pub fn instrument_marks(&self) -> Vec<InstrumentMark> {
        self.instruments
            .iter()
            .map(|i| {
                let mark = InstrumentMark::evaluate(i, &self.market, self.valuation_date);
                if let Some(error) = &mark.error {
                    warn!("skipping {} {} in MTM: {}", mark.kind, mark.id, error);
                }
                mark
            })
            .collect()
    }

    /// Portfolio risk snapshot. Always produced; instruments that cannot be
    /// valued are listed in `skipped_instruments`.
    pub fn risk_metrics(&self) -> RiskMetrics {
        let summaries = self.aggregator().aggregate(&self.exposures, &self.instruments, &self.market);
        let warnings = self.aggregator().hedge_warnings(&self.exposures);
        for warning in &warnings {
            warn!("{}", warning.to_error());
        }
        self.risk_engine().metrics(&summaries, &self.instrument_marks(), warnings)
    }

    /// Per-asset summaries with their 95% component VaR filled in.
    pub fn per_asset_exposures(&self) -> Vec<PerAssetExposure> {
        let mut summaries = self.aggregator().aggregate(&self.exposures, &self.instruments, &self.market);
        let contributions = self.risk_engine().var_contributions(&summaries);
        for summary in &mut summaries {
            summary.var_contribution = contributions.get(&summary.asset).copied().unwrap_or(0.0);
        }
        summaries
    }

    /// Component VaR at 95% per asset.
    pub fn var_contributions(&self) -> BTreeMap<AssetId, f64> {
        let summaries = self.aggregator().aggregate(&self.exposures, &self.instruments, &self.market);
        self.risk_engine().var_contributions(&summaries)
    }

    /// Cost-of-carry forward for a tenor such as `"3M"` from the valuation date.
    pub fn forward_price(&self, asset: &AssetId, tenor: &str) -> Result<f64, RiskError> {
        let tenor: Tenor = tenor.parse()?;
        let maturity = tenor
            .add_to(self.valuation_date)
            .ok_or_else(|| RiskError::InvalidTenor(tenor.to_string()))?;
        let quote = self.market.quote(asset)?;
        let t = time_to_maturity(self.valuation_date, maturity);
        Ok(cost_of_carry_forward(quote.spot, quote.carry_rate(), t))
    }

    /// Vanilla option value per unit. `t` is in years; `vol` overrides the
    /// quoted volatility.
    pub fn option_price(
        &self,
        option_type: OptionType,
        asset: &AssetId,
        strike: f64,
        t: f64,
        vol: Option<f64>,
    ) -> Result<f64, RiskError> {
        let quote = self.market.quote(asset)?;
        Ok(vanilla_price(option_type, quote, strike, t, vol))
    }

    /// The standard scenario library over the assets with live exposures.
    pub fn stress_scenarios(&self) -> Vec<ScenarioResult> {
        let mut assets: Vec<AssetId> = self
            .exposures
            .iter()
            .filter(|e| !e.is_archived())
            .map(|e| e.asset().clone())
            .collect();
        assets.sort();
        assets.dedup();
        let scenarios = standard_scenarios(&assets, self.config.default_shock);
        StressScenarioEngine::run_all(&self.exposures, &scenarios)
    }

    pub fn run_scenario(&self, scenario: &StressScenario) -> ScenarioResult {
        StressScenarioEngine::run(&self.exposures, scenario)
    }

    /// Instruments hedging an exposure, matched by asset and maturity.
    /// Empty when the exposure does not exist.
    pub fn matching_instruments(&self, exposure_id: Uuid) -> Vec<&Instrument> {
        match self.exposure(exposure_id) {
            Some(exposure) => self.aggregator().matching_instruments(exposure, &self.instruments),
            None => Vec::new(),
        }
    }

    // --- Accessors ---

    pub fn exposure(&self, id: Uuid) -> Option<&Exposure> {
        self.exposures.iter().find(|e| e.id() == id)
    }

    pub fn instrument(&self, id: Uuid) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id() == id)
    }

    pub fn exposures(&self) -> &[Exposure] {
        &self.exposures
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn correlations(&self) -> &CorrelationTable {
        &self.correlations
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }
}

/// A [`HedgeBook`] shared between threads: one writer at a time, readers see
/// a consistent snapshot of market and records together.
#[derive(Debug, Clone)]
pub struct SharedBook {
    inner: Arc<RwLock<HedgeBook>>,
}

impl SharedBook {
    pub fn new(book: HedgeBook) -> Self {
        Self {
            inner: Arc::new(RwLock::new(book)),
        }
    }

    pub fn read<T>(&self, f: impl FnOnce(&HedgeBook) -> T) -> Result<T, RiskError> {
        let guard = self.inner.read().map_err(|_| RiskError::LockPoisoned)?;
        Ok(f(&*guard))
    }

    pub fn write<T>(&self, f: impl FnOnce(&mut HedgeBook) -> T) -> Result<T, RiskError> {
        let mut guard = self.inner.write().map_err(|_| RiskError::LockPoisoned)?;
        Ok(f(&mut *guard))
    }
}

/// An exposure as written in a book file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub asset: AssetId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub maturity: NaiveDate,
    #[serde(default)]
    pub hedged_quantity: Option<Decimal>,
    #[serde(default)]
    pub hedge_ratio: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExposureRecord {
    /// `hedged_quantity` wins over `hedge_ratio` when both are given.
    pub fn into_exposure(self) -> Result<Exposure, RiskError> {
        let id = self.id.unwrap_or_else(Uuid::new_v4);
        let mut exposure = Exposure::with_id(id, self.asset, self.quantity, self.unit_price, self.maturity)?;
        exposure = match (self.hedged_quantity, self.hedge_ratio) {
            (Some(hedged), _) => exposure.with_hedged_quantity(hedged),
            (None, Some(ratio)) => exposure.with_hedge_ratio(ratio),
            (None, None) => exposure,
        };
        if let Some(description) = self.description {
            exposure = exposure.with_description(description);
        }
        Ok(exposure)
    }
}

/// An instrument as written in a book file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub asset: AssetId,
    pub kind: InstrumentKind,
    pub notional: Decimal,
    pub strike: StrikeSpec,
    #[serde(default)]
    pub premium: Option<Decimal>,
    pub maturity: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

impl InstrumentRecord {
    pub fn into_instrument(self, market: &MarketState) -> Result<Instrument, RiskError> {
        let spot = market.spot(&self.asset)?;
        let strike = self.strike.resolve(spot)?;
        let id = self.id.unwrap_or_else(Uuid::new_v4);
        let mut instrument = Instrument::with_id(id, self.asset, self.kind, self.notional, strike, self.maturity)?;
        if let Some(premium) = self.premium {
            instrument = instrument.with_premium(premium)?;
        }
        if let Some(description) = self.description {
            instrument = instrument.with_description(description);
        }
        Ok(instrument)
    }
}

/// Serializable input for a whole book.
///
/// ```json
/// {
///   "valuation_date": "2026-01-02",
///   "market": { "EURUSD": { "spot": 1.1, "volatility": 0.08, "rate": 0.05,
///                           "carry": { "class": "fx", "foreign_rate": 0.03 } } },
///   "correlations": { "EURUSD/GBPUSD": 0.85 },
///   "exposures": [ { "asset": "EURUSD", "quantity": "1000000",
///                    "unit_price": "1.10", "maturity": "2026-06-30" } ],
///   "instruments": []
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub valuation_date: NaiveDate,
    pub market: MarketState,
    #[serde(default, with = "pairs_serde")]
    pub correlations: BTreeMap<(AssetId, AssetId), f64>,
    #[serde(default)]
    pub exposures: Vec<ExposureRecord>,
    #[serde(default)]
    pub instruments: Vec<InstrumentRecord>,
}

mod pairs_serde {
    use super::*;
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;

    pub fn serialize<S: serde::Serializer>(
        pairs: &BTreeMap<(AssetId, AssetId), f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for ((a, b), rho) in pairs {
            map.serialize_entry(&format!("{}/{}", a, b), rho)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(AssetId, AssetId), f64>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = BTreeMap<(AssetId, AssetId), f64>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map with \"asset/asset\" keys")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut map = BTreeMap::new();
                while let Some((key, rho)) = access.next_entry::<String, f64>()? {
                    let (a, b) = key
                        .split_once('/')
                        .ok_or_else(|| de::Error::custom(format!("invalid pair key: {key}")))?;
                    map.insert((AssetId::new(a), AssetId::new(b)), rho);
                }
                Ok(map)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl BookSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build a live book. An invalid config or any invalid record fails the
    /// whole load.
    pub fn into_book(self, config: EngineConfig) -> Result<HedgeBook, RiskError> {
        config.validate()?;
        let mut book = HedgeBook::new(self.market, config, self.valuation_date);
        for ((a, b), rho) in self.correlations {
            book.set_correlation(a, b, rho)?;
        }
        for record in self.exposures {
            book.add_exposure(record.into_exposure()?)?;
        }
        for record in self.instruments {
            let instrument = record.into_instrument(&book.market)?;
            book.add_instrument(instrument)?;
        }
        Ok(book)
    }
}
