use crate::core::asset::AssetId;
use crate::core::error::RiskError;
use crate::core::market::MarketState;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierType {
    UpAndOut,
    UpAndIn,
    DownAndOut,
    DownAndIn,
}

/// Instrument kind. Each variant carries only the terms it needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstrumentKind {
    Forward,
    Swap,
    VanillaCall,
    VanillaPut,
    /// Cash-or-nothing call paying `payout` per unit of notional.
    DigitalCall { payout: Decimal },
    DigitalPut { payout: Decimal },
    BarrierCall { barrier: Decimal, barrier_type: BarrierType },
    BarrierPut { barrier: Decimal, barrier_type: BarrierType },
}

impl InstrumentKind {
    pub fn name(&self) -> &'static str {
        match self {
            InstrumentKind::Forward => "forward",
            InstrumentKind::Swap => "swap",
            InstrumentKind::VanillaCall => "vanilla call",
            InstrumentKind::VanillaPut => "vanilla put",
            InstrumentKind::DigitalCall { .. } => "digital call",
            InstrumentKind::DigitalPut { .. } => "digital put",
            InstrumentKind::BarrierCall { .. } => "barrier call",
            InstrumentKind::BarrierPut { .. } => "barrier put",
        }
    }

    /// Option direction, `None` for linear kinds.
    pub fn option_type(&self) -> Option<OptionType> {
        match self {
            InstrumentKind::Forward | InstrumentKind::Swap => None,
            InstrumentKind::VanillaCall
            | InstrumentKind::DigitalCall { .. }
            | InstrumentKind::BarrierCall { .. } => Some(OptionType::Call),
            InstrumentKind::VanillaPut
            | InstrumentKind::DigitalPut { .. }
            | InstrumentKind::BarrierPut { .. } => Some(OptionType::Put),
        }
    }

    pub fn is_linear(&self) -> bool {
        self.option_type().is_none()
    }

    fn validate(&self) -> Result<(), RiskError> {
        match self {
            InstrumentKind::DigitalCall { payout } | InstrumentKind::DigitalPut { payout }
                if *payout <= Decimal::ZERO =>
            {
                Err(RiskError::InvalidRecord(format!(
                    "digital payout must be positive, got {}",
                    payout
                )))
            }
            InstrumentKind::BarrierCall { barrier, .. } | InstrumentKind::BarrierPut { barrier, .. }
                if *barrier <= Decimal::ZERO =>
            {
                Err(RiskError::InvalidRecord(format!(
                    "barrier level must be positive, got {}",
                    barrier
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a strike is quoted when an instrument is entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeSpec {
    Absolute(Decimal),
    /// Percent of the spot at creation time, e.g. `105` for 105% of spot.
    PercentOfSpot(Decimal),
}

impl StrikeSpec {
    /// Absolute strike for the given `spot`.
    pub fn resolve(&self, spot: f64) -> Result<Decimal, RiskError> {
        match *self {
            StrikeSpec::Absolute(strike) => Ok(strike),
            StrikeSpec::PercentOfSpot(pct) => Decimal::from_f64(spot)
                .map(|spot| spot * pct / dec!(100))
                .ok_or_else(|| RiskError::InvalidRecord(format!("spot {} is not representable", spot))),
        }
    }
}

/// A hedging instrument held in the book.
///
/// The strike is always absolute: percent-of-spot strikes are converted when
/// the instrument is created and never move afterwards. An instrument holds
/// no reference to the exposure it hedges; that link is computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    id: Uuid,
    asset: AssetId,
    kind: InstrumentKind,
    /// Signed notional in units of the asset. Long positive.
    notional: Decimal,
    strike: Decimal,
    /// Total premium exchanged at entry, as a non-negative amount. Paid when
    /// the notional is long, received when it is short. Never re-estimated.
    premium: Option<Decimal>,
    maturity: NaiveDate,
    created_at: DateTime<Utc>,
    description: Option<String>,
}

impl Instrument {
    pub fn new(
        asset: AssetId,
        kind: InstrumentKind,
        notional: Decimal,
        strike: Decimal,
        maturity: NaiveDate,
    ) -> Result<Self, RiskError> {
        Self::with_id(Uuid::new_v4(), asset, kind, notional, strike, maturity)
    }

    /// Create an instrument with a specific ID (useful for testing / determinism).
    pub fn with_id(
        id: Uuid,
        asset: AssetId,
        kind: InstrumentKind,
        notional: Decimal,
        strike: Decimal,
        maturity: NaiveDate,
    ) -> Result<Self, RiskError> {
        let instrument = Self {
            id,
            asset,
            kind,
            notional,
            strike,
            premium: None,
            maturity,
            created_at: Utc::now(),
            description: None,
        };
        instrument.validate()?;
        Ok(instrument)
    }

    /// Create an instrument whose strike may be quoted relative to the
    /// current spot in `market`.
    pub fn from_spec(
        asset: AssetId,
        kind: InstrumentKind,
        notional: Decimal,
        strike: StrikeSpec,
        maturity: NaiveDate,
        market: &MarketState,
    ) -> Result<Self, RiskError> {
        let spot = market.spot(&asset)?;
        let strike = strike.resolve(spot)?;
        Self::new(asset, kind, notional, strike, maturity)
    }

    /// Record the entry premium. Fails on a negative amount.
    pub fn with_premium(mut self, premium: Decimal) -> Result<Self, RiskError> {
        self.premium = Some(premium);
        self.validate()?;
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    pub fn kind(&self) -> &InstrumentKind {
        &self.kind
    }

    pub fn notional(&self) -> Decimal {
        self.notional
    }

    pub fn strike(&self) -> Decimal {
        self.strike
    }

    pub fn premium(&self) -> Option<Decimal> {
        self.premium
    }

    /// Signed premium cash flow at entry: negative when paid (long),
    /// positive when received (short), zero without a premium.
    pub fn premium_flow(&self) -> Decimal {
        match self.premium {
            Some(premium) if self.notional.is_sign_negative() => premium,
            Some(premium) => -premium,
            None => Decimal::ZERO,
        }
    }

    pub fn maturity(&self) -> NaiveDate {
        self.maturity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn validate(&self) -> Result<(), RiskError> {
        if self.notional.is_zero() {
            return Err(RiskError::InvalidRecord(
                "instrument notional must be non-zero".to_string(),
            ));
        }
        if self.strike <= Decimal::ZERO {
            return Err(RiskError::InvalidRecord(format!(
                "strike must be positive, got {}",
                self.strike
            )));
        }
        if matches!(self.premium, Some(p) if p < Decimal::ZERO) {
            return Err(RiskError::InvalidRecord(
                "premium cannot be negative".to_string(),
            ));
        }
        self.kind.validate()
    }

    /// Apply a partial update; on error the instrument is left untouched.
    pub(crate) fn apply(&mut self, update: &InstrumentUpdate) -> Result<(), RiskError> {
        let mut next = self.clone();
        if let Some(kind) = update.kind {
            next.kind = kind;
        }
        if let Some(notional) = update.notional {
            next.notional = notional;
        }
        if let Some(strike) = update.strike {
            next.strike = strike;
        }
        if let Some(premium) = update.premium {
            next.premium = Some(premium);
        }
        if let Some(maturity) = update.maturity {
            next.maturity = maturity;
        }
        if let Some(description) = &update.description {
            next.description = Some(description.clone());
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Partial update for an [`Instrument`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentUpdate {
    pub kind: Option<InstrumentKind>,
    pub notional: Option<Decimal>,
    pub strike: Option<Decimal>,
    pub premium: Option<Decimal>,
    pub maturity: Option<NaiveDate>,
    pub description: Option<String>,
}
