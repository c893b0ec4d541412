use crate::core::asset::AssetId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors arising from pricing, risk and book operations.
///
/// `InvalidTimeToMaturity` and `DegenerateOptionInputs` are recovered inside
/// the pricing functions and only appear in debug logs; they exist so the
/// recovery sites can name what happened.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("no market data for asset {0}")]
    UnknownAsset(AssetId),
    #[error("time to maturity is negative ({years} years)")]
    InvalidTimeToMaturity { years: f64 },
    #[error("degenerate option inputs: vol={vol}, t={t}")]
    DegenerateOptionInputs { vol: f64, t: f64 },
    #[error("inconsistent hedge state on exposure {exposure}: {reason}")]
    InconsistentHedgeState { exposure: Uuid, reason: String },
    #[error("unsupported confidence level {0}; expected 0.95 or 0.99")]
    UnsupportedConfidence(f64),
    #[error("no closed-form valuation for {kind} instruments")]
    UnsupportedValuation { kind: String },
    #[error("invalid tenor '{0}'; expected <n><D|W|M|Y>")]
    InvalidTenor(String),
    #[error("correlation {rho} for {a}/{b} is outside [-1, 1]")]
    InvalidCorrelation { a: AssetId, b: AssetId, rho: f64 },
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("book lock poisoned by a panicked writer")]
    LockPoisoned,
}

/// What is wrong with an exposure's hedge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeIssue {
    /// Hedged quantity has the opposite sign to the exposure.
    SignMismatch,
    /// `|hedged quantity| > |quantity|`.
    OverHedged,
}

impl fmt::Display for HedgeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HedgeIssue::SignMismatch => write!(f, "hedged quantity sign differs from exposure"),
            HedgeIssue::OverHedged => write!(f, "hedged quantity exceeds exposure"),
        }
    }
}

/// A soft-invariant violation reported next to a computed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeWarning {
    pub exposure: Uuid,
    pub asset: AssetId,
    pub issue: HedgeIssue,
    pub quantity: Decimal,
    pub hedged_quantity: Decimal,
}

impl HedgeWarning {
    pub fn to_error(&self) -> RiskError {
        RiskError::InconsistentHedgeState {
            exposure: self.exposure,
            reason: self.issue.to_string(),
        }
    }
}

impl fmt::Display for HedgeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} [quantity {}, hedged {}]",
            self.asset, self.exposure, self.issue, self.quantity, self.hedged_quantity
        )
    }
}
