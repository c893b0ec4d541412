use crate::core::asset::AssetId;
use crate::core::error::{HedgeIssue, HedgeWarning, RiskError};
use crate::core::to_f64;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An underlying commercial exposure: a receivable (positive quantity) or a
/// payable (negative quantity) in some asset, due at `maturity`.
///
/// The sign of `quantity` is fixed at creation. Once archived an exposure
/// no longer changes and drops out of aggregation.
///
/// # Examples
///
/// ```
/// use hedge_risk_engine::core::exposure::Exposure;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let exposure = Exposure::new(
///     "EURUSD".into(),
///     dec!(1_000_000),
///     dec!(1.10),
///     NaiveDate::from_ymd_opt(2027, 3, 31).unwrap(),
/// )
/// .unwrap()
/// .with_hedged_quantity(dec!(600_000));
///
/// assert_eq!(exposure.hedge_ratio(), dec!(60));
/// assert!(exposure.hedge_issues().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    id: Uuid,
    asset: AssetId,
    /// Signed quantity. Long/receivable positive, short/payable negative.
    quantity: Decimal,
    unit_price: Decimal,
    maturity: NaiveDate,
    /// Percentage in [0, 100].
    hedge_ratio: Decimal,
    /// Signed hedged quantity; expected to share the sign of `quantity`.
    hedged_quantity: Decimal,
    archived: bool,
    created_at: DateTime<Utc>,
    description: Option<String>,
}

impl Exposure {
    /// Create an unhedged exposure.
    ///
    /// Fails when `quantity` is zero (it would have no sign), `unit_price`
    /// is not positive, or their product does not fit in a `Decimal`.
    pub fn new(
        asset: AssetId,
        quantity: Decimal,
        unit_price: Decimal,
        maturity: NaiveDate,
    ) -> Result<Self, RiskError> {
        Self::with_id(Uuid::new_v4(), asset, quantity, unit_price, maturity)
    }

    /// Create an exposure with a specific ID (useful for testing / determinism).
    pub fn with_id(
        id: Uuid,
        asset: AssetId,
        quantity: Decimal,
        unit_price: Decimal,
        maturity: NaiveDate,
    ) -> Result<Self, RiskError> {
        if quantity.is_zero() {
            return Err(RiskError::InvalidRecord(
                "exposure quantity must be non-zero".to_string(),
            ));
        }
        validate_unit_price(unit_price)?;
        validate_value(quantity, unit_price)?;
        Ok(Self {
            id,
            asset,
            quantity,
            unit_price,
            maturity,
            hedge_ratio: Decimal::ZERO,
            hedged_quantity: Decimal::ZERO,
            archived: false,
            created_at: Utc::now(),
            description: None,
        })
    }

    /// Set the hedged quantity; the hedge ratio follows from it.
    pub fn with_hedged_quantity(mut self, hedged_quantity: Decimal) -> Self {
        self.hedged_quantity = hedged_quantity;
        self.hedge_ratio = derive_ratio(self.quantity, hedged_quantity);
        self
    }

    /// Set the hedge ratio (percent); the hedged quantity follows from it.
    pub fn with_hedge_ratio(mut self, hedge_ratio: Decimal) -> Self {
        self.hedge_ratio = clamp_ratio(hedge_ratio);
        self.hedged_quantity = ratio_of(self.quantity, self.hedge_ratio);
        self
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

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn maturity(&self) -> NaiveDate {
        self.maturity
    }

    pub fn hedge_ratio(&self) -> Decimal {
        self.hedge_ratio
    }

    pub fn hedged_quantity(&self) -> Decimal {
        self.hedged_quantity
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `quantity - hedged_quantity`, the part left open to price moves.
    /// Saturates at the `Decimal` range for absurd hedged quantities.
    pub fn unhedged_quantity(&self) -> Decimal {
        self.quantity.saturating_sub(self.hedged_quantity)
    }

    /// Signed dollar value, `quantity * unit_price`.
    pub fn value(&self) -> f64 {
        dollar_value(self.quantity, self.unit_price)
    }

    /// Dollar value of the hedged part, unsigned.
    pub fn hedged_value(&self) -> f64 {
        dollar_value(self.hedged_quantity.abs(), self.unit_price)
    }

    /// Signed dollar value of the unhedged part.
    pub fn unhedged_value(&self) -> f64 {
        dollar_value(self.unhedged_quantity(), self.unit_price)
    }

    /// Soft-invariant violations of the hedge state. Empty when consistent.
    pub fn hedge_issues(&self) -> Vec<HedgeIssue> {
        let mut issues = Vec::new();
        if !self.hedged_quantity.is_zero()
            && self.hedged_quantity.is_sign_negative() != self.quantity.is_sign_negative()
        {
            issues.push(HedgeIssue::SignMismatch);
        }
        if self.hedged_quantity.abs() > self.quantity.abs() {
            issues.push(HedgeIssue::OverHedged);
        }
        issues
    }

    pub fn hedge_warnings(&self) -> Vec<HedgeWarning> {
        self.hedge_issues()
            .into_iter()
            .map(|issue| HedgeWarning {
                exposure: self.id,
                asset: self.asset.clone(),
                issue,
                quantity: self.quantity,
                hedged_quantity: self.hedged_quantity,
            })
            .collect()
    }

    pub(crate) fn archive(&mut self) {
        self.archived = true;
    }

    /// Apply a partial update. Archived exposures and sign flips are rejected
    /// and leave the exposure untouched.
    pub(crate) fn apply(&mut self, update: &ExposureUpdate) -> Result<(), RiskError> {
        if self.archived {
            return Err(RiskError::InvalidRecord(format!(
                "exposure {} is archived",
                self.id
            )));
        }
        let quantity = update.quantity.unwrap_or(self.quantity);
        if quantity.is_zero() || quantity.is_sign_negative() != self.quantity.is_sign_negative() {
            return Err(RiskError::InvalidRecord(format!(
                "exposure {} cannot change sign or become zero",
                self.id
            )));
        }
        if let Some(unit_price) = update.unit_price {
            validate_unit_price(unit_price)?;
        }
        validate_value(quantity, update.unit_price.unwrap_or(self.unit_price))?;

        self.quantity = quantity;
        if let Some(unit_price) = update.unit_price {
            self.unit_price = unit_price;
        }
        if let Some(maturity) = update.maturity {
            self.maturity = maturity;
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        match (update.hedge_ratio, update.hedged_quantity) {
            (Some(ratio), Some(hedged)) => {
                self.hedge_ratio = clamp_ratio(ratio);
                self.hedged_quantity = hedged;
            }
            (Some(ratio), None) => {
                self.hedge_ratio = clamp_ratio(ratio);
                self.hedged_quantity = ratio_of(self.quantity, self.hedge_ratio);
            }
            (None, Some(hedged)) => {
                self.hedged_quantity = hedged;
                self.hedge_ratio = derive_ratio(self.quantity, hedged);
            }
            (None, None) => {
                self.hedge_ratio = derive_ratio(self.quantity, self.hedged_quantity);
            }
        }
        Ok(())
    }
}

/// Partial update for an [`Exposure`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureUpdate {
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub maturity: Option<NaiveDate>,
    pub hedge_ratio: Option<Decimal>,
    pub hedged_quantity: Option<Decimal>,
    pub description: Option<String>,
}

fn validate_unit_price(unit_price: Decimal) -> Result<(), RiskError> {
    if unit_price <= Decimal::ZERO {
        return Err(RiskError::InvalidRecord(format!(
            "unit price must be positive, got {}",
            unit_price
        )));
    }
    Ok(())
}

/// Rejects exposures whose dollar value would overflow `Decimal`.
fn validate_value(quantity: Decimal, unit_price: Decimal) -> Result<(), RiskError> {
    if quantity.checked_mul(unit_price).is_none() {
        return Err(RiskError::InvalidRecord(format!(
            "exposure value {} x {} is out of range",
            quantity, unit_price
        )));
    }
    Ok(())
}

fn dollar_value(quantity: Decimal, unit_price: Decimal) -> f64 {
    match quantity.checked_mul(unit_price) {
        Some(value) => to_f64(value),
        None => to_f64(quantity) * to_f64(unit_price),
    }
}

/// `quantity * ratio / 100` without an intermediate larger than `quantity`.
fn ratio_of(quantity: Decimal, ratio: Decimal) -> Decimal {
    quantity * (ratio / dec!(100))
}

fn clamp_ratio(ratio: Decimal) -> Decimal {
    ratio.max(Decimal::ZERO).min(dec!(100))
}

fn derive_ratio(quantity: Decimal, hedged: Decimal) -> Decimal {
    if quantity.is_zero() {
        return Decimal::ZERO;
    }
    hedged
        .abs()
        .checked_div(quantity.abs())
        .and_then(|r| r.checked_mul(dec!(100)))
        .map(clamp_ratio)
        .unwrap_or(dec!(100))
}
