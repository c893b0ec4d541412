//! Closed-form option models.
//!
//! - Garman-Kohlhagen for FX: Black-Scholes with a domestic and a foreign rate.
//! - Black-76 for commodities, on the cost-of-carry forward.
//! - Cash-or-nothing digitals on the forward.
//!
//! Zero volatility or zero time to expiry never reaches the `vol * sqrt(T)`
//! division: those inputs fall back to intrinsic value. A negative model
//! value is clamped to zero and logged.

use crate::core::asset::AssetClass;
use crate::core::error::RiskError;
use crate::core::instrument::OptionType;
use crate::core::market::MarketQuote;
use crate::pricing::forward::cost_of_carry_forward;
use crate::pricing::normal::normal_cdf;
use log::{debug, warn};

/// Which closed-form model priced an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionModel {
    GarmanKohlhagen,
    Black76,
}

impl OptionModel {
    pub fn for_class(class: AssetClass) -> Self {
        match class {
            AssetClass::Fx => OptionModel::GarmanKohlhagen,
            AssetClass::Commodity => OptionModel::Black76,
        }
    }
}

/// `max(S - K, 0)` for a call, `max(K - S, 0)` for a put.
pub fn intrinsic(option_type: OptionType, spot: f64, strike: f64) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

fn is_degenerate(vol: f64, t: f64) -> bool {
    if vol <= 0.0 || t <= 0.0 {
        debug!(
            "{}; using intrinsic value",
            RiskError::DegenerateOptionInputs { vol, t }
        );
        return true;
    }
    false
}

/// Clamp a model value at zero. A negative or non-finite value indicates a
/// defect upstream and is logged.
pub fn clamp_premium(model: OptionModel, value: f64) -> f64 {
    if value.is_nan() {
        warn!("{:?} produced NaN; clamping to 0", model);
        return 0.0;
    }
    if value < 0.0 {
        warn!("{:?} produced negative value {}; clamping to 0", model, value);
        return 0.0;
    }
    value
}

/// Garman-Kohlhagen price of a European FX option, per unit of foreign notional.
#[allow(clippy::too_many_arguments)]
pub fn garman_kohlhagen(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    domestic_rate: f64,
    foreign_rate: f64,
    vol: f64,
    t: f64,
) -> f64 {
    if is_degenerate(vol, t) {
        return intrinsic(option_type, spot, strike);
    }
    let sig_sqrt_t = vol * t.sqrt();
    let d1 = ((spot / strike).ln() + (domestic_rate - foreign_rate + 0.5 * vol * vol) * t)
        / sig_sqrt_t;
    let d2 = d1 - sig_sqrt_t;
    let df_d = (-domestic_rate * t).exp();
    let df_f = (-foreign_rate * t).exp();

    let value = match option_type {
        OptionType::Call => spot * df_f * normal_cdf(d1) - strike * df_d * normal_cdf(d2),
        OptionType::Put => strike * df_d * normal_cdf(-d2) - spot * df_f * normal_cdf(-d1),
    };
    clamp_premium(OptionModel::GarmanKohlhagen, value)
}

/// Black-76 price of a European option on a forward.
///
/// Degenerate inputs return the intrinsic value of the forward.
pub fn black76(
    option_type: OptionType,
    forward: f64,
    strike: f64,
    rate: f64,
    vol: f64,
    t: f64,
) -> f64 {
    if is_degenerate(vol, t) {
        return intrinsic(option_type, forward, strike);
    }
    let sig_sqrt_t = vol * t.sqrt();
    let d1 = ((forward / strike).ln() + 0.5 * vol * vol * t) / sig_sqrt_t;
    let d2 = d1 - sig_sqrt_t;
    let df = (-rate * t).exp();

    let value = match option_type {
        OptionType::Call => df * (forward * normal_cdf(d1) - strike * normal_cdf(d2)),
        OptionType::Put => df * (strike * normal_cdf(-d2) - forward * normal_cdf(-d1)),
    };
    clamp_premium(OptionModel::Black76, value)
}

/// Cash-or-nothing digital on a forward: `payout * exp(-rT) * N(±d2)`.
///
/// Degenerate inputs pay the discounted payout if the forward is in the money.
#[allow(clippy::too_many_arguments)]
pub fn digital_cash_or_nothing(
    option_type: OptionType,
    forward: f64,
    strike: f64,
    rate: f64,
    vol: f64,
    t: f64,
    payout: f64,
) -> f64 {
    let df = (-rate * t.max(0.0)).exp();
    if is_degenerate(vol, t) {
        let in_the_money = match option_type {
            OptionType::Call => forward > strike,
            OptionType::Put => forward < strike,
        };
        return if in_the_money { payout * df } else { 0.0 };
    }
    let sig_sqrt_t = vol * t.sqrt();
    let d2 = ((forward / strike).ln() - 0.5 * vol * vol * t) / sig_sqrt_t;
    let probability = match option_type {
        OptionType::Call => normal_cdf(d2),
        OptionType::Put => normal_cdf(-d2),
    };
    clamp_premium(OptionModel::Black76, payout * df * probability)
}

/// Price a vanilla option on an asset, choosing the model from its class.
///
/// `vol` overrides the quoted volatility. Zero volatility or zero time
/// returns the spot intrinsic value for both models.
pub fn vanilla_price(
    option_type: OptionType,
    quote: &MarketQuote,
    strike: f64,
    t: f64,
    vol: Option<f64>,
) -> f64 {
    let vol = vol.unwrap_or(quote.volatility);
    if is_degenerate(vol, t) {
        return intrinsic(option_type, quote.spot, strike);
    }
    match OptionModel::for_class(quote.class()) {
        OptionModel::GarmanKohlhagen => garman_kohlhagen(
            option_type,
            quote.spot,
            strike,
            quote.rate,
            quote.foreign_rate().unwrap_or(0.0),
            vol,
            t,
        ),
        OptionModel::Black76 => {
            let forward = cost_of_carry_forward(quote.spot, quote.carry_rate(), t);
            black76(option_type, forward, strike, quote.rate, vol, t)
        }
    }
}

/// Price a cash-or-nothing digital on an asset's cost-of-carry forward.
pub fn digital_price(
    option_type: OptionType,
    quote: &MarketQuote,
    strike: f64,
    t: f64,
    payout: f64,
) -> f64 {
    let forward = cost_of_carry_forward(quote.spot, quote.carry_rate(), t);
    digital_cash_or_nothing(option_type, forward, strike, quote.rate, quote.volatility, t, payout)
}
