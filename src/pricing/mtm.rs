use crate::core::error::RiskError;
use crate::core::instrument::{Instrument, InstrumentKind, OptionType};
use crate::core::market::MarketState;
use crate::core::to_f64;
use crate::pricing::forward::time_to_maturity;
use crate::pricing::options::{digital_price, vanilla_price};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mark-to-market value of an instrument against the given market.
///
/// - Forward / swap: `notional * (spot - strike) * exp(-r * T)`.
/// - Vanilla / digital: `notional * option value + premium flow`, where the
///   premium is paid on a long notional and received on a short one.
/// - Barrier kinds have no closed form here and return
///   [`RiskError::UnsupportedValuation`].
///
/// This is a pure function; nothing is cached, so a value read after a
/// market tick always reflects that tick.
pub fn mark_to_market(
    instrument: &Instrument,
    market: &MarketState,
    valuation_date: NaiveDate,
) -> Result<f64, RiskError> {
    let quote = market.quote(instrument.asset())?;
    let t = time_to_maturity(valuation_date, instrument.maturity());
    let notional = to_f64(instrument.notional());
    let strike = to_f64(instrument.strike());
    let premium = to_f64(instrument.premium_flow());

    match *instrument.kind() {
        InstrumentKind::Forward | InstrumentKind::Swap => {
            Ok(notional * (quote.spot - strike) * (-quote.rate * t).exp())
        }
        InstrumentKind::VanillaCall => {
            Ok(notional * vanilla_price(OptionType::Call, quote, strike, t, None) + premium)
        }
        InstrumentKind::VanillaPut => {
            Ok(notional * vanilla_price(OptionType::Put, quote, strike, t, None) + premium)
        }
        InstrumentKind::DigitalCall { payout } => {
            let value = digital_price(OptionType::Call, quote, strike, t, to_f64(payout));
            Ok(notional * value + premium)
        }
        InstrumentKind::DigitalPut { payout } => {
            let value = digital_price(OptionType::Put, quote, strike, t, to_f64(payout));
            Ok(notional * value + premium)
        }
        InstrumentKind::BarrierCall { .. } | InstrumentKind::BarrierPut { .. } => {
            Err(RiskError::UnsupportedValuation {
                kind: instrument.kind().name().to_string(),
            })
        }
    }
}

/// An instrument's current mark, or the reason it could not be valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentMark {
    pub id: Uuid,
    pub asset: String,
    pub kind: String,
    pub mtm: Option<f64>,
    pub error: Option<String>,
}

impl InstrumentMark {
    pub fn evaluate(instrument: &Instrument, market: &MarketState, valuation_date: NaiveDate) -> Self {
        let result = mark_to_market(instrument, market, valuation_date);
        Self {
            id: instrument.id(),
            asset: instrument.asset().to_string(),
            kind: instrument.kind().name().to_string(),
            mtm: result.as_ref().ok().copied(),
            error: result.err().map(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::BarrierType;
    use crate::core::market::MarketQuote;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn valuation_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    fn market() -> MarketState {
        let mut market = MarketState::new();
        market
            .set_quote("EURUSD".into(), MarketQuote::fx(1.10, 0.08, 0.05, 0.03))
            .unwrap();
        market
            .set_quote("WTI".into(), MarketQuote::commodity(80.0, 0.35, 0.04, 0.02, 0.01))
            .unwrap();
        market
    }

    #[test]
    fn test_forward_mtm() {
        let maturity = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let fwd = Instrument::new("EURUSD".into(), InstrumentKind::Forward, dec!(1_000_000), dec!(1.05), maturity)
            .unwrap();
        let t = 365.0 / 365.25;
        let expected = 1_000_000.0 * (1.10 - 1.05) * (-0.05f64 * t).exp();
        let mtm = mark_to_market(&fwd, &market(), valuation_date()).unwrap();
        assert_relative_eq!(mtm, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_short_forward_loses_when_spot_rises() {
        let fwd = Instrument::new("WTI".into(), InstrumentKind::Swap, dec!(-1000), dec!(75), valuation_date())
            .unwrap();
        let mtm = mark_to_market(&fwd, &market(), valuation_date()).unwrap();
        assert_relative_eq!(mtm, -5000.0);
    }

    #[test]
    fn test_expired_call_is_intrinsic_less_premium() {
        let past = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let call = Instrument::new("WTI".into(), InstrumentKind::VanillaCall, dec!(100), dec!(70), past)
            .unwrap()
            .with_premium(dec!(250))
            .unwrap();
        let mtm = mark_to_market(&call, &market(), valuation_date()).unwrap();
        assert_relative_eq!(mtm, 100.0 * 10.0 - 250.0);
    }

    #[test]
    fn test_sold_option_keeps_premium_received() {
        let past = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let call = Instrument::new("WTI".into(), InstrumentKind::VanillaCall, dec!(-100), dec!(70), past)
            .unwrap()
            .with_premium(dec!(250))
            .unwrap();
        let mtm = mark_to_market(&call, &market(), valuation_date()).unwrap();
        assert_relative_eq!(mtm, -100.0 * 10.0 + 250.0);
    }

    #[test]
    fn test_barrier_is_unsupported() {
        let kind = InstrumentKind::BarrierCall {
            barrier: dec!(1.25),
            barrier_type: BarrierType::UpAndOut,
        };
        let barrier = Instrument::new("EURUSD".into(), kind, dec!(1000), dec!(1.1), valuation_date()).unwrap();
        let err = mark_to_market(&barrier, &market(), valuation_date()).unwrap_err();
        assert!(matches!(err, RiskError::UnsupportedValuation { .. }));
    }

    #[test]
    fn test_missing_market_data_fails() {
        let fwd = Instrument::new("GOLD".into(), InstrumentKind::Forward, dec!(10), dec!(2000), valuation_date())
            .unwrap();
        let mark = InstrumentMark::evaluate(&fwd, &market(), valuation_date());
        assert!(mark.mtm.is_none());
        assert!(mark.error.unwrap().contains("GOLD"));
    }
}
