//! Day counting, tenors and cost-of-carry forwards.

use crate::core::error::RiskError;
use chrono::{Days, Months, NaiveDate};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// Actual/365.25 denominator.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Signed year fraction between two dates, Actual/365.25.
pub fn year_fraction(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

/// Time to maturity in years, clamped at zero.
///
/// A maturity before the valuation date is treated as matured.
pub fn time_to_maturity(valuation_date: NaiveDate, maturity: NaiveDate) -> f64 {
    let t = year_fraction(valuation_date, maturity);
    if t < 0.0 {
        debug!(
            "{}; clamping to 0 (valuation {}, maturity {})",
            RiskError::InvalidTimeToMaturity { years: t },
            valuation_date,
            maturity
        );
        return 0.0;
    }
    t
}

/// Cost-of-carry forward `F = S * exp(b * T)`.
///
/// `T <= 0` returns the spot unchanged.
pub fn cost_of_carry_forward(spot: f64, carry_rate: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return spot;
    }
    spot * (carry_rate * t).exp()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenorUnit {
    Day,
    Week,
    Month,
    Year,
}

/// A relative maturity such as `0D`, `2W`, `3M` or `1Y`.
///
/// # Examples
///
/// ```
/// use hedge_risk_engine::pricing::forward::Tenor;
/// use chrono::NaiveDate;
///
/// let tenor: Tenor = "3M".parse().unwrap();
/// let start = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// assert_eq!(tenor.add_to(start), NaiveDate::from_ymd_opt(2026, 4, 30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenor {
    pub count: u32,
    pub unit: TenorUnit,
}

impl Tenor {
    /// Calendar date `self` after `date`. Month arithmetic clamps to month end.
    pub fn add_to(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            TenorUnit::Day => date.checked_add_days(Days::new(u64::from(self.count))),
            TenorUnit::Week => date.checked_add_days(Days::new(7 * u64::from(self.count))),
            TenorUnit::Month => date.checked_add_months(Months::new(self.count)),
            TenorUnit::Year => date.checked_add_months(Months::new(self.count.checked_mul(12)?)),
        }
    }
}

impl FromStr for Tenor {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || RiskError::InvalidTenor(s.to_string());
        let split = s.len().checked_sub(1).ok_or_else(invalid)?;
        if !s.is_char_boundary(split) {
            return Err(invalid());
        }
        let (count, unit) = s.split_at(split);
        let count: u32 = count.parse().map_err(|_| invalid())?;
        let unit = match unit.to_ascii_uppercase().as_str() {
            "D" => TenorUnit::Day,
            "W" => TenorUnit::Week,
            "M" => TenorUnit::Month,
            "Y" => TenorUnit::Year,
            _ => return Err(invalid()),
        };
        Ok(Tenor { count, unit })
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TenorUnit::Day => 'D',
            TenorUnit::Week => 'W',
            TenorUnit::Month => 'M',
            TenorUnit::Year => 'Y',
        };
        write!(f, "{}{}", self.count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_fraction_act_365_25() {
        let t = year_fraction(date(2026, 1, 1), date(2027, 1, 1));
        assert_relative_eq!(t, 365.0 / 365.25);
        assert!(year_fraction(date(2027, 1, 1), date(2026, 1, 1)) < 0.0);
    }

    #[test]
    fn test_past_maturity_clamps_to_zero() {
        assert_eq!(time_to_maturity(date(2026, 6, 1), date(2026, 1, 1)), 0.0);
    }

    #[test]
    fn test_forward_zero_time_is_spot() {
        assert_eq!(cost_of_carry_forward(1.10, 0.02, 0.0), 1.10);
        assert_eq!(cost_of_carry_forward(1.10, 0.02, -0.5), 1.10);
    }

    #[test]
    fn test_forward_with_carry() {
        let f = cost_of_carry_forward(80.0, 0.05, 1.0);
        assert_relative_eq!(f, 80.0 * 0.05f64.exp(), max_relative = 1e-12);
    }

    #[test]
    fn test_tenor_parsing() {
        assert_eq!(
            "0D".parse::<Tenor>().unwrap(),
            Tenor { count: 0, unit: TenorUnit::Day }
        );
        assert_eq!(
            "18m".parse::<Tenor>().unwrap(),
            Tenor { count: 18, unit: TenorUnit::Month }
        );
        assert_eq!("2W".parse::<Tenor>().unwrap().to_string(), "2W");
    }

    #[test]
    fn test_invalid_tenors() {
        for bad in ["", "Y", "3Q", "-1M", "1.5Y", "é"] {
            assert!(
                matches!(bad.parse::<Tenor>(), Err(RiskError::InvalidTenor(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_tenor_add() {
        let start = date(2026, 10, 15);
        assert_eq!("0D".parse::<Tenor>().unwrap().add_to(start), Some(start));
        assert_eq!("1W".parse::<Tenor>().unwrap().add_to(start), Some(date(2026, 10, 22)));
        assert_eq!("1Y".parse::<Tenor>().unwrap().add_to(start), Some(date(2027, 10, 15)));
    }
}
