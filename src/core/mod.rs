pub mod asset;
pub mod book;
pub mod error;
pub mod exposure;
pub mod instrument;
pub mod market;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Decimal to `f64` for pricing math.
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
