//! Conversions between caller-supplied floats and the decimal arithmetic used
//! for every rounded output.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Digits kept when importing an `f64`; drops binary noise such as 0.8499999999999999
const IMPORT_SCALE: u32 = 9;

/// Finite `f64` to `Decimal`, `None` for NaN, infinities and out-of-range values
pub(crate) fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(|d| d.round_dp(IMPORT_SCALE))
}

/// Finite and strictly positive
pub(crate) fn positive_decimal(value: f64) -> Option<Decimal> {
    to_decimal(value).filter(|d| *d > Decimal::ZERO)
}

/// Half away from zero, so 297.5 becomes 298 and 280.5 becomes 281
pub(crate) fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn round_to_u16(value: Decimal) -> Option<u16> {
    round_half_up(value, 0).to_u16()
}

pub(crate) fn round_to_u32(value: Decimal) -> Option<u32> {
    round_half_up(value, 0).to_u32()
}

/// `f64` result of a transcendental step back into a rounded decimal
pub(crate) fn f64_to_rounded(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| round_half_up(d, dp))
        .unwrap_or(Decimal::ZERO)
}
