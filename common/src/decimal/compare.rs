//! Sign and equality helpers for decimal quantities

use rust_decimal::Decimal;

/// Tolerance of [`equals_with_default_delta`]: 1e-10
pub const DEFAULT_DELTA: Decimal = Decimal::from_parts(1, 0, 0, false, 10);

/// Strictly greater than zero
pub fn is_positive(value: Decimal) -> bool {
    value > Decimal::ZERO
}

/// Strictly less than zero
pub fn is_negative(value: Decimal) -> bool {
    value < Decimal::ZERO
}

/// Numeric equality, so that `1.0` equals `1.00`
pub fn equals_ignore_scale(first: Decimal, second: Decimal) -> bool {
    first.cmp(&second).is_eq()
}

/// Equality within [`DEFAULT_DELTA`]
///
/// Absorbs residue of chained operations, e.g. a remaining volume that should
/// be zero after several fills.
pub fn equals_with_default_delta(first: Decimal, second: Decimal) -> bool {
    equals_with_delta(first, second, DEFAULT_DELTA)
}

/// Equality within an absolute tolerance; `false` when the difference overflows
pub fn equals_with_delta(first: Decimal, second: Decimal, delta: Decimal) -> bool {
    first
        .checked_sub(second)
        .map(|difference| difference.abs() < delta)
        .unwrap_or(false)
}
