//! Monetary arithmetic helpers.
//!
//! All money flows through `rust_decimal::Decimal` and is rounded to two
//! decimal places at the point of computation, never at display time.

use rust_decimal::Decimal;

/// Number of decimal places every monetary value carries.
pub const MONEY_SCALE: u32 = 2;

/// Round a monetary value to the canonical scale.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_SCALE)
}

/// Line total: `quantity * unit_price`, rounded.
#[must_use]
pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
    round_money(Decimal::from(quantity) * unit_price)
}
