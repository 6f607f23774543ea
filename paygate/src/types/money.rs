//! Conversions between minor-unit amounts and decimal amounts.
//!
//! The gateway transmits every amount as an integer in the currency's minor
//! unit: `1050` USD is $10.50, `1050` JPY is ¥1050.
//!
//! # Examples
//!
//! ```
//! use paygate::types::money;
//! use rust_decimal::Decimal;
//!
//! assert_eq!(money::to_major(1050, "usd"), Decimal::new(1050, 2));
//! assert_eq!(money::to_minor(Decimal::new(1050, 2), "usd").unwrap(), 1050);
//! assert_eq!(money::to_minor(Decimal::from(1050), "jpy").unwrap(), 1050);
//! ```

use rust_decimal::Decimal;

use crate::error::{PaygateError, Result};

const ZERO_DECIMAL: &[&str] = &[
    "bif", "clp", "djf", "gnf", "isk", "jpy", "kmf", "krw", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

const THREE_DECIMAL: &[&str] = &["bhd", "jod", "kwd", "omr", "tnd"];

/// Number of decimal places of a currency's minor unit.
///
/// Unknown currencies default to two.
#[must_use]
pub fn minor_unit_exponent(currency: &str) -> u32 {
    let currency = currency.to_ascii_lowercase();
    if ZERO_DECIMAL.contains(&currency.as_str()) {
        0
    } else if THREE_DECIMAL.contains(&currency.as_str()) {
        3
    } else {
        2
    }
}

/// Converts a minor-unit amount to a decimal amount.
#[must_use]
pub fn to_major(amount: i64, currency: &str) -> Decimal {
    Decimal::new(amount, minor_unit_exponent(currency))
}

/// Converts a decimal amount to minor units.
///
/// # Errors
///
/// Returns [`PaygateError::InvalidInput`] if the amount has more decimal
/// places than the currency allows or does not fit in an `i64`.
pub fn to_minor(amount: Decimal, currency: &str) -> Result<i64> {
    let exponent = minor_unit_exponent(currency);
    let scaled = amount
        .checked_mul(Decimal::from(10_i64.pow(exponent)))
        .ok_or_else(|| PaygateError::InvalidInput(format!("amount {amount} overflows")))?;

    if scaled.fract() != Decimal::ZERO {
        return Err(PaygateError::InvalidInput(format!(
            "amount {amount} has more than {exponent} decimal places for {currency}"
        )));
    }

    i64::try_from(scaled)
        .map_err(|_| PaygateError::InvalidInput(format!("amount {amount} is out of range")))
}
