//! TokenAmount - Unsigned amounts in a token's smallest unit
//!
//! Amounts are fixed-point integers. With the default 18 decimals,
//! one whole token is `10^18` base units. Negative amounts are
//! unrepresentable and every arithmetic operation is checked.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimals used by every token unless configured otherwise
pub const DEFAULT_DECIMALS: u32 = 18;

const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Errors that can occur when building amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount {value} has more than {decimals} decimal places")]
    TooPrecise { value: Decimal, decimals: u32 },

    #[error("Amount overflows 128-bit base units: {0}")]
    Overflow(String),

    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// An unsigned amount in base units.
///
/// # Example
/// ```
/// use gcdex_core::TokenAmount;
/// use rust_decimal::Decimal;
///
/// let hundred = TokenAmount::tokens(100);
/// assert_eq!(hundred.base_units(), 100 * 10u128.pow(18));
///
/// let parsed = TokenAmount::parse_units("100", 18).unwrap();
/// assert_eq!(parsed, hundred);
/// assert_eq!(hundred.format_units(18), "100");
///
/// // Negative amounts are rejected
/// assert!(TokenAmount::from_decimal(Decimal::new(-1, 0), 18).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// Zero amount constant
    pub const ZERO: Self = Self(0);

    /// Create an amount from raw base units
    #[inline]
    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    /// Whole tokens at the default 18 decimals.
    ///
    /// `u64::MAX × 10^18` still fits in 128 bits, so this cannot overflow.
    #[inline]
    pub const fn tokens(whole: u64) -> Self {
        Self(whole as u128 * ONE_TOKEN)
    }

    /// Whole tokens at an arbitrary number of decimals
    pub fn whole(whole: u128, decimals: u32) -> Result<Self, AmountError> {
        10u128
            .checked_pow(decimals)
            .and_then(|unit| whole.checked_mul(unit))
            .map(Self)
            .ok_or_else(|| AmountError::Overflow(format!("{whole}e{decimals}")))
    }

    /// Convert a decimal number of tokens into base units.
    pub fn from_decimal(value: Decimal, decimals: u32) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::NegativeAmount(value));
        }

        let normalized = value.normalize();
        let scale = normalized.scale();
        if scale > decimals {
            return Err(AmountError::TooPrecise { value, decimals });
        }

        let mantissa = normalized.mantissa().unsigned_abs();
        10u128
            .checked_pow(decimals - scale)
            .and_then(|factor| mantissa.checked_mul(factor))
            .map(Self)
            .ok_or_else(|| AmountError::Overflow(value.to_string()))
    }

    /// Parse a human-readable token amount such as `"12.5"`.
    pub fn parse_units(s: &str, decimals: u32) -> Result<Self, AmountError> {
        let value = Decimal::from_str(s.trim()).map_err(|e| AmountError::Invalid(e.to_string()))?;
        Self::from_decimal(value, decimals)
    }

    /// Render as a human-readable token amount, trimming trailing zeros.
    pub fn format_units(&self, decimals: u32) -> String {
        let Some(unit) = 10u128.checked_pow(decimals) else {
            return self.0.to_string();
        };
        let whole = self.0 / unit;
        let frac = self.0 % unit;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }

    /// Convert to a decimal number of tokens.
    ///
    /// `None` if the value does not fit a `Decimal` (96-bit mantissa,
    /// at most 28 decimal places).
    pub fn to_decimal(&self, decimals: u32) -> Option<Decimal> {
        let units = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(units, decimals).ok()
    }

    /// Get the raw base units
    #[inline]
    pub const fn base_units(&self) -> u128 {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Addition, `None` on overflow
    pub fn checked_add(&self, other: &TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtraction, `None` if the result would be negative
    pub fn checked_sub(&self, other: &TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// `self × percent / 100` with integer division, `None` on overflow
    pub fn percent(&self, percent: u8) -> Option<TokenAmount> {
        self.0.checked_mul(u128::from(percent)).map(|v| Self(v / 100))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = AmountError;

    /// Parses raw base units
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|e| AmountError::Invalid(format!("{s}: {e}")))
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = AmountError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TokenAmount> for String {
    fn from(amount: TokenAmount) -> Self {
        amount.0.to_string()
    }
}

impl From<u128> for TokenAmount {
    fn from(base_units: u128) -> Self {
        Self(base_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tokens_scaling() {
        assert_eq!(TokenAmount::tokens(1).base_units(), ONE_TOKEN);
        assert_eq!(
            TokenAmount::tokens(1_000_000).base_units(),
            1_000_000 * ONE_TOKEN
        );
        assert_eq!(TokenAmount::tokens(u64::MAX).base_units(), u64::MAX as u128 * ONE_TOKEN);
    }

    #[test]
    fn test_whole_with_custom_decimals() {
        assert_eq!(TokenAmount::whole(5, 6).unwrap(), TokenAmount::new(5_000_000));
        assert!(matches!(
            TokenAmount::whole(u128::MAX, 1),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn test_from_decimal_fraction() {
        let amount = TokenAmount::from_decimal(dec!(12.5), 18).unwrap();
        assert_eq!(amount.base_units(), 12 * ONE_TOKEN + ONE_TOKEN / 2);
    }

    #[test]
    fn test_from_decimal_trailing_zeros_are_not_precision() {
        let amount = TokenAmount::from_decimal(dec!(1.500), 1).unwrap();
        assert_eq!(amount.base_units(), 15);
    }

    #[test]
    fn test_from_decimal_rejects_negative() {
        let result = TokenAmount::from_decimal(dec!(-3), 18);
        assert!(matches!(result, Err(AmountError::NegativeAmount(_))));
    }

    #[test]
    fn test_from_decimal_rejects_excess_precision() {
        let result = TokenAmount::from_decimal(dec!(0.001), 2);
        assert!(matches!(result, Err(AmountError::TooPrecise { .. })));
    }

    #[test]
    fn test_parse_and_format_units() {
        let amount = TokenAmount::parse_units("999900", 18).unwrap();
        assert_eq!(amount, TokenAmount::tokens(999_900));
        assert_eq!(amount.format_units(18), "999900");
        assert_eq!(TokenAmount::new(1).format_units(18), "0.000000000000000001");
        assert_eq!(TokenAmount::new(1_500).format_units(3), "1.5");
        assert!(matches!(
            TokenAmount::parse_units("abc", 18),
            Err(AmountError::Invalid(_))
        ));
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(TokenAmount::tokens(100).to_decimal(18), Some(dec!(100)));
        assert_eq!(TokenAmount::new(15).to_decimal(1), Some(dec!(1.5)));
        assert_eq!(TokenAmount::new(u128::MAX).to_decimal(18), None);
    }

    #[test]
    fn test_checked_sub_prevents_negative() {
        let a = TokenAmount::tokens(50);
        let b = TokenAmount::tokens(100);
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(b.checked_sub(&a), Some(TokenAmount::tokens(50)));
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = TokenAmount::new(u128::MAX);
        assert!(max.checked_add(&TokenAmount::new(1)).is_none());
    }

    #[test]
    fn test_percent() {
        assert_eq!(TokenAmount::tokens(100).percent(10), Some(TokenAmount::tokens(10)));
        assert_eq!(TokenAmount::new(9).percent(10), Some(TokenAmount::ZERO));
        assert!(TokenAmount::new(u128::MAX).percent(2).is_none());
    }

    #[test]
    fn test_serde_as_base_unit_string() {
        let amount = TokenAmount::tokens(3);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"3000000000000000000\"");
        let parsed: TokenAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, parsed);
    }
}
