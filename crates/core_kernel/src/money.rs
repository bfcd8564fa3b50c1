//! Money types with precise decimal arithmetic
//!
//! Rental prices, discounts and invoice totals all flow through [`Money`],
//! which wraps a `rust_decimal::Decimal` so that tier comparisons and VAT
//! splits never suffer from binary floating-point drift.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    EUR,
    USD,
    GBP,
    CHF,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::EUR => "€",
            Currency::USD => "$",
            Currency::GBP => "£",
            Currency::CHF => "CHF ",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::CHF => "CHF",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid percentage: {0}")]
    InvalidPercentage(Decimal),

    #[error("Division by zero")]
    DivisionByZero,
}

/// A monetary amount with associated currency
///
/// Amounts are kept at 4 decimal places internally; rounding to the
/// currency's minor unit happens only when a figure is presented or
/// persisted as a final total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Rounds to the currency's standard decimal places
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency.decimal_places()),
            currency: self.currency,
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Subtracts `other`, flooring the result at zero
    pub fn saturating_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        let difference = self.checked_sub(other)?;
        if difference.amount.is_sign_negative() {
            Ok(Money::zero(self.currency))
        } else {
            Ok(difference)
        }
    }

    /// Multiplies by a scalar (e.g., hours times an hourly rate)
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::new(self.amount * factor, self.currency)
    }

    /// Divides by a scalar
    pub fn divide(&self, divisor: Decimal) -> Result<Self, MoneyError> {
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Self::new(self.amount / divisor, self.currency))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{}{:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(&other)
            .expect("Currency mismatch in Money::add")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(&other)
            .expect("Currency mismatch in Money::sub")
    }
}

/// A percentage in the closed range `[0, 100]`
///
/// Used for holder discounts and VAT rates. Construction rejects negative
/// values and values above one hundred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);

    /// Creates a percentage from a value such as `21` for 21%
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO || value > dec!(100) {
            return Err(MoneyError::InvalidPercentage(value));
        }
        Ok(Self(value))
    }

    /// Returns the value as entered (21 for 21%)
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the value as a fraction (0.21 for 21%)
    pub fn as_fraction(&self) -> Decimal {
        self.0 / dec!(100)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Applies this percentage to a money amount
    pub fn of(&self, money: &Money) -> Money {
        money.multiply(self.as_fraction())
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Percentage::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Decimal {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50), Currency::EUR);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::EUR);
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(100.00), Currency::EUR);
        let b = Money::new(dec!(50.00), Currency::EUR);

        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
    }

    #[test]
    fn test_currency_mismatch() {
        let eur = Money::new(dec!(100.00), Currency::EUR);
        let usd = Money::new(dec!(100.00), Currency::USD);

        let result = eur.checked_add(&usd);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let a = Money::new(dec!(30), Currency::EUR);
        let b = Money::new(dec!(45), Currency::EUR);
        assert!(a.saturating_sub(&b).unwrap().is_zero());
        assert_eq!(b.saturating_sub(&a).unwrap().amount(), dec!(15));
    }

    #[test]
    fn test_display_uses_symbol() {
        let m = Money::new(dec!(72), Currency::EUR);
        assert_eq!(m.to_string(), "€72.00");
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::new(dec!(0)).is_ok());
        assert!(Percentage::new(dec!(100)).is_ok());
        assert!(matches!(
            Percentage::new(dec!(-1)),
            Err(MoneyError::InvalidPercentage(_))
        ));
        assert!(Percentage::new(dec!(100.5)).is_err());
    }

    #[test]
    fn test_percentage_application() {
        let ten = Percentage::new(dec!(10)).unwrap();
        let amount = Money::new(dec!(80), Currency::EUR);
        assert_eq!(ten.of(&amount).amount(), dec!(8));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn saturating_sub_never_negative(a in 0i64..1_000_000i64, b in 0i64..1_000_000i64) {
            let ma = Money::new(Decimal::new(a, 2), Currency::EUR);
            let mb = Money::new(Decimal::new(b, 2), Currency::EUR);
            let result = ma.saturating_sub(&mb).unwrap();
            prop_assert!(!result.amount().is_sign_negative() || result.is_zero());
        }

        #[test]
        fn percentage_of_zero_is_zero(p in 0u32..=100u32) {
            let pct = Percentage::new(Decimal::from(p)).unwrap();
            prop_assert!(pct.of(&Money::zero(Currency::EUR)).is_zero());
        }
    }
}
