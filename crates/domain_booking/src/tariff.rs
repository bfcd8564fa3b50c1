//! Tiered rate selection
//!
//! A resource type carries a [`TariffCard`] with an hourly rate and optional
//! half-day and full-day rates. [`resolve`] picks the tier for a booking's
//! duration; the holder discount is applied afterwards by [`apply_discount`].
//!
//! Tie-break order:
//! 1. full day, if the booking lasts at least 8 hours and the full-day rate
//!    is below the hourly total
//! 2. half day, if the booking lasts at least 4 hours and the half-day rate
//!    is below the hourly total, unless the full day also qualifies and is
//!    cheaper than the half day
//! 3. hourly otherwise
//!
//! A missing tier is skipped, never an error.

use core_kernel::{Currency, Money, Percentage};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BookingError;

/// Minimum duration in hours for the half-day tier
pub const HALF_DAY_HOURS: Decimal = dec!(4);

/// Minimum duration in hours for the full-day tier
pub const FULL_DAY_HOURS: Decimal = dec!(8);

/// Pricing plan a booking was charged under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    Hourly,
    HalfDay,
    FullDay,
}

impl RateTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateTier::Hourly => "hourly",
            RateTier::HalfDay => "half_day",
            RateTier::FullDay => "full_day",
        }
    }

    /// Human label used on invoice lines
    pub fn label(&self) -> &'static str {
        match self {
            RateTier::Hourly => "Hourly rate",
            RateTier::HalfDay => "Half-day rate",
            RateTier::FullDay => "Full-day rate",
        }
    }
}

impl fmt::Display for RateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RateTier {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(RateTier::Hourly),
            "half_day" => Ok(RateTier::HalfDay),
            "full_day" => Ok(RateTier::FullDay),
            other => Err(BookingError::InvalidTariff(format!("unknown tier {other}"))),
        }
    }
}

/// Rates for one resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffCard {
    pub hourly_rate: Money,
    pub half_day_rate: Option<Money>,
    pub full_day_rate: Option<Money>,
    /// Rates already include VAT
    pub vat_inclusive: bool,
}

impl TariffCard {
    /// Creates a card, rejecting negative rates and mixed currencies
    pub fn new(
        hourly_rate: Money,
        half_day_rate: Option<Money>,
        full_day_rate: Option<Money>,
    ) -> Result<Self, BookingError> {
        let currency = hourly_rate.currency();
        for rate in std::iter::once(&hourly_rate).chain(&half_day_rate).chain(&full_day_rate) {
            if rate.amount().is_sign_negative() && !rate.is_zero() {
                return Err(BookingError::InvalidTariff(format!("negative rate {rate}")));
            }
            if rate.currency() != currency {
                return Err(BookingError::InvalidTariff(format!(
                    "rate {rate} is not in {currency}"
                )));
            }
        }
        Ok(Self {
            hourly_rate,
            half_day_rate,
            full_day_rate,
            vat_inclusive: false,
        })
    }

    pub fn vat_inclusive(mut self, inclusive: bool) -> Self {
        self.vat_inclusive = inclusive;
        self
    }

    pub fn currency(&self) -> Currency {
        self.hourly_rate.currency()
    }

    /// Resolves the tier for a duration on this card
    pub fn resolve(&self, duration_hours: Decimal) -> TariffResolution {
        resolve(
            duration_hours,
            self.hourly_rate,
            self.half_day_rate,
            self.full_day_rate,
        )
    }
}

/// Outcome of tier selection, before any discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffResolution {
    pub tier: RateTier,
    /// The rate that was applied (per hour for hourly, flat otherwise)
    pub applied_rate: Money,
    pub amount: Money,
}

/// Picks the cheapest qualifying tier
pub fn resolve(
    duration_hours: Decimal,
    hourly_rate: Money,
    half_day_rate: Option<Money>,
    full_day_rate: Option<Money>,
) -> TariffResolution {
    let hourly_total = hourly_rate.multiply(duration_hours);

    let full_day = full_day_rate
        .filter(|rate| duration_hours >= FULL_DAY_HOURS && rate.amount() < hourly_total.amount());
    let half_day = half_day_rate
        .filter(|rate| duration_hours >= HALF_DAY_HOURS && rate.amount() < hourly_total.amount());

    if let Some(rate) = full_day {
        return flat(RateTier::FullDay, rate);
    }

    if let Some(half) = half_day {
        // Full day still wins over a qualifying half day when it is cheaper
        if let Some(full) = full_day_rate {
            if duration_hours >= FULL_DAY_HOURS && full.amount() < half.amount() {
                return flat(RateTier::FullDay, full);
            }
        }
        return flat(RateTier::HalfDay, half);
    }

    TariffResolution {
        tier: RateTier::Hourly,
        applied_rate: hourly_rate,
        amount: hourly_total,
    }
}

fn flat(tier: RateTier, rate: Money) -> TariffResolution {
    TariffResolution {
        tier,
        applied_rate: rate,
        amount: rate,
    }
}

/// Discount applied on top of a resolved amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discounted {
    pub discount_pct: Percentage,
    pub discount_amount: Money,
    pub final_amount: Money,
}

/// `discount = amount * pct / 100`, `final = amount - discount`
pub fn apply_discount(amount: Money, discount_pct: Percentage) -> Discounted {
    let discount_amount = discount_pct.of(&amount);
    Discounted {
        discount_pct,
        discount_amount,
        final_amount: amount - discount_amount,
    }
}

/// The price recorded on a booking at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub tier: RateTier,
    pub applied_rate: Money,
    /// Pre-discount amount
    pub amount: Money,
    pub discount_pct: Percentage,
    pub discount_amount: Money,
    pub final_amount: Money,
    /// Whether `amount` includes VAT
    pub vat_inclusive: bool,
}

impl PricingSnapshot {
    /// Resolves the tier for `duration_hours` and applies the holder discount
    pub fn price(card: &TariffCard, duration_hours: Decimal, discount_pct: Percentage) -> Self {
        let resolution = card.resolve(duration_hours);
        let discounted = apply_discount(resolution.amount, discount_pct);
        Self {
            tier: resolution.tier,
            applied_rate: resolution.applied_rate,
            amount: resolution.amount,
            discount_pct,
            discount_amount: discounted.discount_amount,
            final_amount: discounted.final_amount,
            vat_inclusive: card.vat_inclusive,
        }
    }

    pub fn has_discount(&self) -> bool {
        self.discount_amount.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eur(amount: Decimal) -> Money {
        Money::new(amount, Currency::EUR)
    }

    fn card(hourly: Decimal, half: Option<Decimal>, full: Option<Decimal>) -> TariffCard {
        TariffCard::new(eur(hourly), half.map(eur), full.map(eur)).unwrap()
    }

    #[test]
    fn test_full_day_tier_for_eight_hours() {
        let r = resolve(dec!(8), eur(dec!(25)), Some(eur(dec!(100))), Some(eur(dec!(150))));
        // Half day (100) is cheaper than full day here, but the full day
        // qualifies first because 150 < 8 * 25.
        assert_eq!(r.tier, RateTier::FullDay);
        assert_eq!(r.amount, eur(dec!(150)));
    }

    #[test]
    fn test_half_day_tier_for_four_hours() {
        let r = resolve(dec!(4), eur(dec!(25)), Some(eur(dec!(90))), Some(eur(dec!(150))));
        assert_eq!(r.tier, RateTier::HalfDay);
        assert_eq!(r.amount, eur(dec!(90)));
    }

    #[test]
    fn test_hourly_tier_for_short_booking() {
        let r = resolve(dec!(2), eur(dec!(25)), Some(eur(dec!(90))), Some(eur(dec!(150))));
        assert_eq!(r.tier, RateTier::Hourly);
        assert_eq!(r.applied_rate, eur(dec!(25)));
        assert_eq!(r.amount, eur(dec!(50)));
    }

    #[test]
    fn test_half_day_not_chosen_when_not_cheaper() {
        let r = resolve(dec!(4), eur(dec!(20)), Some(eur(dec!(80))), None);
        assert_eq!(r.tier, RateTier::Hourly);
        assert_eq!(r.amount, eur(dec!(80)));
    }

    #[test]
    fn test_full_day_not_cheaper_than_hourly_falls_to_half_day() {
        // 8h at 10/h = 80; full day 90 does not beat it, half day 70 does
        let r = resolve(dec!(8), eur(dec!(10)), Some(eur(dec!(70))), Some(eur(dec!(90))));
        assert_eq!(r.tier, RateTier::HalfDay);
        assert_eq!(r.amount, eur(dec!(70)));
    }

    #[test]
    fn test_missing_tiers_are_skipped() {
        let r = resolve(dec!(10), eur(dec!(25)), None, None);
        assert_eq!(r.tier, RateTier::Hourly);
        assert_eq!(r.amount, eur(dec!(250)));

        let r = resolve(dec!(9), eur(dec!(25)), Some(eur(dec!(120))), None);
        assert_eq!(r.tier, RateTier::HalfDay);
    }

    #[test]
    fn test_discount_application() {
        let d = apply_discount(eur(dec!(80)), Percentage::new(dec!(10)).unwrap());
        assert_eq!(d.discount_amount, eur(dec!(8)));
        assert_eq!(d.final_amount, eur(dec!(72)));
    }

    #[test]
    fn test_pricing_snapshot_meeting_room() {
        let c = card(dec!(25), Some(dec!(80)), Some(dec!(150)));
        let snapshot = PricingSnapshot::price(&c, dec!(4), Percentage::new(dec!(10)).unwrap());
        assert_eq!(snapshot.tier, RateTier::HalfDay);
        assert_eq!(snapshot.amount, eur(dec!(80)));
        assert_eq!(snapshot.discount_amount, eur(dec!(8)));
        assert_eq!(snapshot.final_amount, eur(dec!(72)));
        assert!(snapshot.has_discount());
    }

    #[test]
    fn test_card_rejects_negative_and_mixed_currency() {
        assert!(TariffCard::new(eur(dec!(-1)), None, None).is_err());
        let usd = Money::new(dec!(100), Currency::USD);
        assert!(TariffCard::new(eur(dec!(25)), Some(usd), None).is_err());
    }

    #[test]
    fn test_tier_round_trips_through_str() {
        for tier in [RateTier::Hourly, RateTier::HalfDay, RateTier::FullDay] {
            assert_eq!(tier.as_str().parse::<RateTier>().unwrap(), tier);
        }
    }
}
