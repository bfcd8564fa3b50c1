//! Integration tests for the core kernel value types
//!
//! Tests cover money arithmetic, percentages, calendar months and the
//! holder sum type as seen from a downstream crate.

use chrono::NaiveDate;
use core_kernel::{
    Currency, DateRange, Holder, LeaseId, Money, MoneyError, Percentage, PortError, TenantId,
    YearMonth,
};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod money_tests {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::EUR);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::new(dec!(16.805), Currency::EUR);
        assert_eq!(m.round_to_currency().amount(), dec!(16.80));
    }

    #[test]
    fn test_divide_by_zero() {
        let m = Money::new(dec!(10), Currency::EUR);
        assert_eq!(m.divide(dec!(0)), Err(MoneyError::DivisionByZero));
    }

    #[test]
    fn test_net_from_vat_inclusive_amount() {
        let gross = Money::new(dec!(121), Currency::EUR);
        let net = gross.divide(dec!(1.21)).unwrap();
        assert_eq!(net.amount(), dec!(100));
    }

    #[test]
    fn test_multiply_hours_by_rate() {
        let rate = Money::new(dec!(25), Currency::EUR);
        assert_eq!(rate.multiply(dec!(2.5)).amount(), dec!(62.5));
    }

    #[test]
    fn test_amounts_order_within_a_currency() {
        let hourly = Money::new(dec!(25), Currency::EUR);
        let half_day = Money::new(dec!(80), Currency::EUR);
        assert!(hourly < half_day);
        assert!(Currency::EUR < Currency::USD);
    }
}

mod percentage_tests {
    use super::*;

    #[test]
    fn test_fraction_and_display() {
        let vat = Percentage::new(dec!(21)).unwrap();
        assert_eq!(vat.as_fraction(), dec!(0.21));
        assert_eq!(vat.to_string(), "21%");
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let ok: Percentage = serde_json::from_str("\"10\"").unwrap();
        assert_eq!(ok.value(), dec!(10));
        assert!(serde_json::from_str::<Percentage>("\"150\"").is_err());
    }
}

mod calendar_tests {
    use super::*;

    #[test]
    fn test_month_of_date() {
        let ym = YearMonth::of(date(2024, 2, 17));
        assert_eq!(ym.to_string(), "2024-02");
        assert!(ym.contains(date(2024, 2, 29)));
        assert!(!ym.contains(date(2024, 3, 1)));
    }

    #[test]
    fn test_month_range_covers_whole_month() {
        let range = DateRange::month(YearMonth::new(2023, 2).unwrap());
        assert_eq!(range.start, date(2023, 2, 1));
        assert_eq!(range.end, date(2023, 2, 28));
    }

    #[test]
    fn test_year_month_serde_as_string() {
        let ym = YearMonth::new(2024, 11).unwrap();
        let json = serde_json::to_string(&ym).unwrap();
        assert_eq!(json, "\"2024-11\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym);
    }
}

mod holder_tests {
    use super::*;

    #[test]
    fn test_lease_id_only_for_lease() {
        let lease = LeaseId::new();
        assert_eq!(Holder::Lease(lease).lease_id(), Some(lease));
        assert_eq!(Holder::Tenant(TenantId::new()).lease_id(), None);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(Holder::Tenant(TenantId::new()).kind(), "tenant");
        assert_eq!(Holder::Lease(LeaseId::new()).kind(), "lease");
    }
}

mod port_error_tests {
    use super::*;

    #[test]
    fn test_conflict_is_not_transient() {
        let err = PortError::conflict("exclusion constraint");
        assert!(err.is_conflict());
        assert!(!err.is_transient());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_connection_is_transient() {
        assert!(PortError::connection("refused").is_transient());
    }
}
