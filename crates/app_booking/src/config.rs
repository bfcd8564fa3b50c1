//! Engine configuration

use core_kernel::{Currency, Percentage};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Tunables of the booking engine
///
/// Loaded as the `engine` section of the API configuration; every field has
/// a default so an empty section is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Currency of newly created invoices
    pub currency: Currency,
    /// VAT applied to draft invoices
    pub vat_rate: Percentage,
    /// Maximum bookings written per store call during bulk fills
    pub batch_size: usize,
    /// Meeting-room grid in minutes; 0 disables the check
    pub slot_granularity_minutes: u32,
    /// Days between invoice date and due date
    pub payment_term_days: u64,
    /// How far an open-ended pattern is filled when it is created
    pub open_pattern_horizon_days: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: Currency::EUR,
            vat_rate: Percentage::new(dec!(21)).unwrap_or(Percentage::ZERO),
            batch_size: 100,
            slot_granularity_minutes: 30,
            payment_term_days: 14,
            open_pattern_horizon_days: 180,
        }
    }
}

impl EngineConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_vat_rate(mut self, vat_rate: Percentage) -> Self {
        self.vat_rate = vat_rate;
        self
    }

    pub fn with_granularity(mut self, minutes: u32) -> Self {
        self.slot_granularity_minutes = minutes;
        self
    }

    /// Batch size never below one
    pub(crate) fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.currency, Currency::EUR);
        assert_eq!(config.vat_rate.value(), dec!(21));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.slot_granularity_minutes, 30);
        assert_eq!(config.payment_term_days, 14);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"batch_size": 25}"#).unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.payment_term_days, 14);
        assert_eq!(config.with_batch_size(0).effective_batch_size(), 1);
    }
}
