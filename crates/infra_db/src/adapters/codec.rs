//! Column encodings shared by the adapters

use core_kernel::{Currency, CustomerId, Holder, LeaseId, TenantId};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Splits a holder into its `(holder_type, holder_id)` columns
pub(crate) fn holder_columns(holder: &Holder) -> (&'static str, Uuid) {
    let id = match holder {
        Holder::Tenant(id) => *id.as_uuid(),
        Holder::Customer(id) => *id.as_uuid(),
        Holder::Lease(id) => *id.as_uuid(),
    };
    (holder.kind(), id)
}

pub(crate) fn holder_from_columns(holder_type: &str, holder_id: Uuid) -> Result<Holder, DatabaseError> {
    match holder_type {
        "tenant" => Ok(Holder::Tenant(TenantId::from_uuid(holder_id))),
        "customer" => Ok(Holder::Customer(CustomerId::from_uuid(holder_id))),
        "lease" => Ok(Holder::Lease(LeaseId::from_uuid(holder_id))),
        other => Err(DatabaseError::serialization(format!("unknown holder type '{other}'"))),
    }
}

/// Parses an ISO 4217 code; `CHAR(3)` columns may carry padding
pub(crate) fn currency_from_code(code: &str) -> Result<Currency, DatabaseError> {
    match code.trim() {
        "EUR" => Ok(Currency::EUR),
        "USD" => Ok(Currency::USD),
        "GBP" => Ok(Currency::GBP),
        "CHF" => Ok(Currency::CHF),
        other => Err(DatabaseError::serialization(format!("unsupported currency '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_columns_round_trip() {
        let holder = Holder::Lease(LeaseId::new());
        let (kind, id) = holder_columns(&holder);
        assert_eq!(kind, "lease");
        assert_eq!(holder_from_columns(kind, id).unwrap(), holder);
    }

    #[test]
    fn test_unknown_holder_type_is_rejected() {
        let err = holder_from_columns("landlord", Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::SerializationError(_)));
    }

    #[test]
    fn test_currency_ignores_padding() {
        assert_eq!(currency_from_code("EUR ").unwrap(), Currency::EUR);
        assert!(currency_from_code("JPY").is_err());
    }
}
