//! The party a booking is attributed to
//!
//! A booking belongs to exactly one of an internal tenant, an external
//! customer or a flexible-desk lease. Modelling this as a sum type means the
//! "which id is populated" question is answered at construction time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifiers::{CustomerId, LeaseId, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Holder {
    /// A tenant renting space in the building
    Tenant(TenantId),
    /// A walk-in or external customer
    Customer(CustomerId),
    /// A flexible-desk lease drawing on a monthly credit quota
    Lease(LeaseId),
}

impl Holder {
    /// Returns true if this holder can be billed on an invoice
    ///
    /// Lease usage is covered by the lease's credit quota and is never
    /// invoiced per booking.
    pub fn is_billable(&self) -> bool {
        !matches!(self, Holder::Lease(_))
    }

    pub fn lease_id(&self) -> Option<LeaseId> {
        match self {
            Holder::Lease(id) => Some(*id),
            _ => None,
        }
    }

    /// Short label used in storage and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Holder::Tenant(_) => "tenant",
            Holder::Customer(_) => "customer",
            Holder::Lease(_) => "lease",
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Tenant(id) => write!(f, "{id}"),
            Holder::Customer(id) => write!(f, "{id}"),
            Holder::Lease(id) => write!(f, "{id}"),
        }
    }
}
