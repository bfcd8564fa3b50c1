//! Billing Domain Ports
//!
//! The invoice record store consumed by booking reconciliation. The
//! PostgreSQL adapter lives in `infra_db`; an in-memory mock is available
//! behind the `mock` feature.

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, Holder, InvoiceId, PortError, YearMonth};

use crate::invoice::DraftInvoice;

#[async_trait]
pub trait InvoicePort: DomainPort + HealthCheckable {
    /// Retrieves an invoice by ID, or `PortError::NotFound`
    async fn get_invoice(&self, id: InvoiceId) -> Result<DraftInvoice, PortError>;

    /// The draft-status invoice of `holder` for `period`, if any
    async fn find_draft(&self, holder: &Holder, period: YearMonth) -> Result<Option<DraftInvoice>, PortError>;

    async fn insert_invoice(&self, invoice: DraftInvoice) -> Result<DraftInvoice, PortError>;

    async fn update_invoice(&self, invoice: DraftInvoice) -> Result<DraftInvoice, PortError>;

    async fn delete_invoice(&self, id: InvoiceId) -> Result<(), PortError>;
}

/// Mock implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::invoice::InvoiceStatus;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of InvoicePort
    #[derive(Debug, Default)]
    pub struct MockInvoicePort {
        invoices: Arc<RwLock<HashMap<InvoiceId, DraftInvoice>>>,
        fail_writes: AtomicBool,
    }

    impl MockInvoicePort {
        /// Creates a new mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with invoices for testing
        pub async fn with_invoices(self, invoices: Vec<DraftInvoice>) -> Self {
            {
                let mut store = self.invoices.write().await;
                for invoice in invoices {
                    store.insert(invoice.id, invoice);
                }
            }
            self
        }

        /// Makes every subsequent write fail with a connection error
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub async fn all_invoices(&self) -> Vec<DraftInvoice> {
            self.invoices.read().await.values().cloned().collect()
        }

        fn check_writable(&self) -> Result<(), PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock invoice store unavailable"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockInvoicePort {}

    #[async_trait]
    impl HealthCheckable for MockInvoicePort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-invoice-port".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl InvoicePort for MockInvoicePort {
        async fn get_invoice(&self, id: InvoiceId) -> Result<DraftInvoice, PortError> {
            self.invoices
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }

        async fn find_draft(&self, holder: &Holder, period: YearMonth) -> Result<Option<DraftInvoice>, PortError> {
            Ok(self
                .invoices
                .read()
                .await
                .values()
                .find(|inv| {
                    inv.holder == *holder && inv.period == period && inv.status == InvoiceStatus::Draft
                })
                .cloned())
        }

        async fn insert_invoice(&self, invoice: DraftInvoice) -> Result<DraftInvoice, PortError> {
            self.check_writable()?;
            self.invoices.write().await.insert(invoice.id, invoice.clone());
            Ok(invoice)
        }

        async fn update_invoice(&self, invoice: DraftInvoice) -> Result<DraftInvoice, PortError> {
            self.check_writable()?;
            let mut store = self.invoices.write().await;
            if !store.contains_key(&invoice.id) {
                return Err(PortError::not_found("Invoice", invoice.id));
            }
            store.insert(invoice.id, invoice.clone());
            Ok(invoice)
        }

        async fn delete_invoice(&self, id: InvoiceId) -> Result<(), PortError> {
            self.check_writable()?;
            self.invoices
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockInvoicePort;
    use super::*;
    use core_kernel::{Currency, Percentage, TenantId};

    #[tokio::test]
    async fn test_find_draft_ignores_issued() {
        let holder = Holder::Tenant(TenantId::new());
        let period = YearMonth::new(2024, 3).unwrap();
        let mut issued = DraftInvoice::new(holder, period, Currency::EUR, Percentage::ZERO, 14);
        issued.issue().unwrap();
        let port = MockInvoicePort::new().with_invoices(vec![issued]).await;

        assert!(port.find_draft(&holder, period).await.unwrap().is_none());

        let draft = DraftInvoice::new(holder, period, Currency::EUR, Percentage::ZERO, 14);
        port.insert_invoice(draft.clone()).await.unwrap();
        let found = port.find_draft(&holder, period).await.unwrap().unwrap();
        assert_eq!(found.id, draft.id);
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let port = MockInvoicePort::new();
        port.fail_writes(true);
        let holder = Holder::Tenant(TenantId::new());
        let draft = DraftInvoice::new(holder, YearMonth::new(2024, 3).unwrap(), Currency::EUR, Percentage::ZERO, 14);
        assert!(port.insert_invoice(draft).await.unwrap_err().is_transient());
    }
}
