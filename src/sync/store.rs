use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::error::StoreError;
use crate::core::normalize_tax_id;
use crate::anaf::{ReceivedInvoiceDetails, ReceivedInvoiceSummary, SubmissionRecord};

/// A company the job reconciles on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// CUI registered in SPV. Tenants without one are skipped.
    pub tax_id: Option<String>,
}

/// An invoice received through SPV, created once per (tenant, authority id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedInvoiceRecord {
    pub tenant_id: String,
    /// Authority message id; unique per tenant.
    pub authority_id: String,
    pub issuer_tax_id: Option<String>,
    pub issuer_name: Option<String>,
    /// The issuer's invoice number.
    pub invoice_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    /// Payable amount.
    pub total: Option<Decimal>,
    pub vat_total: Option<Decimal>,
    pub currency: Option<String>,
    /// Issuer's upload tracking id (`id_solicitare`).
    pub upload_index: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl ReceivedInvoiceRecord {
    pub fn from_summary(
        tenant_id: impl Into<String>,
        summary: &ReceivedInvoiceSummary,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            authority_id: summary.id.clone(),
            issuer_tax_id: summary.issuer_tax_id.clone(),
            issuer_name: None,
            invoice_number: None,
            issue_date: None,
            total: None,
            vat_total: None,
            currency: None,
            upload_index: summary.upload_index.clone(),
            details: summary.details.clone(),
            created_at,
        }
    }

    /// Fill in the fields read from the downloaded invoice. The issuer tax
    /// id from the message list wins over the one in the document.
    pub fn with_details(mut self, details: ReceivedInvoiceDetails) -> Self {
        if self.issuer_tax_id.is_none() {
            self.issuer_tax_id = details
                .supplier_tax_id
                .as_deref()
                .and_then(normalize_tax_id)
                .or(details.supplier_tax_id);
        }
        self.issuer_name = details.supplier_name;
        self.invoice_number = details.number;
        self.issue_date = details.issue_date;
        self.total = details.payable;
        self.vat_total = details.vat;
        self.currency = details.currency;
        self
    }
}

/// Persistence owned by the surrounding application.
///
/// The job only performs idempotent creates and single-record updates.
#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    async fn tenants(&self) -> Result<Vec<Tenant>, StoreError>;

    async fn has_received(&self, tenant_id: &str, authority_id: &str) -> Result<bool, StoreError>;

    /// Create unless a record with the same (tenant, authority id) exists.
    /// Returns whether a record was created.
    async fn create_received(&self, record: ReceivedInvoiceRecord) -> Result<bool, StoreError>;

    /// Records still in the `Submitted` state.
    async fn pending_submissions(&self) -> Result<Vec<SubmissionRecord>, StoreError>;

    /// Replace the record with the same tracking id.
    async fn update_submission(&self, record: &SubmissionRecord) -> Result<(), StoreError>;
}

/// In-memory store for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tenants: Mutex<Vec<Tenant>>,
    received: Mutex<Vec<ReceivedInvoiceRecord>>,
    submissions: Mutex<Vec<SubmissionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_tenant(&self, tenant: Tenant) {
        self.tenants.lock().await.push(tenant);
    }

    pub async fn add_submission(&self, record: SubmissionRecord) {
        self.submissions.lock().await.push(record);
    }

    pub async fn received(&self) -> Vec<ReceivedInvoiceRecord> {
        self.received.lock().await.clone()
    }

    pub async fn submissions(&self) -> Vec<SubmissionRecord> {
        self.submissions.lock().await.clone()
    }
}

#[async_trait]
impl ReconciliationStore for MemoryStore {
    async fn tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        Ok(self.tenants.lock().await.clone())
    }

    async fn has_received(&self, tenant_id: &str, authority_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .received
            .lock()
            .await
            .iter()
            .any(|r| r.tenant_id == tenant_id && r.authority_id == authority_id))
    }

    async fn create_received(&self, record: ReceivedInvoiceRecord) -> Result<bool, StoreError> {
        let mut received = self.received.lock().await;
        let exists = received
            .iter()
            .any(|r| r.tenant_id == record.tenant_id && r.authority_id == record.authority_id);
        if exists {
            return Ok(false);
        }
        received.push(record);
        Ok(true)
    }

    async fn pending_submissions(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        Ok(self
            .submissions
            .lock()
            .await
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect())
    }

    async fn update_submission(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        let mut submissions = self.submissions.lock().await;
        let slot = submissions
            .iter_mut()
            .find(|r| r.tracking_id == record.tracking_id)
            .ok_or_else(|| StoreError::NotFound(record.tracking_id.clone()))?;
        *slot = record.clone();
        Ok(())
    }
}
