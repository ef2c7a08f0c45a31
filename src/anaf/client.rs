use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{AnafError, TransportError};
use super::state::{SubmissionRecord, SubmissionState};
use super::transport::{AnafTransport, ReceivedInvoiceDetails, ReceivedInvoiceSummary, UploadStandard};
use crate::core::*;
use crate::ubl::to_ubl_xml;

/// Issuer profile fields supplied by the surrounding application.
#[derive(Debug, Clone, Default)]
pub struct IssuerProfile {
    /// CUI the upload is made under. Required.
    pub tax_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
}

/// A document that passed validation, together with its VAT breakdown.
///
/// Only [`SubmissionClient::prepare`] creates one, so an upload can never
/// carry an unvalidated document.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    document: InvoiceDocument,
    breakdown: Vec<VatGroup>,
}

impl ValidatedDocument {
    pub fn document(&self) -> &InvoiceDocument {
        &self.document
    }

    pub fn breakdown(&self) -> &[VatGroup] {
        &self.breakdown
    }

    pub fn into_document(self) -> InvoiceDocument {
        self.document
    }

    /// The UBL body that [`SubmissionClient::submit`] uploads.
    pub fn to_xml(&self) -> Result<String, EfacturaError> {
        to_ubl_xml(&self.document, &self.breakdown)
    }

    fn upload_standard(&self) -> UploadStandard {
        if self.document.is_credit_note() {
            UploadStandard::CreditNote
        } else {
            UploadStandard::Ubl
        }
    }
}

/// Result of an upload attempt.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Accepted for processing; persist the record and poll it.
    Submitted(SubmissionRecord),
    /// Network failure or authority-side refusal. Nothing was registered
    /// with the authority and no record exists.
    Failed { error: TransportError },
}

impl SubmissionOutcome {
    pub fn state(&self) -> SubmissionState {
        match self {
            Self::Submitted(record) => record.state,
            Self::Failed { .. } => SubmissionState::Error,
        }
    }

    pub fn record(&self) -> Option<&SubmissionRecord> {
        match self {
            Self::Submitted(record) => Some(record),
            Self::Failed { .. } => None,
        }
    }
}

/// Drives documents through validation, upload and status polling.
///
/// Makes exactly one authority call per upload, poll or listing and never
/// retries.
#[derive(Clone)]
pub struct SubmissionClient {
    transport: Arc<dyn AnafTransport>,
    validator: InvoiceValidator,
}

impl SubmissionClient {
    pub fn new(transport: Arc<dyn AnafTransport>) -> Self {
        Self::with_validator(transport, InvoiceValidator::default())
    }

    pub fn with_validator(transport: Arc<dyn AnafTransport>, validator: InvoiceValidator) -> Self {
        Self {
            transport,
            validator,
        }
    }

    /// Draft → Validated. Returns every finding when the document is not
    /// submission-ready, including breakdown/totals disagreements.
    pub fn prepare(
        &self,
        document: InvoiceDocument,
    ) -> Result<ValidatedDocument, Vec<ValidationError>> {
        let mut errors = self.validator.validate(&document);
        let breakdown = aggregate_with(&document.lines, self.validator.rates());
        errors.extend(check_totals(&breakdown, &document.totals));

        if !errors.is_empty() {
            debug!(
                number = %document.number,
                errors = errors.len(),
                "document kept in draft"
            );
            return Err(errors);
        }
        Ok(ValidatedDocument {
            document,
            breakdown,
        })
    }

    /// Validated → Submitted, or Error when the upload fails.
    ///
    /// A missing issuer tax id is a caller mistake and is returned as an
    /// error before any network call.
    pub async fn submit(
        &self,
        validated: &ValidatedDocument,
        issuer: &IssuerProfile,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, EfacturaError> {
        let tax_id = issuer
            .tax_id
            .as_deref()
            .and_then(normalize_tax_id)
            .ok_or(EfacturaError::MissingProfileField("issuer.tax_id"))?;

        let xml = validated.to_xml()?;
        let number = &validated.document.number;

        match self
            .transport
            .upload(&tax_id, validated.upload_standard(), &xml)
            .await
        {
            Ok(receipt) => {
                info!(
                    number = %number,
                    cif = %tax_id,
                    tracking_id = %receipt.tracking_id,
                    "document uploaded"
                );
                Ok(SubmissionOutcome::Submitted(SubmissionRecord::new(
                    receipt.tracking_id,
                    tax_id,
                    number.clone(),
                    now,
                )))
            }
            Err(error) => {
                warn!(number = %number, cif = %tax_id, %error, "upload failed");
                Ok(SubmissionOutcome::Failed { error })
            }
        }
    }

    /// Poll the authority once and apply the answer to `record`.
    ///
    /// Terminal records are refused before any network call. A transport
    /// failure leaves the record untouched.
    pub async fn check_status(
        &self,
        record: &mut SubmissionRecord,
        now: DateTime<Utc>,
    ) -> Result<SubmissionState, AnafError> {
        if !record.is_pending() {
            return Err(EfacturaError::InvalidTransition {
                from: record.state.to_string(),
                event: "status poll".into(),
            }
            .into());
        }

        let reply = self.transport.status(&record.tracking_id).await?;
        let before = record.state;
        let after = record.apply_status(&reply, now)?;
        if before != after {
            info!(
                tracking_id = %record.tracking_id,
                number = %record.document_number,
                state = %after,
                "submission settled"
            );
        } else {
            debug!(tracking_id = %record.tracking_id, "submission still processing");
        }
        Ok(after)
    }

    /// Invoice messages held by the authority for `tax_id` in the last
    /// `days` days.
    pub async fn list_received(
        &self,
        tax_id: &str,
        days: u32,
    ) -> Result<Vec<ReceivedInvoiceSummary>, AnafError> {
        let cif =
            normalize_tax_id(tax_id).ok_or(EfacturaError::MissingProfileField("tenant.tax_id"))?;
        Ok(self.transport.list_messages(&cif, days).await?)
    }

    /// Download the invoice behind a received-invoice message.
    pub async fn download_received(
        &self,
        message_id: &str,
    ) -> Result<ReceivedInvoiceDetails, AnafError> {
        let details = self.transport.download(message_id).await?;
        debug!(
            message_id,
            number = details.number.as_deref().unwrap_or_default(),
            "received invoice downloaded"
        );
        Ok(details)
    }
}
