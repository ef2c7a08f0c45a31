use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::TransportError;

/// `standard` query parameter of the upload call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStandard {
    /// UBL 2.1 Invoice.
    Ubl,
    /// UBL 2.1 CreditNote.
    CreditNote,
}

impl UploadStandard {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ubl => "UBL",
            Self::CreditNote => "CN",
        }
    }
}

/// Successful upload: the tracking id (`index_incarcare`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub tracking_id: String,
}

/// Status vocabulary of the `stareMesaj` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorityStatus {
    /// `ok`: accepted, a download id is available.
    Ok,
    /// `nok`: rejected with validation messages.
    Nok,
    /// `in prelucrare`: still processing.
    InProcessing,
    /// Any other answer, kept verbatim (e.g. "XML cu erori nepreluat de sistem").
    Other(String),
}

impl AuthorityStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "ok" => Self::Ok,
            "nok" => Self::Nok,
            "in prelucrare" => Self::InProcessing,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Answer to a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: AuthorityStatus,
    /// Free-text messages (`Errors/@errorMessage`), in response order.
    pub messages: Vec<String>,
    /// `id_descarcare`, present once the authority has produced a result.
    pub download_id: Option<String>,
}

/// `tip` of an SPV message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// "FACTURA PRIMITA": an invoice issued to the tenant.
    ReceivedInvoice,
    /// "FACTURA TRIMISA": confirmation of an invoice the tenant sent.
    SentInvoice,
    /// "ERORI FACTURA": rejection of an uploaded invoice.
    InvoiceErrors,
    /// "MESAJ CUMPARATOR PRIMIT / MESAJ CUMPARATOR TRANSMIS".
    BuyerMessage,
    Other(String),
}

impl MessageKind {
    pub fn from_label(label: &str) -> Self {
        let upper = label.trim().to_uppercase();
        match upper.as_str() {
            "FACTURA PRIMITA" => Self::ReceivedInvoice,
            "FACTURA TRIMISA" => Self::SentInvoice,
            "ERORI FACTURA" => Self::InvoiceErrors,
            s if s.starts_with("MESAJ CUMPARATOR") => Self::BuyerMessage,
            _ => Self::Other(label.trim().to_string()),
        }
    }
}

/// One entry of the `listaMesajeFactura` answer. Invoice content comes
/// from [`AnafTransport::download`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedInvoiceSummary {
    /// Authority message id (`id`), the key for the download call.
    pub id: String,
    /// Tracking id the issuer got on upload (`id_solicitare`).
    pub upload_index: String,
    pub kind: MessageKind,
    /// Issuer CUI, parsed from `detalii` (`cif_emitent=`).
    pub issuer_tax_id: Option<String>,
    /// `data_creare` (`YYYYMMDDHHMM`).
    pub created_at: Option<NaiveDateTime>,
    /// Raw `detalii` text.
    pub details: String,
}

/// Header fields of a downloaded invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedInvoiceDetails {
    /// Invoice number (`cbc:ID`).
    pub number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    /// First `CompanyID` of the supplier party.
    pub supplier_tax_id: Option<String>,
    pub supplier_name: Option<String>,
    /// `LegalMonetaryTotal/PayableAmount`.
    pub payable: Option<Decimal>,
    /// `TaxTotal/TaxAmount`.
    pub vat: Option<Decimal>,
    /// `currencyID` of the payable amount.
    pub currency: Option<String>,
}

/// The SPV calls the pipeline needs.
///
/// [`HttpTransport`](super::HttpTransport) talks to the real API; tests
/// substitute an in-memory fake.
#[async_trait]
pub trait AnafTransport: Send + Sync {
    /// `POST /upload?standard=…&cif=…` with the UBL document as body.
    async fn upload(
        &self,
        tax_id: &str,
        standard: UploadStandard,
        xml: &str,
    ) -> Result<UploadReceipt, TransportError>;

    /// `GET /stareMesaj/{tracking_id}`.
    async fn status(&self, tracking_id: &str) -> Result<StatusReply, TransportError>;

    /// `GET /listaMesajeFactura?zile=…&cif=…`.
    async fn list_messages(
        &self,
        tax_id: &str,
        days: u32,
    ) -> Result<Vec<ReceivedInvoiceSummary>, TransportError>;

    /// `GET /descarcare?id=…`: fetch and read the invoice behind a message.
    async fn download(&self, message_id: &str) -> Result<ReceivedInvoiceDetails, TransportError>;
}
