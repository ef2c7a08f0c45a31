//! reqwest-backed client for the ANAF SPV e-Factura REST API.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::{Cursor, Read};
use std::str::FromStr;
use std::time::Duration;
use zip::ZipArchive;

use super::config::AnafConfig;
use super::error::TransportError;
use super::transport::*;

/// Prefix of the `eroare` answer meaning "nothing in the window".
const NO_MESSAGES_PREFIX: &str = "Nu exista mesaje";

/// Live transport. The bearer token comes from the OAuth flow run by the
/// surrounding application and is used as-is.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(config: &AnafConfig, token: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn send_raw(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, TransportError> {
        let resp = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, TransportError> {
        let body = self.send_raw(request).await?;
        String::from_utf8(body).map_err(|e| TransportError::Parse(e.to_string()))
    }
}

#[async_trait]
impl AnafTransport for HttpTransport {
    async fn upload(
        &self,
        tax_id: &str,
        standard: UploadStandard,
        xml: &str,
    ) -> Result<UploadReceipt, TransportError> {
        let request = self
            .client
            .post(format!("{}/upload", self.base_url))
            .query(&[("standard", standard.code()), ("cif", tax_id)])
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(xml.to_string());
        let body = self.send(request).await?;
        parse_upload_response(&body)
    }

    async fn status(&self, tracking_id: &str) -> Result<StatusReply, TransportError> {
        let request = self
            .client
            .get(format!("{}/stareMesaj/{tracking_id}", self.base_url));
        let body = self.send(request).await?;
        parse_status_response(&body)
    }

    async fn list_messages(
        &self,
        tax_id: &str,
        days: u32,
    ) -> Result<Vec<ReceivedInvoiceSummary>, TransportError> {
        let request = self
            .client
            .get(format!("{}/listaMesajeFactura", self.base_url))
            .query(&[("zile", days.to_string()), ("cif", tax_id.to_string())]);
        let body = self.send(request).await?;
        parse_message_list(&body)
    }

    async fn download(&self, message_id: &str) -> Result<ReceivedInvoiceDetails, TransportError> {
        let request = self
            .client
            .get(format!("{}/descarcare", self.base_url))
            .query(&[("id", message_id)]);
        let archive = self.send_raw(request).await?;
        parse_invoice_details(&extract_invoice_xml(&archive)?)
    }
}

/// Attributes of the root `header` element plus every `Errors/@errorMessage`.
#[derive(Debug, Default)]
struct Header {
    attrs: Vec<(String, String)>,
    errors: Vec<String>,
}

impl Header {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn read_header(xml: &str) -> Result<Header, TransportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut header = Header::default();
    let mut seen_header = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                let is_header = name.as_ref() == b"header";
                let is_error = name.as_ref() == b"Errors";
                if !is_header && !is_error {
                    continue;
                }
                seen_header |= is_header;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| TransportError::Parse(e.to_string()))?;
                    let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| TransportError::Parse(e.to_string()))?
                        .to_string();
                    if is_header {
                        header.attrs.push((key, value));
                    } else if key == "errorMessage" {
                        header.errors.push(value);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TransportError::Parse(e.to_string())),
            _ => {}
        }
    }

    if !seen_header {
        return Err(TransportError::Parse("missing header element".into()));
    }
    Ok(header)
}

/// Parse the upload answer: `ExecutionStatus="0"` with `index_incarcare` is
/// a receipt, anything else carrying `Errors` is an authority rejection.
pub fn parse_upload_response(xml: &str) -> Result<UploadReceipt, TransportError> {
    let header = read_header(xml)?;
    let status = header.attr("ExecutionStatus").map(str::to_string);
    let index = header
        .attr("index_incarcare")
        .filter(|i| !i.is_empty())
        .map(str::to_string);

    match (status.as_deref(), index) {
        (Some("0"), Some(tracking_id)) => Ok(UploadReceipt { tracking_id }),
        _ if !header.errors.is_empty() => Err(TransportError::Rejected(header.errors)),
        (status, _) => Err(TransportError::Parse(format!(
            "upload answer without tracking id (ExecutionStatus={})",
            status.unwrap_or("absent")
        ))),
    }
}

/// Parse the status answer (`stare`, `id_descarcare`, `Errors`).
pub fn parse_status_response(xml: &str) -> Result<StatusReply, TransportError> {
    let header = read_header(xml)?;
    let status = header.attr("stare").map(AuthorityStatus::from_code);
    let download_id = header
        .attr("id_descarcare")
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    match status {
        Some(status) => Ok(StatusReply {
            status,
            messages: header.errors,
            download_id,
        }),
        None if !header.errors.is_empty() => Err(TransportError::Rejected(header.errors)),
        None => Err(TransportError::Parse("status answer without 'stare'".into())),
    }
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    mesaje: Vec<RawMessage>,
    eroare: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    id: String,
    #[serde(default)]
    id_solicitare: String,
    data_creare: Option<String>,
    #[serde(default)]
    detalii: String,
    #[serde(default)]
    tip: String,
}

/// Parse the `listaMesajeFactura` JSON. "No messages in the last N days" is
/// an empty list; any other `eroare` is a rejection.
pub fn parse_message_list(json: &str) -> Result<Vec<ReceivedInvoiceSummary>, TransportError> {
    let resp: ListResponse =
        serde_json::from_str(json).map_err(|e| TransportError::Parse(e.to_string()))?;

    if let Some(err) = resp.eroare {
        if err.trim_start().starts_with(NO_MESSAGES_PREFIX) {
            return Ok(Vec::new());
        }
        return Err(TransportError::Rejected(vec![err]));
    }

    Ok(resp
        .mesaje
        .into_iter()
        .map(|m| ReceivedInvoiceSummary {
            issuer_tax_id: issuer_from_details(&m.detalii),
            created_at: m
                .data_creare
                .as_deref()
                .and_then(|d| NaiveDateTime::parse_from_str(d.trim(), "%Y%m%d%H%M").ok()),
            kind: MessageKind::from_label(&m.tip),
            id: m.id,
            upload_index: m.id_solicitare,
            details: m.detalii,
        })
        .collect())
}

/// Pull the invoice out of a `descarcare` archive.
///
/// The archive holds the invoice as `{id}.xml` next to the authority's
/// signature (`semnatura_{id}.xml`). Errors come back as a JSON `eroare`
/// body instead of an archive.
pub fn extract_invoice_xml(archive: &[u8]) -> Result<String, TransportError> {
    if archive.first() == Some(&b'{') {
        let resp: ListResponse =
            serde_json::from_slice(archive).map_err(|e| TransportError::Parse(e.to_string()))?;
        let message = resp
            .eroare
            .unwrap_or_else(|| "download answered without an archive".into());
        return Err(TransportError::Rejected(vec![message]));
    }

    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| TransportError::Parse(format!("invoice archive: {e}")))?;
    for i in 0..zip.len() {
        let mut file = zip
            .by_index(i)
            .map_err(|e| TransportError::Parse(format!("invoice archive: {e}")))?;
        let name = file.name().to_string();
        if !name.ends_with(".xml") || name.starts_with("semnatura") {
            continue;
        }
        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| TransportError::Parse(format!("{name}: {e}")))?;
        return Ok(xml);
    }
    Err(TransportError::Parse("invoice archive holds no invoice XML".into()))
}

fn parse_err(e: impl std::fmt::Display) -> TransportError {
    TransportError::Parse(e.to_string())
}

fn attr_value(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, TransportError> {
    for attr in e.attributes() {
        let attr = attr.map_err(parse_err)?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value().map_err(parse_err)?.into_owned()));
        }
    }
    Ok(None)
}

/// Read the header fields of a UBL Invoice or CreditNote.
pub fn parse_invoice_details(xml: &str) -> Result<ReceivedInvoiceDetails, TransportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut details = ReceivedInvoiceDetails::default();
    let mut payable_currency = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "PayableAmount" && path.len() == 2 && path[1] == "LegalMonetaryTotal" {
                    payable_currency = attr_value(&e, "currencyID")?;
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(parse_err)?;
                let names: Vec<&str> = path.iter().map(String::as_str).collect();
                read_field(&mut details, &names, text.trim())?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_err(e)),
            _ => {}
        }
    }

    if details.number.is_none() {
        return Err(TransportError::Parse("downloaded document has no invoice number".into()));
    }
    if details.payable.is_some() {
        details.currency = payable_currency;
    }
    Ok(details)
}

fn read_field(
    details: &mut ReceivedInvoiceDetails,
    path: &[&str],
    text: &str,
) -> Result<(), TransportError> {
    fn first(slot: &mut Option<String>, text: &str) {
        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }

    match path {
        [_, "ID"] => first(&mut details.number, text),
        [_, "IssueDate"] => {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|e| TransportError::Parse(format!("IssueDate '{text}': {e}")))?;
            details.issue_date = Some(date);
        }
        [_, "LegalMonetaryTotal", "PayableAmount"] => {
            details.payable = Some(Decimal::from_str(text).map_err(parse_err)?);
        }
        [_, "TaxTotal", "TaxAmount"] if details.vat.is_none() => {
            details.vat = Some(Decimal::from_str(text).map_err(parse_err)?);
        }
        [_, "AccountingSupplierParty", .., "CompanyID"] => {
            first(&mut details.supplier_tax_id, text)
        }
        [_, "AccountingSupplierParty", .., "PartyLegalEntity", "RegistrationName"] => {
            first(&mut details.supplier_name, text)
        }
        _ => {}
    }
    Ok(())
}

/// `detalii` reads "Factura cu id_incarcare=… emisa de cif_emitent=… pentru
/// cif_beneficiar=…".
fn issuer_from_details(details: &str) -> Option<String> {
    let (_, rest) = details.split_once("cif_emitent=")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}
