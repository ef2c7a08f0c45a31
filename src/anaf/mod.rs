//! Submission to ANAF SPV: upload, status polling, message listing and
//! download of received invoices.
//!
//! [`SubmissionClient`] owns the submission state machine; the network sits
//! behind the [`AnafTransport`] trait so the whole flow can run against an
//! in-memory fake.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use efactura::anaf::*;
//! use efactura::core::*;
//!
//! # async fn run(doc: InvoiceDocument) -> Result<(), Box<dyn std::error::Error>> {
//! let config = EfacturaConfig::load("efactura.toml")?;
//! let transport = HttpTransport::new(&config.anaf, "bearer-token")?;
//! let client = SubmissionClient::new(Arc::new(transport));
//!
//! let validated = client.prepare(doc).map_err(|errors| summarize(&errors))?;
//! let issuer = IssuerProfile { tax_id: Some("RO30834857".into()), ..Default::default() };
//! match client.submit(&validated, &issuer, chrono::Utc::now()).await? {
//!     SubmissionOutcome::Submitted(record) => println!("tracking id {}", record.tracking_id),
//!     SubmissionOutcome::Failed { error } => eprintln!("upload failed: {error}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod http;
mod state;
mod transport;

pub use client::*;
pub use self::config::*;
pub use error::*;
pub use http::{
    HttpTransport, extract_invoice_xml, parse_invoice_details, parse_message_list,
    parse_status_response, parse_upload_response,
};
pub use state::*;
pub use transport::*;
