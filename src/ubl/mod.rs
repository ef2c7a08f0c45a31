//! UBL 2.1 generation for e-Factura (CIUS-RO).
//!
//! Standard documents are emitted as a UBL `Invoice`, type 381 as a UBL
//! `CreditNote`. The output is byte-deterministic for a given document and
//! breakdown, so it can be hashed or diffed.
//!
//! # Example
//!
//! ```no_run
//! use efactura::core::*;
//! use efactura::ubl;
//!
//! let doc: InvoiceDocument = todo!(); // build via InvoiceBuilder
//! let xml = ubl::to_ubl_xml(&doc, &aggregate(&doc.lines)).unwrap();
//! ```

mod writer;
pub(crate) mod xml_utils;

pub use writer::to_ubl_xml;
pub use xml_utils::{format_amount, format_rate};

/// CIUS-RO 1.0.1 specification identifier (BT-24).
pub const CIUS_RO_CUSTOMIZATION_ID: &str =
    "urn:cen.eu:en16931:2017#compliant#urn:efactura.mfinante.ro:CIUS-RO:1.0.1";

/// UBL 2.1 namespace URIs.
pub mod ubl_ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CREDIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
}
