//! Core e-Factura types, validation, VAT breakdown and credit notes.
//!
//! This module provides the document model handed over by the surrounding
//! application, the CIUS-RO field and checksum rules, and the derived VAT
//! breakdown. Everything here is pure and free of I/O.

mod breakdown;
mod builder;
mod checksum;
mod counties;
mod credit_note;
mod error;
mod rates;
pub mod rules;
mod types;
mod validation;

pub use breakdown::*;
pub use builder::*;
pub use checksum::*;
pub use counties::{county_code, is_known_county};
pub use credit_note::*;
pub use error::*;
pub use rates::*;
pub use types::*;
pub use validation::*;
