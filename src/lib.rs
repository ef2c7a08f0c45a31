//! # efactura
//!
//! Romanian e-invoicing (e-Factura) compliance pipeline: document model,
//! CIUS-RO validation, UBL 2.1 generation, submission to ANAF SPV and
//! reconciliation of received and submitted documents.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! The core types follow the EN 16931 semantic model with the CIUS-RO
//! national rules on top.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use efactura::core::*;
//! use rust_decimal_macros::dec;
//!
//! let invoice = InvoiceBuilder::new("FCT-2025-001", NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
//!     .supplier(PartyBuilder::new("Alfa Soft SRL", "RO30834857")
//!         .address(AddressBuilder::new("Cluj-Napoca").street("Str. Memorandumului 28").county("Cluj").build())
//!         .build())
//!     .customer(PartyBuilder::new("Beta Trade SRL", "18590117")
//!         .address(AddressBuilder::new("Iași").street("Bd. Independenței 5").county("IS").build())
//!         .build())
//!     .add_line(LineBuilder::new("Consultanță", dec!(10), dec!(100)).vat(VatCategory::Standard, dec!(21)).build())
//!     .add_line(LineBuilder::new("Carte tehnică", dec!(1), dec!(250)).vat(VatCategory::Standard, dec!(11)).build())
//!     .build()
//!     .unwrap();
//!
//! assert!(validate(&invoice).is_empty());
//! assert_eq!(invoice.totals.gross, Some(dec!(1487.50)));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document types, CIUS-RO validation, VAT breakdown, credit notes |
//! | `ubl` | UBL 2.1 Invoice / CreditNote generation |
//! | `anaf` | Submission client, status state machine, configuration |
//! | `sync` | Periodic reconciliation job |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "anaf")]
pub mod anaf;

#[cfg(feature = "sync")]
pub mod sync;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
