//! Stable rule codes reported by the validator.
//!
//! Codes are part of the public contract: the surrounding application maps
//! them to translated messages, so they never change meaning.

pub const NUMBER_MISSING: &str = "CIUS-RO-001";
pub const NUMBER_LENGTH: &str = "CIUS-RO-002";
pub const ISSUE_DATE_MISSING: &str = "CIUS-RO-003";
pub const ISSUE_DATE_FORMAT: &str = "CIUS-RO-004";

pub const SUPPLIER_NAME: &str = "CIUS-RO-010";
pub const SUPPLIER_TAX_ID_MISSING: &str = "CIUS-RO-011";
pub const SUPPLIER_TAX_ID_CHECKSUM: &str = "CIUS-RO-012";
pub const SUPPLIER_ADDRESS: &str = "CIUS-RO-013";
pub const SUPPLIER_COUNTY: &str = "CIUS-RO-014";
pub const SUPPLIER_BANK_ACCOUNT: &str = "CIUS-RO-015";

pub const CUSTOMER_NAME: &str = "CIUS-RO-020";
pub const CUSTOMER_TAX_ID_MISSING: &str = "CIUS-RO-021";
pub const CUSTOMER_TAX_ID_CHECKSUM: &str = "CIUS-RO-022";
pub const CUSTOMER_ADDRESS: &str = "CIUS-RO-023";
pub const CUSTOMER_COUNTY: &str = "CIUS-RO-024";

pub const LINES_MISSING: &str = "CIUS-RO-030";
pub const LINE_DESCRIPTION: &str = "CIUS-RO-031";
pub const LINE_QUANTITY_MISSING: &str = "CIUS-RO-032";
pub const LINE_QUANTITY_NOT_POSITIVE: &str = "CIUS-RO-033";
pub const LINE_UNIT_PRICE_MISSING: &str = "CIUS-RO-034";
pub const LINE_VAT_RATE_MISSING: &str = "CIUS-RO-035";
pub const LINE_VAT_RATE_ILLEGAL: &str = "CIUS-RO-036";

pub const TOTAL_NET_MISSING: &str = "CIUS-RO-040";
pub const TOTAL_VAT_MISSING: &str = "CIUS-RO-041";
pub const TOTAL_GROSS_MISSING: &str = "CIUS-RO-042";
pub const TOTAL_GROSS_MISMATCH: &str = "CIUS-RO-043";
