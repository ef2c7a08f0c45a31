use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// National currency, used when a document does not name one.
pub const DEFAULT_CURRENCY: &str = "RON";

/// Country code applied to addresses without an explicit country.
pub const DEFAULT_COUNTRY: &str = "RO";

/// UN/ECE Rec 20 "piece", the default unit of measure for lines.
pub const DEFAULT_UNIT_CODE: &str = "H87";

/// The unit of work: one invoice (or credit note) as handed over by the
/// surrounding application.
///
/// Mandatory fields that the caller may fail to provide are modelled as
/// `Option` or as possibly-empty strings so that their absence is reported
/// as a [`ValidationError`](super::ValidationError) instead of being
/// unrepresentable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDocument {
    /// BT-1: Document number (2–50 characters, unique per issuer).
    pub number: String,
    /// BT-2: Issue date as supplied, expected in strict `YYYY-MM-DD` form.
    pub issue_date: String,
    /// BT-9: Payment due date.
    pub due_date: Option<NaiveDate>,
    /// BT-3: Document type code (UNTDID 1001).
    pub type_code: DocumentType,
    /// BT-5: Currency code (ISO 4217).
    pub currency_code: String,
    /// BT-22: Free-text notes.
    pub notes: Vec<String>,
    /// BG-3: Preceding document this one corrects (credit notes).
    pub billing_reference: Option<DocumentReference>,
    /// BG-4: Supplier.
    pub supplier: Party,
    /// BG-7: Customer.
    pub customer: Party,
    /// BG-25: Lines, in document order.
    pub lines: Vec<InvoiceLine>,
    /// BG-22: Declared totals.
    pub totals: DocumentTotals,
    /// BG-13: Delivery information.
    pub delivery: Option<Delivery>,
    /// BT-20: Payment terms free text.
    pub payment_terms: Option<String>,
    /// BT-81: Payment means; the supplier's bank account is the payee account.
    pub payment_means: Option<PaymentMeans>,
}

impl InvoiceDocument {
    /// Issue date parsed in strict `YYYY-MM-DD` form.
    ///
    /// Returns `None` for any other shape, including single-digit months or
    /// days and separators other than `-`.
    pub fn parsed_issue_date(&self) -> Option<NaiveDate> {
        parse_strict_date(&self.issue_date)
    }

    pub fn is_credit_note(&self) -> bool {
        self.type_code == DocumentType::CreditNote
    }
}

/// Parse a calendar date in strict `YYYY-MM-DD` form.
pub fn parse_strict_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Reference to a previously issued document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    /// BT-25: Preceding document number.
    pub number: String,
    /// BT-26: Preceding document issue date.
    pub issue_date: Option<NaiveDate>,
}

/// BG-4 / BG-7: Supplier or customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Party {
    /// BT-31 / BT-48: Tax identifier (CUI/CIF), with or without `RO` prefix.
    pub tax_id: Option<String>,
    /// BT-27 / BT-44: Legal name.
    pub name: String,
    /// BT-28 / BT-45: Trade name.
    pub trade_name: Option<String>,
    /// BG-5 / BG-8: Postal address.
    pub address: Option<Address>,
    /// BT-30 / BT-47: Trade Register number (e.g. "J40/1234/2020").
    pub registration_number: Option<String>,
    /// BT-84: Bank account (IBAN).
    pub bank_account: Option<String>,
    /// BG-6 / BG-9: Contact.
    pub contact: Option<Contact>,
}

impl Party {
    /// Whether the party is registered for VAT, i.e. its identifier carries
    /// the `RO` prefix.
    pub fn is_vat_registered(&self) -> bool {
        self.tax_id
            .as_deref()
            .map(|id| id.trim().to_ascii_uppercase().starts_with("RO"))
            .unwrap_or(false)
    }
}

/// BG-5 / BG-8: Postal address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// BT-35 / BT-50: Street and number.
    pub street: Option<String>,
    /// BT-37 / BT-52: City. For Bucharest, the sector ("SECTOR1"…"SECTOR6").
    pub city: String,
    /// BT-39 / BT-54: County name or code ("Cluj", "CJ", "RO-CJ").
    pub county: Option<String>,
    /// BT-38 / BT-53: Postal code.
    pub postal_code: Option<String>,
    /// BT-40 / BT-55: Country code (ISO 3166-1 alpha-2).
    pub country_code: String,
}

impl Address {
    /// An address counts as present when it names at least a city or a street.
    pub fn is_blank(&self) -> bool {
        self.city.trim().is_empty()
            && self.street.as_deref().is_none_or(|s| s.trim().is_empty())
    }
}

/// BG-6 / BG-9: Contact information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// BG-25: Invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// BT-126: Explicit line identifier. Lines without one are numbered
    /// sequentially from 1 on output.
    pub id: Option<String>,
    /// BT-153: Item name / description.
    pub description: String,
    /// BT-129: Quantity (must be > 0 on invoices).
    pub quantity: Option<Decimal>,
    /// BT-130: Unit of measure (UN/ECE Rec 20).
    pub unit_code: String,
    /// BT-146: Net unit price.
    pub unit_price: Option<Decimal>,
    /// BT-152: VAT rate in percent.
    pub vat_rate: Option<Decimal>,
    /// BT-151: VAT category.
    pub vat_category: VatCategory,
    /// BT-131: Line net amount. Computed from quantity, price and allowances
    /// when absent.
    pub line_total: Option<Decimal>,
    /// BG-27: Line allowances.
    pub allowances: Vec<LineAllowance>,
}

impl InvoiceLine {
    /// Line net amount: the declared total, or quantity × unit price minus
    /// allowances. Missing inputs count as zero.
    pub fn net_amount(&self) -> Decimal {
        if let Some(total) = self.line_total {
            return total;
        }
        let qty = self.quantity.unwrap_or(Decimal::ZERO);
        let price = self.unit_price.unwrap_or(Decimal::ZERO);
        let allowances: Decimal = self.allowances.iter().map(|a| a.amount).sum();
        qty * price - allowances
    }
}

/// BG-27: Line-level allowance (discount).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineAllowance {
    /// BT-136: Amount deducted from the line.
    pub amount: Decimal,
    /// BT-139: Reason text.
    pub reason: Option<String>,
}

/// UNTDID 5305: VAT category codes accepted by CIUS-RO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VatCategory {
    /// S: Standard rated.
    Standard,
    /// Z: Zero rated.
    ZeroRated,
    /// E: Exempt.
    Exempt,
    /// AE: Reverse charge (taxare inversă).
    ReverseCharge,
    /// K: Intra-community supply.
    IntraCommunity,
    /// G: Export outside the EU.
    Export,
    /// O: Not subject to VAT.
    NotSubject,
}

impl VatCategory {
    /// UNTDID 5305 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Standard => "S",
            Self::ZeroRated => "Z",
            Self::Exempt => "E",
            Self::ReverseCharge => "AE",
            Self::IntraCommunity => "K",
            Self::Export => "G",
            Self::NotSubject => "O",
        }
    }

    /// Parse from UNTDID 5305 code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(Self::Standard),
            "Z" => Some(Self::ZeroRated),
            "E" => Some(Self::Exempt),
            "AE" => Some(Self::ReverseCharge),
            "K" => Some(Self::IntraCommunity),
            "G" => Some(Self::Export),
            "O" => Some(Self::NotSubject),
            _ => None,
        }
    }
}

/// UNTDID 1001: document type codes used on e-Factura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// 380: Commercial invoice.
    Standard,
    /// 381: Credit note.
    CreditNote,
    /// 383: Debit note.
    DebitNote,
    /// 384: Corrected invoice.
    Corrective,
    /// 389: Self-billed invoice (autofactură).
    SelfBilled,
    /// 386: Prepayment invoice.
    Prepayment,
}

impl DocumentType {
    /// UNTDID 1001 numeric code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Standard => 380,
            Self::CreditNote => 381,
            Self::DebitNote => 383,
            Self::Corrective => 384,
            Self::SelfBilled => 389,
            Self::Prepayment => 386,
        }
    }

    /// Parse from UNTDID 1001 numeric code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            380 => Some(Self::Standard),
            381 => Some(Self::CreditNote),
            383 => Some(Self::DebitNote),
            384 => Some(Self::Corrective),
            389 => Some(Self::SelfBilled),
            386 => Some(Self::Prepayment),
            _ => None,
        }
    }
}

/// UNTDID 4461: payment means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMeans {
    /// 10: Cash.
    Cash,
    /// 30: Credit transfer.
    CreditTransfer,
    /// 42: Payment to bank account.
    BankAccount,
    /// 48: Bank card.
    BankCard,
    /// 97: Clearing between partners (compensare).
    Clearing,
}

impl PaymentMeans {
    pub fn code(&self) -> u16 {
        match self {
            Self::Cash => 10,
            Self::CreditTransfer => 30,
            Self::BankAccount => 42,
            Self::BankCard => 48,
            Self::Clearing => 97,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            10 => Some(Self::Cash),
            30 => Some(Self::CreditTransfer),
            42 => Some(Self::BankAccount),
            48 => Some(Self::BankCard),
            97 => Some(Self::Clearing),
            _ => None,
        }
    }
}

/// BG-13: Delivery information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    /// BT-72: Actual delivery date.
    pub date: Option<NaiveDate>,
    /// BG-15: Deliver-to address.
    pub address: Option<Address>,
}

/// BG-22: Declared document totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// BT-109: Total without VAT.
    pub net: Option<Decimal>,
    /// BT-110: Total VAT.
    pub vat: Option<Decimal>,
    /// BT-112: Total with VAT.
    pub gross: Option<Decimal>,
    /// BT-113: Prepaid amount.
    pub prepaid: Option<Decimal>,
    /// BT-114: Rounding amount.
    pub rounding: Option<Decimal>,
}

impl DocumentTotals {
    /// BT-115: Amount due = gross − prepaid + rounding.
    pub fn amount_due(&self) -> Decimal {
        self.gross.unwrap_or(Decimal::ZERO) - self.prepaid.unwrap_or(Decimal::ZERO)
            + self.rounding.unwrap_or(Decimal::ZERO)
    }
}

/// BG-23: One VAT breakdown entry per (rate, category) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatGroup {
    /// BT-118: Category.
    pub category: VatCategory,
    /// BT-119: Rate in percent.
    pub rate: Decimal,
    /// BT-116: Taxable base.
    pub taxable_amount: Decimal,
    /// BT-117: Tax amount.
    pub tax_amount: Decimal,
    /// BT-120 / BT-121: Legal exemption citation for non-standard categories.
    pub exemption: Option<ExemptionCitation>,
}

/// Exemption reason: VATEX code plus the Codul fiscal article it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionCitation {
    /// BT-121: VATEX reason code.
    pub code: String,
    /// BT-120: Reason text.
    pub text: String,
}
