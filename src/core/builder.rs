use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::breakdown::{aggregate_with, totals_from};
use super::error::{EfacturaError, summarize};
use super::rates::VatRateTable;
use super::types::*;
use super::validation::InvoiceValidator;

/// Builder for e-Factura documents. Totals are derived from the lines.
///
/// ```
/// use efactura::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let doc = InvoiceBuilder::new("FCT-2025-001", NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
///     .supplier(PartyBuilder::new("Alfa Soft SRL", "RO30834857")
///         .address(AddressBuilder::new("Cluj-Napoca").street("Str. Memorandumului 28").county("Cluj").build())
///         .build())
///     .customer(PartyBuilder::new("Beta Trade SRL", "18590117")
///         .address(AddressBuilder::new("SECTOR1").street("Calea Victoriei 10").county("București").build())
///         .build())
///     .add_line(LineBuilder::new("Licență software", dec!(1), dec!(1000))
///         .vat(VatCategory::Standard, dec!(21))
///         .build())
///     .build()
///     .unwrap();
///
/// assert_eq!(doc.totals.gross, Some(dec!(1210.00)));
/// ```
pub struct InvoiceBuilder {
    number: String,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    type_code: DocumentType,
    currency_code: String,
    notes: Vec<String>,
    billing_reference: Option<DocumentReference>,
    supplier: Option<Party>,
    customer: Option<Party>,
    lines: Vec<InvoiceLine>,
    delivery: Option<Delivery>,
    payment_terms: Option<String>,
    payment_means: Option<PaymentMeans>,
    prepaid: Option<Decimal>,
    rates: VatRateTable,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            number: number.into(),
            issue_date,
            due_date: None,
            type_code: DocumentType::Standard,
            currency_code: DEFAULT_CURRENCY.to_string(),
            notes: Vec::new(),
            billing_reference: None,
            supplier: None,
            customer: None,
            lines: Vec::new(),
            delivery: None,
            payment_terms: None,
            payment_means: None,
            prepaid: None,
            rates: VatRateTable::default(),
        }
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn type_code(mut self, code: DocumentType) -> Self {
        self.type_code = code;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn billing_reference(mut self, number: impl Into<String>, date: Option<NaiveDate>) -> Self {
        self.billing_reference = Some(DocumentReference {
            number: number.into(),
            issue_date: date,
        });
        self
    }

    pub fn supplier(mut self, party: Party) -> Self {
        self.supplier = Some(party);
        self
    }

    pub fn customer(mut self, party: Party) -> Self {
        self.customer = Some(party);
        self
    }

    pub fn add_line(mut self, line: InvoiceLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn delivery(mut self, date: Option<NaiveDate>, address: Option<Address>) -> Self {
        self.delivery = Some(Delivery { date, address });
        self
    }

    pub fn payment_terms(mut self, terms: impl Into<String>) -> Self {
        self.payment_terms = Some(terms.into());
        self
    }

    pub fn payment_means(mut self, means: PaymentMeans) -> Self {
        self.payment_means = Some(means);
        self
    }

    pub fn prepaid(mut self, amount: Decimal) -> Self {
        self.prepaid = Some(amount);
        self
    }

    /// Rate table used for both totals citations and validation.
    pub fn rates(mut self, rates: VatRateTable) -> Self {
        self.rates = rates;
        self
    }

    /// Build the document, derive totals from the lines and run the CIUS-RO
    /// validator. All findings are reported, not just the first.
    pub fn build(self) -> Result<InvoiceDocument, EfacturaError> {
        let validator = InvoiceValidator::new(self.rates.clone());
        let doc = self.build_unchecked()?;
        let errors = validator.validate(&doc);
        if !errors.is_empty() {
            return Err(EfacturaError::Validation(summarize(&errors)));
        }
        Ok(doc)
    }

    /// Build without validation, for importing external data or for tests
    /// that need deliberately broken documents.
    pub fn build_unchecked(self) -> Result<InvoiceDocument, EfacturaError> {
        let supplier = self
            .supplier
            .ok_or_else(|| EfacturaError::Builder("supplier is required".into()))?;
        let customer = self
            .customer
            .ok_or_else(|| EfacturaError::Builder("customer is required".into()))?;

        if self.lines.is_empty() {
            return Err(EfacturaError::Builder(
                "at least one line is required".into(),
            ));
        }
        if self.lines.len() > 10_000 {
            return Err(EfacturaError::Builder(
                "document cannot have more than 10,000 lines".into(),
            ));
        }

        let groups = aggregate_with(&self.lines, &self.rates);
        let mut totals = totals_from(&groups);
        totals.prepaid = self.prepaid;

        Ok(InvoiceDocument {
            number: self.number,
            issue_date: self.issue_date.format("%Y-%m-%d").to_string(),
            due_date: self.due_date,
            type_code: self.type_code,
            currency_code: self.currency_code,
            notes: self.notes,
            billing_reference: self.billing_reference,
            supplier,
            customer,
            lines: self.lines,
            totals,
            delivery: self.delivery,
            payment_terms: self.payment_terms,
            payment_means: self.payment_means,
        })
    }
}

/// Builder for a supplier or customer.
pub struct PartyBuilder {
    name: String,
    tax_id: Option<String>,
    trade_name: Option<String>,
    address: Option<Address>,
    registration_number: Option<String>,
    bank_account: Option<String>,
    contact: Option<Contact>,
}

impl PartyBuilder {
    pub fn new(name: impl Into<String>, tax_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_id: Some(tax_id.into()),
            trade_name: None,
            address: None,
            registration_number: None,
            bank_account: None,
            contact: None,
        }
    }

    pub fn trade_name(mut self, name: impl Into<String>) -> Self {
        self.trade_name = Some(name.into());
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn registration_number(mut self, number: impl Into<String>) -> Self {
        self.registration_number = Some(number.into());
        self
    }

    pub fn bank_account(mut self, iban: impl Into<String>) -> Self {
        self.bank_account = Some(iban.into());
        self
    }

    pub fn contact(
        mut self,
        name: Option<String>,
        phone: Option<String>,
        email: Option<String>,
    ) -> Self {
        self.contact = Some(Contact { name, phone, email });
        self
    }

    pub fn build(self) -> Party {
        Party {
            tax_id: self.tax_id,
            name: self.name,
            trade_name: self.trade_name,
            address: self.address,
            registration_number: self.registration_number,
            bank_account: self.bank_account,
            contact: self.contact,
        }
    }
}

/// Builder for Address. Country defaults to Romania.
pub struct AddressBuilder {
    street: Option<String>,
    city: String,
    county: Option<String>,
    postal_code: Option<String>,
    country_code: String,
}

impl AddressBuilder {
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            street: None,
            city: city.into(),
            county: None,
            postal_code: None,
            country_code: DEFAULT_COUNTRY.to_string(),
        }
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn postal_code(mut self, code: impl Into<String>) -> Self {
        self.postal_code = Some(code.into());
        self
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country_code = code.into();
        self
    }

    pub fn build(self) -> Address {
        Address {
            street: self.street,
            city: self.city,
            county: self.county,
            postal_code: self.postal_code,
            country_code: self.country_code,
        }
    }
}

/// Builder for InvoiceLine. Defaults to standard-rated 21 %.
pub struct LineBuilder {
    id: Option<String>,
    description: String,
    quantity: Decimal,
    unit_code: String,
    unit_price: Decimal,
    vat_category: VatCategory,
    vat_rate: Decimal,
    allowances: Vec<LineAllowance>,
}

impl LineBuilder {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            id: None,
            description: description.into(),
            quantity,
            unit_code: DEFAULT_UNIT_CODE.to_string(),
            unit_price,
            vat_category: VatCategory::Standard,
            vat_rate: Decimal::new(21, 0),
            allowances: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn unit(mut self, code: impl Into<String>) -> Self {
        self.unit_code = code.into();
        self
    }

    pub fn vat(mut self, category: VatCategory, rate: Decimal) -> Self {
        self.vat_category = category;
        self.vat_rate = rate;
        self
    }

    pub fn allowance(mut self, amount: Decimal, reason: Option<String>) -> Self {
        self.allowances.push(LineAllowance { amount, reason });
        self
    }

    pub fn build(self) -> InvoiceLine {
        let allowances: Decimal = self.allowances.iter().map(|a| a.amount).sum();
        InvoiceLine {
            id: self.id,
            description: self.description,
            quantity: Some(self.quantity),
            unit_code: self.unit_code,
            unit_price: Some(self.unit_price),
            vat_rate: Some(self.vat_rate),
            vat_category: self.vat_category,
            line_total: Some(self.quantity * self.unit_price - allowances),
            allowances: self.allowances,
        }
    }
}
