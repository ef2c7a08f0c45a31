use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::checksum::{validate_bank_account, validate_tax_id};
use super::counties::is_known_county;
use super::error::ValidationError;
use super::rates::VatRateTable;
use super::rules;
use super::types::*;

/// Tolerance for `net + VAT == gross`, one ban.
pub const TOTALS_TOLERANCE: Decimal = dec!(0.01);

const NUMBER_MIN_LEN: usize = 2;
const NUMBER_MAX_LEN: usize = 50;

/// Applies the CIUS-RO mandatory-field and cross-field catalog.
///
/// Pure and side-effect free: usable for a dry-run preview before any
/// network call, and from any number of threads at once.
#[derive(Debug, Clone, Default)]
pub struct InvoiceValidator {
    rates: VatRateTable,
}

impl InvoiceValidator {
    pub fn new(rates: VatRateTable) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &VatRateTable {
        &self.rates
    }

    /// Validate a document. Returns every finding, in a fixed order:
    /// header, supplier, customer, lines (by index), totals.
    pub fn validate(&self, doc: &InvoiceDocument) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        validate_header(doc, &mut errors);

        validate_party(
            &doc.supplier,
            "supplier",
            &PartyRules {
                name: rules::SUPPLIER_NAME,
                tax_id_missing: rules::SUPPLIER_TAX_ID_MISSING,
                tax_id_checksum: rules::SUPPLIER_TAX_ID_CHECKSUM,
                address: rules::SUPPLIER_ADDRESS,
                county: rules::SUPPLIER_COUNTY,
            },
            &mut errors,
        );
        if let Some(iban) = &doc.supplier.bank_account {
            if !validate_bank_account(iban) {
                errors.push(ValidationError::new(
                    "supplier.bank_account",
                    format!("bank account '{iban}' is not a valid Romanian IBAN"),
                    rules::SUPPLIER_BANK_ACCOUNT,
                ));
            }
        }

        // B2B only: the customer tax id is always mandatory.
        validate_party(
            &doc.customer,
            "customer",
            &PartyRules {
                name: rules::CUSTOMER_NAME,
                tax_id_missing: rules::CUSTOMER_TAX_ID_MISSING,
                tax_id_checksum: rules::CUSTOMER_TAX_ID_CHECKSUM,
                address: rules::CUSTOMER_ADDRESS,
                county: rules::CUSTOMER_COUNTY,
            },
            &mut errors,
        );

        if doc.lines.is_empty() {
            errors.push(ValidationError::new(
                "lines",
                "document must have at least one line",
                rules::LINES_MISSING,
            ));
        }
        let issue_date = doc.parsed_issue_date();
        for (i, line) in doc.lines.iter().enumerate() {
            self.validate_line(line, i, doc.is_credit_note(), issue_date, &mut errors);
        }

        validate_totals(&doc.totals, &mut errors);

        errors
    }

    fn validate_line(
        &self,
        line: &InvoiceLine,
        index: usize,
        credit_note: bool,
        issue_date: Option<chrono::NaiveDate>,
        errors: &mut Vec<ValidationError>,
    ) {
        let prefix = format!("lines[{index}]");

        if line.description.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{prefix}.description"),
                "line description must not be empty",
                rules::LINE_DESCRIPTION,
            ));
        }

        match line.quantity {
            None => errors.push(ValidationError::new(
                format!("{prefix}.quantity"),
                "line quantity is required",
                rules::LINE_QUANTITY_MISSING,
            )),
            // Credit notes carry reversed (negative) quantities.
            Some(qty) if credit_note && qty.is_zero() => errors.push(ValidationError::new(
                format!("{prefix}.quantity"),
                "credit note quantity must not be zero",
                rules::LINE_QUANTITY_NOT_POSITIVE,
            )),
            Some(qty) if !credit_note && qty <= Decimal::ZERO => {
                errors.push(ValidationError::new(
                    format!("{prefix}.quantity"),
                    format!("line quantity must be greater than zero, got {qty}"),
                    rules::LINE_QUANTITY_NOT_POSITIVE,
                ))
            }
            Some(_) => {}
        }

        if line.unit_price.is_none() {
            errors.push(ValidationError::new(
                format!("{prefix}.unit_price"),
                "line unit price is required",
                rules::LINE_UNIT_PRICE_MISSING,
            ));
        }

        match line.vat_rate {
            None => errors.push(ValidationError::new(
                format!("{prefix}.vat_rate"),
                "line VAT rate is required",
                rules::LINE_VAT_RATE_MISSING,
            )),
            Some(rate) if !self.rates.is_legal_rate(rate, issue_date) => {
                let legal = self
                    .rates
                    .rates_on(issue_date)
                    .iter()
                    .map(|r| r.normalize().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                errors.push(ValidationError::new(
                    format!("{prefix}.vat_rate"),
                    format!("VAT rate {} is not a legal rate ({legal})", rate.normalize()),
                    rules::LINE_VAT_RATE_ILLEGAL,
                ));
            }
            Some(_) => {}
        }
    }
}

/// Validate a document against the default rate table.
pub fn validate(doc: &InvoiceDocument) -> Vec<ValidationError> {
    InvoiceValidator::default().validate(doc)
}

fn validate_header(doc: &InvoiceDocument, errors: &mut Vec<ValidationError>) {
    let number = doc.number.trim();
    if number.is_empty() {
        errors.push(ValidationError::new(
            "number",
            "document number must not be empty",
            rules::NUMBER_MISSING,
        ));
    } else {
        let len = number.chars().count();
        if !(NUMBER_MIN_LEN..=NUMBER_MAX_LEN).contains(&len) {
            errors.push(ValidationError::new(
                "number",
                format!(
                    "document number must be {NUMBER_MIN_LEN}-{NUMBER_MAX_LEN} characters, got {len}"
                ),
                rules::NUMBER_LENGTH,
            ));
        }
    }

    if doc.issue_date.trim().is_empty() {
        errors.push(ValidationError::new(
            "issue_date",
            "issue date is required",
            rules::ISSUE_DATE_MISSING,
        ));
    } else if doc.parsed_issue_date().is_none() {
        errors.push(ValidationError::new(
            "issue_date",
            format!("issue date '{}' is not a YYYY-MM-DD date", doc.issue_date),
            rules::ISSUE_DATE_FORMAT,
        ));
    }
}

struct PartyRules {
    name: &'static str,
    tax_id_missing: &'static str,
    tax_id_checksum: &'static str,
    address: &'static str,
    county: &'static str,
}

fn validate_party(
    party: &Party,
    prefix: &str,
    codes: &PartyRules,
    errors: &mut Vec<ValidationError>,
) {
    if party.name.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.name"),
            "name must not be empty",
            codes.name,
        ));
    }

    match party.tax_id.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::new(
            format!("{prefix}.tax_id"),
            "tax identifier (CUI/CIF) is required",
            codes.tax_id_missing,
        )),
        Some(id) if !validate_tax_id(id) => errors.push(ValidationError::new(
            format!("{prefix}.tax_id"),
            format!("tax identifier '{id}' fails the CUI check digit"),
            codes.tax_id_checksum,
        )),
        Some(_) => {}
    }

    match &party.address {
        Some(address) if !address.is_blank() => {
            let romanian = address.country_code.trim().eq_ignore_ascii_case("RO");
            if let Some(county) = &address.county {
                if romanian && !is_known_county(county) {
                    errors.push(ValidationError::new(
                        format!("{prefix}.address.county"),
                        format!("'{county}' is not a Romanian county (ISO 3166-2:RO)"),
                        codes.county,
                    ));
                }
            }
        }
        _ => errors.push(ValidationError::new(
            format!("{prefix}.address"),
            "postal address is required",
            codes.address,
        )),
    }
}

fn validate_totals(totals: &DocumentTotals, errors: &mut Vec<ValidationError>) {
    if totals.net.is_none() {
        errors.push(ValidationError::new(
            "totals.net",
            "net total is required",
            rules::TOTAL_NET_MISSING,
        ));
    }
    if totals.vat.is_none() {
        errors.push(ValidationError::new(
            "totals.vat",
            "VAT total is required",
            rules::TOTAL_VAT_MISSING,
        ));
    }
    if totals.gross.is_none() {
        errors.push(ValidationError::new(
            "totals.gross",
            "gross total is required",
            rules::TOTAL_GROSS_MISSING,
        ));
    }

    if let (Some(net), Some(vat), Some(gross)) = (totals.net, totals.vat, totals.gross) {
        if (net + vat - gross).abs() > TOTALS_TOLERANCE {
            errors.push(ValidationError::new(
                "totals.gross",
                format!("gross total {gross} does not match net {net} + VAT {vat}"),
                rules::TOTAL_GROSS_MISMATCH,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AddressBuilder;

    fn line(rate: Decimal) -> InvoiceLine {
        InvoiceLine {
            id: None,
            description: "Servicii".into(),
            quantity: Some(dec!(1)),
            unit_code: DEFAULT_UNIT_CODE.into(),
            unit_price: Some(dec!(100)),
            vat_rate: Some(rate),
            vat_category: VatCategory::Standard,
            line_total: None,
            allowances: Vec::new(),
        }
    }

    fn party(tax_id: &str) -> Party {
        Party {
            tax_id: Some(tax_id.into()),
            name: "Firma SRL".into(),
            address: Some(
                AddressBuilder::new("Cluj-Napoca")
                    .street("Str. Lunga 1")
                    .county("Cluj")
                    .build(),
            ),
            ..Party::default()
        }
    }

    fn doc(lines: Vec<InvoiceLine>) -> InvoiceDocument {
        InvoiceDocument {
            number: "FCT-001".into(),
            issue_date: "2025-09-01".into(),
            due_date: None,
            type_code: DocumentType::Standard,
            currency_code: DEFAULT_CURRENCY.into(),
            notes: Vec::new(),
            billing_reference: None,
            supplier: party("RO30834857"),
            customer: party("18590117"),
            lines,
            totals: DocumentTotals {
                net: Some(dec!(100)),
                vat: Some(dec!(21)),
                gross: Some(dec!(121)),
                prepaid: None,
                rounding: None,
            },
            delivery: None,
            payment_terms: None,
            payment_means: None,
        }
    }

    #[test]
    fn clean_document() {
        assert!(validate(&doc(vec![line(dec!(21))])).is_empty());
    }

    #[test]
    fn illegal_rate_reported_once_per_line() {
        let errors = validate(&doc(vec![line(dec!(20)), line(dec!(21)), line(dec!(24))]));
        let rate_errors: Vec<_> = errors
            .iter()
            .filter(|e| e.rule == rules::LINE_VAT_RATE_ILLEGAL)
            .collect();
        assert_eq!(rate_errors.len(), 2);
        assert_eq!(rate_errors[0].field, "lines[0].vat_rate");
        assert_eq!(rate_errors[1].field, "lines[2].vat_rate");
    }

    #[test]
    fn strict_date_format() {
        for bad in ["2025/09/01", "01-09-2025", "2025-9-1", "2025-02-30", "20250901"] {
            let mut d = doc(vec![line(dec!(21))]);
            d.issue_date = bad.into();
            let errors = validate(&d);
            assert_eq!(errors.len(), 1, "{bad}");
            assert_eq!(errors[0].rule, rules::ISSUE_DATE_FORMAT);
        }
    }

    #[test]
    fn tolerance_is_one_ban() {
        let mut d = doc(vec![line(dec!(21))]);
        d.totals.gross = Some(dec!(121.01));
        assert!(validate(&d).is_empty());
        d.totals.gross = Some(dec!(121.02));
        let errors = validate(&d);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, rules::TOTAL_GROSS_MISMATCH);
    }

    #[test]
    fn credit_note_allows_negative_quantity() {
        let mut d = doc(vec![line(dec!(21))]);
        d.type_code = DocumentType::CreditNote;
        d.lines[0].quantity = Some(dec!(-1));
        assert!(validate(&d).is_empty());

        d.type_code = DocumentType::Standard;
        let errors = validate(&d);
        assert_eq!(errors[0].rule, rules::LINE_QUANTITY_NOT_POSITIVE);
    }

    #[test]
    fn foreign_county_not_checked() {
        let mut d = doc(vec![line(dec!(21))]);
        d.customer.address = Some(
            AddressBuilder::new("München")
                .street("Hauptstr. 1")
                .county("Bayern")
                .country("DE")
                .build(),
        );
        assert!(validate(&d).is_empty());
    }
}
