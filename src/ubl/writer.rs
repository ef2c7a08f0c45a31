use rust_decimal::Decimal;

use super::xml_utils::{XmlResult, XmlWriter, format_rate};
use super::{CIUS_RO_CUSTOMIZATION_ID, ubl_ns};
use crate::core::*;

/// Generate CIUS-RO UBL 2.1 XML from a document and its VAT breakdown.
///
/// Type 381 documents become a UBL `CreditNote`, everything else a UBL
/// `Invoice`. A `CreditNote` root already means "reversed", so the
/// sign-reversed amounts and quantities of a credit note are written with
/// their sign flipped back: crediting 10 units at 100 RON and 21% VAT
/// reads `CreditedQuantity` 10 and `PayableAmount` 121. Allowances and
/// unit prices are never negative and are written as they are.
///
/// The document is not re-validated; declared totals must be present.
pub fn to_ubl_xml(doc: &InvoiceDocument, breakdown: &[VatGroup]) -> XmlResult {
    let missing =
        |what: &str| EfacturaError::Xml(format!("{what} total is required for XML generation"));
    let net = doc.totals.net.ok_or_else(|| missing("net"))?;
    let vat = doc.totals.vat.ok_or_else(|| missing("VAT"))?;
    let gross = doc.totals.gross.ok_or_else(|| missing("gross"))?;

    let currency = &doc.currency_code;
    let credit_note = doc.is_credit_note();
    let sign = if credit_note {
        Decimal::NEGATIVE_ONE
    } else {
        Decimal::ONE
    };
    let mut w = XmlWriter::new()?;

    let (root_tag, root_ns) = if credit_note {
        ("ubl:CreditNote", ubl_ns::CREDIT_NOTE)
    } else {
        ("ubl:Invoice", ubl_ns::INVOICE)
    };

    w.start_element_with_attrs(
        root_tag,
        &[
            ("xmlns:ubl", root_ns),
            ("xmlns:cac", ubl_ns::CAC),
            ("xmlns:cbc", ubl_ns::CBC),
        ],
    )?;

    // BT-24: CustomizationID
    w.text_element("cbc:CustomizationID", CIUS_RO_CUSTOMIZATION_ID)?;
    // BT-1: Document number
    w.text_element("cbc:ID", &doc.number)?;
    // BT-2: Issue date
    w.text_element("cbc:IssueDate", doc.issue_date.trim())?;
    // BT-9: Due date (a CreditNote carries it under PaymentMeans instead)
    if !credit_note {
        if let Some(due) = &doc.due_date {
            w.text_element("cbc:DueDate", &due.to_string())?;
        }
    }
    // BT-3: Type code
    let type_tag = if credit_note {
        "cbc:CreditNoteTypeCode"
    } else {
        "cbc:InvoiceTypeCode"
    };
    w.text_element(type_tag, &doc.type_code.code().to_string())?;
    // BT-22: Notes
    for note in &doc.notes {
        w.text_element("cbc:Note", note)?;
    }
    // BT-5: Currency code
    w.text_element("cbc:DocumentCurrencyCode", currency)?;

    // BG-3: Billing reference
    if let Some(reference) = &doc.billing_reference {
        w.start_element("cac:BillingReference")?;
        w.start_element("cac:InvoiceDocumentReference")?;
        w.text_element("cbc:ID", &reference.number)?;
        if let Some(d) = &reference.issue_date {
            w.text_element("cbc:IssueDate", &d.to_string())?;
        }
        w.end_element("cac:InvoiceDocumentReference")?;
        w.end_element("cac:BillingReference")?;
    }

    // BG-4: Supplier
    write_party(&mut w, &doc.supplier, "cac:AccountingSupplierParty")?;
    // BG-7: Customer
    write_party(&mut w, &doc.customer, "cac:AccountingCustomerParty")?;

    // BG-13: Delivery
    if let Some(delivery) = &doc.delivery {
        w.start_element("cac:Delivery")?;
        if let Some(date) = &delivery.date {
            w.text_element("cbc:ActualDeliveryDate", &date.to_string())?;
        }
        if let Some(address) = &delivery.address {
            w.start_element("cac:DeliveryLocation")?;
            write_address(&mut w, address, "cac:Address")?;
            w.end_element("cac:DeliveryLocation")?;
        }
        w.end_element("cac:Delivery")?;
    }

    // BG-16: Payment means, payee account from the supplier (BT-84)
    if let Some(means) = &doc.payment_means {
        w.start_element("cac:PaymentMeans")?;
        w.text_element("cbc:PaymentMeansCode", &means.code().to_string())?;
        if credit_note {
            if let Some(due) = &doc.due_date {
                w.text_element("cbc:PaymentDueDate", &due.to_string())?;
            }
        }
        if let Some(iban) = &doc.supplier.bank_account {
            w.start_element("cac:PayeeFinancialAccount")?;
            w.text_element("cbc:ID", &compact(iban))?;
            w.end_element("cac:PayeeFinancialAccount")?;
        }
        w.end_element("cac:PaymentMeans")?;
    }

    // BT-20: Payment terms
    if let Some(terms) = &doc.payment_terms {
        w.start_element("cac:PaymentTerms")?;
        w.text_element("cbc:Note", terms)?;
        w.end_element("cac:PaymentTerms")?;
    }

    // BG-23: Tax total
    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", vat * sign, currency)?;
    for group in breakdown {
        w.start_element("cac:TaxSubtotal")?;
        w.amount_element("cbc:TaxableAmount", group.taxable_amount * sign, currency)?;
        w.amount_element("cbc:TaxAmount", group.tax_amount * sign, currency)?;
        write_tax_category(
            &mut w,
            "cac:TaxCategory",
            group.category,
            group.rate,
            group.exemption.as_ref(),
        )?;
        w.end_element("cac:TaxSubtotal")?;
    }
    w.end_element("cac:TaxTotal")?;

    // BG-22: Legal monetary total
    let line_total: Decimal = doc.lines.iter().map(InvoiceLine::net_amount).sum();
    w.start_element("cac:LegalMonetaryTotal")?;
    w.amount_element("cbc:LineExtensionAmount", line_total * sign, currency)?;
    w.amount_element("cbc:TaxExclusiveAmount", net * sign, currency)?;
    w.amount_element("cbc:TaxInclusiveAmount", gross * sign, currency)?;
    if let Some(prepaid) = doc.totals.prepaid {
        w.amount_element("cbc:PrepaidAmount", prepaid * sign, currency)?;
    }
    if let Some(rounding) = doc.totals.rounding {
        w.amount_element("cbc:PayableRoundingAmount", rounding * sign, currency)?;
    }
    w.amount_element("cbc:PayableAmount", doc.totals.amount_due() * sign, currency)?;
    w.end_element("cac:LegalMonetaryTotal")?;

    // BG-25: Lines, numbered from 1 unless an explicit id is set
    for (i, line) in doc.lines.iter().enumerate() {
        let id = line.id.clone().unwrap_or_else(|| (i + 1).to_string());
        write_line(&mut w, line, &id, currency, sign)?;
    }

    w.end_element(root_tag)?;

    w.into_string()
}

fn write_party(w: &mut XmlWriter, party: &Party, wrapper: &str) -> Result<(), EfacturaError> {
    w.start_element(wrapper)?;
    w.start_element("cac:Party")?;

    // BT-28/45: Trade name
    if let Some(trade_name) = &party.trade_name {
        w.start_element("cac:PartyName")?;
        w.text_element("cbc:Name", trade_name)?;
        w.end_element("cac:PartyName")?;
    }

    // BG-5/8: Postal address
    if let Some(address) = &party.address {
        write_address(w, address, "cac:PostalAddress")?;
    }

    // BT-31/48: VAT identifier, only for VAT-registered parties
    let tax_id = party.tax_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    if let Some(id) = tax_id.filter(|_| party.is_vat_registered()) {
        w.start_element("cac:PartyTaxScheme")?;
        w.text_element("cbc:CompanyID", &id.to_ascii_uppercase())?;
        w.start_element("cac:TaxScheme")?;
        w.text_element("cbc:ID", "VAT")?;
        w.end_element("cac:TaxScheme")?;
        w.end_element("cac:PartyTaxScheme")?;
    }

    // BT-27/44 and BT-30/47: Legal entity. The trade register number is the
    // legal registration id; without one the bare CUI stands in.
    w.start_element("cac:PartyLegalEntity")?;
    w.text_element("cbc:RegistrationName", &party.name)?;
    let legal_id = party
        .registration_number
        .clone()
        .or_else(|| tax_id.and_then(normalize_tax_id));
    if let Some(id) = legal_id {
        w.text_element("cbc:CompanyID", &id)?;
    }
    w.end_element("cac:PartyLegalEntity")?;

    // BG-6/9: Contact
    if let Some(contact) = &party.contact {
        w.start_element("cac:Contact")?;
        if let Some(name) = &contact.name {
            w.text_element("cbc:Name", name)?;
        }
        if let Some(phone) = &contact.phone {
            w.text_element("cbc:Telephone", phone)?;
        }
        if let Some(email) = &contact.email {
            w.text_element("cbc:ElectronicMail", email)?;
        }
        w.end_element("cac:Contact")?;
    }

    w.end_element("cac:Party")?;
    w.end_element(wrapper)?;
    Ok(())
}

fn write_address(w: &mut XmlWriter, address: &Address, tag: &str) -> Result<(), EfacturaError> {
    let country = address.country_code.trim().to_ascii_uppercase();
    w.start_element(tag)?;
    if let Some(street) = &address.street {
        w.text_element("cbc:StreetName", street)?;
    }
    w.text_element("cbc:CityName", &address.city)?;
    if let Some(postal) = &address.postal_code {
        w.text_element("cbc:PostalZone", postal)?;
    }
    // BT-39/54: Romanian subdivisions go out as ISO 3166-2:RO codes.
    if let Some(county) = &address.county {
        let subdivision = if country == DEFAULT_COUNTRY {
            county_code(county).unwrap_or_else(|| county.clone())
        } else {
            county.clone()
        };
        w.text_element("cbc:CountrySubentity", &subdivision)?;
    }
    w.start_element("cac:Country")?;
    w.text_element("cbc:IdentificationCode", &country)?;
    w.end_element("cac:Country")?;
    w.end_element(tag)?;
    Ok(())
}

fn write_tax_category(
    w: &mut XmlWriter,
    tag: &str,
    category: VatCategory,
    rate: Decimal,
    exemption: Option<&ExemptionCitation>,
) -> Result<(), EfacturaError> {
    w.start_element(tag)?;
    w.text_element("cbc:ID", category.code())?;
    w.text_element("cbc:Percent", &format_rate(rate))?;
    if let Some(citation) = exemption {
        w.text_element("cbc:TaxExemptionReasonCode", &citation.code)?;
        w.text_element("cbc:TaxExemptionReason", &citation.text)?;
    }
    w.start_element("cac:TaxScheme")?;
    w.text_element("cbc:ID", "VAT")?;
    w.end_element("cac:TaxScheme")?;
    w.end_element(tag)?;
    Ok(())
}

fn write_line(
    w: &mut XmlWriter,
    line: &InvoiceLine,
    id: &str,
    currency: &str,
    sign: Decimal,
) -> Result<(), EfacturaError> {
    let (line_tag, qty_tag) = if sign.is_sign_negative() {
        ("cac:CreditNoteLine", "cbc:CreditedQuantity")
    } else {
        ("cac:InvoiceLine", "cbc:InvoicedQuantity")
    };

    w.start_element(line_tag)?;
    // BT-126: Line ID
    w.text_element("cbc:ID", id)?;
    // BT-129/130: Quantity with unit
    w.quantity_element(
        qty_tag,
        line.quantity.unwrap_or(Decimal::ZERO) * sign,
        &line.unit_code,
    )?;
    // BT-131: Line net amount
    w.amount_element("cbc:LineExtensionAmount", line.net_amount() * sign, currency)?;

    // BG-27: Line allowances
    for allowance in &line.allowances {
        w.start_element("cac:AllowanceCharge")?;
        w.text_element("cbc:ChargeIndicator", "false")?;
        if let Some(reason) = &allowance.reason {
            w.text_element("cbc:AllowanceChargeReason", reason)?;
        }
        w.amount_element("cbc:Amount", allowance.amount, currency)?;
        w.end_element("cac:AllowanceCharge")?;
    }

    // BG-31: Item
    w.start_element("cac:Item")?;
    w.text_element("cbc:Name", &line.description)?;
    write_tax_category(
        w,
        "cac:ClassifiedTaxCategory",
        line.vat_category,
        line.vat_rate.unwrap_or(Decimal::ZERO),
        None,
    )?;
    w.end_element("cac:Item")?;

    // BG-29: Price
    w.start_element("cac:Price")?;
    w.price_element(
        "cbc:PriceAmount",
        line.unit_price.unwrap_or(Decimal::ZERO),
        currency,
    )?;
    w.end_element("cac:Price")?;

    w.end_element(line_tag)?;
    Ok(())
}

fn compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn doc() -> InvoiceDocument {
        let lines = vec![InvoiceLine {
            id: None,
            description: "Servicii IT".into(),
            quantity: Some(dec!(2)),
            unit_code: "HUR".into(),
            unit_price: Some(dec!(150)),
            vat_rate: Some(dec!(21)),
            vat_category: VatCategory::Standard,
            line_total: None,
            allowances: Vec::new(),
        }];
        let totals = totals_from(&aggregate(&lines));
        InvoiceDocument {
            number: "FCT-1".into(),
            issue_date: "2025-09-01".into(),
            due_date: None,
            type_code: DocumentType::Standard,
            currency_code: "RON".into(),
            notes: Vec::new(),
            billing_reference: None,
            supplier: Party {
                name: "Alfa SRL".into(),
                tax_id: Some("ro30834857".into()),
                address: Some(Address {
                    street: Some("Str. Lunga 1".into()),
                    city: "Cluj-Napoca".into(),
                    county: Some("Cluj".into()),
                    postal_code: None,
                    country_code: "RO".into(),
                }),
                ..Party::default()
            },
            customer: Party {
                name: "Beta SRL".into(),
                tax_id: Some("18590117".into()),
                ..Party::default()
            },
            lines,
            totals,
            delivery: None,
            payment_terms: None,
            payment_means: None,
        }
    }

    #[test]
    fn supplier_vat_scheme_and_county_code() {
        let d = doc();
        let xml = to_ubl_xml(&d, &aggregate(&d.lines)).unwrap();
        assert!(xml.contains("<cbc:CompanyID>RO30834857</cbc:CompanyID>"));
        assert!(xml.contains("<cbc:CountrySubentity>RO-CJ</cbc:CountrySubentity>"));
        // Customer is not VAT registered: legal entity id only.
        assert!(xml.contains("<cbc:CompanyID>18590117</cbc:CompanyID>"));
        assert_eq!(xml.matches("<cac:PartyTaxScheme>").count(), 1);
    }

    #[test]
    fn missing_totals_is_an_error() {
        let mut d = doc();
        d.totals.vat = None;
        assert!(matches!(
            to_ubl_xml(&d, &aggregate(&d.lines)),
            Err(EfacturaError::Xml(_))
        ));
    }

    #[test]
    fn credit_note_uses_credit_note_tags() {
        let d = generate_credit_note(&doc(), "CN-1", "Storno", None).unwrap();
        let xml = to_ubl_xml(&d, &aggregate(&d.lines)).unwrap();
        assert!(xml.contains("<ubl:CreditNote"));
        assert!(xml.contains("<cbc:CreditNoteTypeCode>381</cbc:CreditNoteTypeCode>"));
        assert!(xml.contains("<cac:CreditNoteLine>"));
        assert!(xml.contains(r#"<cbc:CreditedQuantity unitCode="HUR">2.00</cbc:CreditedQuantity>"#));
        assert!(xml.contains(r#"<cbc:LineExtensionAmount currencyID="RON">300.00</cbc:LineExtensionAmount>"#));
        assert!(!xml.contains("InvoiceLine"));
    }
}
