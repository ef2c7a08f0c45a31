#![cfg(feature = "ubl")]

use chrono::NaiveDate;
use efactura::core::*;
use efactura::ubl::{self, CIUS_RO_CUSTOMIZATION_ID, format_amount, format_rate};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn supplier() -> Party {
    PartyBuilder::new("Alfa Soft SRL", "RO30834857")
        .address(
            AddressBuilder::new("Cluj-Napoca")
                .street("Str. Memorandumului 28")
                .county("Cluj")
                .postal_code("400114")
                .build(),
        )
        .registration_number("J12/3456/2012")
        .bank_account("RO49 AAAA 1B31 0075 9384 0000")
        .build()
}

fn customer() -> Party {
    PartyBuilder::new("Beta Trade SRL", "18590117")
        .address(
            AddressBuilder::new("SECTOR3")
                .street("Bd. Unirii 15")
                .county("București")
                .build(),
        )
        .build()
}

fn invoice() -> InvoiceDocument {
    InvoiceBuilder::new("FCT-2025-0042", date(2025, 9, 1))
        .due_date(date(2025, 10, 1))
        .note("Factură emisă conform contractului nr. 12")
        .supplier(supplier())
        .customer(customer())
        .add_line(
            LineBuilder::new("Consultanță IT", dec!(10), dec!(100))
                .unit("HUR")
                .build(),
        )
        .add_line(
            LineBuilder::new("Manual tehnic", dec!(1), dec!(250))
                .vat(VatCategory::Standard, dec!(11))
                .build(),
        )
        .payment_means(PaymentMeans::CreditTransfer)
        .payment_terms("30 de zile")
        .build()
        .unwrap()
}

fn render(doc: &InvoiceDocument) -> String {
    ubl::to_ubl_xml(doc, &aggregate(&doc.lines)).unwrap()
}

#[test]
fn header_and_root() {
    let xml = render(&invoice());
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains(r#"<ubl:Invoice xmlns:ubl="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2""#));
    assert!(xml.contains(&format!(
        "<cbc:CustomizationID>{CIUS_RO_CUSTOMIZATION_ID}</cbc:CustomizationID>"
    )));
    assert!(xml.contains("<cbc:ID>FCT-2025-0042</cbc:ID>"));
    assert!(xml.contains("<cbc:IssueDate>2025-09-01</cbc:IssueDate>"));
    assert!(xml.contains("<cbc:DueDate>2025-10-01</cbc:DueDate>"));
    assert!(xml.contains("<cbc:InvoiceTypeCode>380</cbc:InvoiceTypeCode>"));
    assert!(xml.contains("<cbc:DocumentCurrencyCode>RON</cbc:DocumentCurrencyCode>"));
}

#[test]
fn output_is_deterministic() {
    let inv = invoice();
    assert_eq!(render(&inv), render(&inv));
}

#[test]
fn tax_total_per_rate() {
    let xml = render(&invoice());
    assert!(xml.contains(r#"<cbc:TaxAmount currencyID="RON">237.50</cbc:TaxAmount>"#));
    assert_eq!(xml.matches("<cac:TaxSubtotal>").count(), 2);
    assert!(xml.contains(r#"<cbc:TaxableAmount currencyID="RON">1000.00</cbc:TaxableAmount>"#));
    assert!(xml.contains(r#"<cbc:TaxAmount currencyID="RON">210.00</cbc:TaxAmount>"#));
    assert!(xml.contains(r#"<cbc:TaxableAmount currencyID="RON">250.00</cbc:TaxableAmount>"#));
    assert!(xml.contains(r#"<cbc:TaxAmount currencyID="RON">27.50</cbc:TaxAmount>"#));
    assert!(xml.contains("<cbc:Percent>21</cbc:Percent>"));
    assert!(xml.contains("<cbc:Percent>11</cbc:Percent>"));
}

#[test]
fn monetary_total() {
    let xml = render(&invoice());
    assert!(xml.contains(r#"<cbc:LineExtensionAmount currencyID="RON">1250.00</cbc:LineExtensionAmount>"#));
    assert!(xml.contains(r#"<cbc:TaxExclusiveAmount currencyID="RON">1250.00</cbc:TaxExclusiveAmount>"#));
    assert!(xml.contains(r#"<cbc:TaxInclusiveAmount currencyID="RON">1487.50</cbc:TaxInclusiveAmount>"#));
    assert!(xml.contains(r#"<cbc:PayableAmount currencyID="RON">1487.50</cbc:PayableAmount>"#));
}

#[test]
fn lines_numbered_from_one() {
    let xml = render(&invoice());
    assert_eq!(xml.matches("<cac:InvoiceLine>").count(), 2);
    assert!(xml.contains("<cbc:ID>1</cbc:ID>"));
    assert!(xml.contains("<cbc:ID>2</cbc:ID>"));
    assert!(xml.contains(r#"<cbc:InvoicedQuantity unitCode="HUR">10.00</cbc:InvoicedQuantity>"#));
    assert!(xml.contains(r#"<cbc:InvoicedQuantity unitCode="H87">1.00</cbc:InvoicedQuantity>"#));
    assert!(xml.contains(r#"<cbc:PriceAmount currencyID="RON">100.00</cbc:PriceAmount>"#));
}

#[test]
fn parties_and_payment() {
    let xml = render(&invoice());
    assert!(xml.contains("<cbc:CountrySubentity>RO-CJ</cbc:CountrySubentity>"));
    assert!(xml.contains("<cbc:CountrySubentity>RO-B</cbc:CountrySubentity>"));
    assert!(xml.contains("<cbc:CityName>SECTOR3</cbc:CityName>"));
    assert!(xml.contains("<cbc:CompanyID>RO30834857</cbc:CompanyID>"));
    assert!(xml.contains("<cbc:CompanyID>J12/3456/2012</cbc:CompanyID>"));
    assert!(xml.contains("<cbc:CompanyID>18590117</cbc:CompanyID>"));
    assert!(xml.contains("<cbc:PaymentMeansCode>30</cbc:PaymentMeansCode>"));
    assert!(xml.contains("<cbc:ID>RO49AAAA1B31007593840000</cbc:ID>"));
    assert!(xml.contains("<cbc:Note>30 de zile</cbc:Note>"));
}

#[test]
fn special_characters_escaped() {
    let mut inv = invoice();
    inv.supplier.name = r#"Alfa & Fiii "Soft" <SRL> d'Or"#.into();
    inv.lines[0].description = "Cablu <5m> & mufă".into();
    let xml = render(&inv);

    assert!(xml.contains("Alfa &amp; Fiii &quot;Soft&quot; &lt;SRL&gt; d&apos;Or"));
    assert!(xml.contains("Cablu &lt;5m&gt; &amp; mufă"));
    assert!(!xml.contains("<SRL>"));
}

#[test]
fn diacritics_survive() {
    let xml = render(&invoice());
    assert!(xml.contains("Consultanță IT"));
    assert!(xml.contains("Factură emisă conform contractului nr. 12"));
}

#[test]
fn exempt_group_carries_citation() {
    let mut inv = invoice();
    inv.lines[1].vat_category = VatCategory::ReverseCharge;
    inv.lines[1].vat_rate = Some(dec!(0));
    let groups = aggregate(&inv.lines);
    inv.totals = totals_from(&groups);
    let xml = ubl::to_ubl_xml(&inv, &groups).unwrap();

    assert!(xml.contains("<cbc:ID>AE</cbc:ID>"));
    assert!(xml.contains("<cbc:Percent>0</cbc:Percent>"));
    assert!(xml.contains("<cbc:TaxExemptionReasonCode>VATEX-EU-AE</cbc:TaxExemptionReasonCode>"));
    assert!(xml.contains("Taxare inversă"));
}

#[test]
fn credit_note_document() {
    let inv = invoice();
    let cn = generate_credit_note(&inv, "CN-2025-0001", "Retur integral", None).unwrap();
    let xml = render(&cn);

    assert!(xml.contains("<ubl:CreditNote"));
    assert!(xml.contains(ubl::ubl_ns::CREDIT_NOTE));
    assert!(xml.contains("<cbc:CreditNoteTypeCode>381</cbc:CreditNoteTypeCode>"));
    assert!(xml.contains("<cac:BillingReference>"));
    assert!(xml.contains("<cbc:ID>FCT-2025-0042</cbc:ID>"));
    assert_eq!(xml.matches("<cac:CreditNoteLine>").count(), 2);
    assert!(!xml.contains("<cbc:DueDate>"));

    // The CreditNote root carries the reversal; amounts read positive.
    assert!(xml.contains(r#"<cbc:CreditedQuantity unitCode="HUR">10.00</cbc:CreditedQuantity>"#));
    assert!(xml.contains(r#"<cbc:LineExtensionAmount currencyID="RON">1000.00</cbc:LineExtensionAmount>"#));
    assert!(xml.contains(r#"<cbc:TaxAmount currencyID="RON">237.50</cbc:TaxAmount>"#));
    assert!(xml.contains(r#"<cbc:PayableAmount currencyID="RON">1487.50</cbc:PayableAmount>"#));
    assert!(!xml.contains(">-"));
}

#[test]
fn partial_credit_note_signs() {
    let inv = invoice();
    let cn = generate_credit_note(&inv, "CN-2025-0002", "Retur manual", Some(&[1])).unwrap();
    let xml = render(&cn);

    // Credited line positive, the copied line reversed by the root.
    assert!(xml.contains(r#"<cbc:CreditedQuantity unitCode="H87">1.00</cbc:CreditedQuantity>"#));
    assert!(xml.contains(r#"<cbc:CreditedQuantity unitCode="HUR">-10.00</cbc:CreditedQuantity>"#));
    assert!(xml.contains(r#"<cbc:TaxExclusiveAmount currencyID="RON">-750.00</cbc:TaxExclusiveAmount>"#));
}

#[test]
fn optional_blocks_omitted_when_absent() {
    let inv = InvoiceBuilder::new("FCT-2025-0043", date(2025, 9, 1))
        .supplier(supplier())
        .customer(customer())
        .add_line(LineBuilder::new("Consultanță IT", dec!(1), dec!(100)).build())
        .build()
        .unwrap();
    let xml = render(&inv);

    for tag in [
        "cac:Delivery",
        "cac:PaymentMeans",
        "cac:PaymentTerms",
        "cac:AllowanceCharge",
        "cac:BillingReference",
        "cbc:DueDate",
        "cbc:Note",
        "cbc:PrepaidAmount",
    ] {
        assert!(!xml.contains(tag), "unexpected {tag}");
    }
    assert!(xml.contains(r#"<cbc:PayableAmount currencyID="RON">121.00</cbc:PayableAmount>"#));
}

#[test]
fn delivery_and_allowances_emitted() {
    let inv = InvoiceBuilder::new("FCT-2025-0044", date(2025, 9, 1))
        .supplier(supplier())
        .customer(customer())
        .delivery(
            Some(date(2025, 8, 30)),
            Some(
                AddressBuilder::new("Brașov")
                    .street("Str. Depozitului 3")
                    .county("BV")
                    .build(),
            ),
        )
        .add_line(
            LineBuilder::new("Consultanță IT", dec!(10), dec!(100))
                .allowance(dec!(50), Some("Discount fidelitate".into()))
                .build(),
        )
        .build()
        .unwrap();
    let xml = render(&inv);

    assert!(xml.contains("<cac:Delivery>"));
    assert!(xml.contains("<cbc:ActualDeliveryDate>2025-08-30</cbc:ActualDeliveryDate>"));
    assert!(xml.contains("<cac:DeliveryLocation>"));
    assert!(xml.contains("<cbc:StreetName>Str. Depozitului 3</cbc:StreetName>"));
    assert!(xml.contains("<cbc:CountrySubentity>RO-BV</cbc:CountrySubentity>"));

    assert_eq!(xml.matches("<cac:AllowanceCharge>").count(), 1);
    assert!(xml.contains("<cbc:ChargeIndicator>false</cbc:ChargeIndicator>"));
    assert!(xml.contains("<cbc:AllowanceChargeReason>Discount fidelitate</cbc:AllowanceChargeReason>"));
    assert!(xml.contains(r#"<cbc:Amount currencyID="RON">50.00</cbc:Amount>"#));
    assert!(xml.contains(r#"<cbc:LineExtensionAmount currencyID="RON">950.00</cbc:LineExtensionAmount>"#));
    assert!(xml.contains(r#"<cbc:PayableAmount currencyID="RON">1149.50</cbc:PayableAmount>"#));
}

#[test]
fn explicit_line_id_used() {
    let inv = InvoiceBuilder::new("FCT-2025-0045", date(2025, 9, 1))
        .supplier(supplier())
        .customer(customer())
        .add_line(LineBuilder::new("Consultanță IT", dec!(1), dec!(100)).id("A-10").build())
        .add_line(LineBuilder::new("Suport tehnic", dec!(1), dec!(50)).build())
        .build()
        .unwrap();
    let xml = render(&inv);

    assert!(xml.contains("<cbc:ID>A-10</cbc:ID>"));
    // Sequential numbering still counts the position.
    assert!(xml.contains("<cbc:ID>2</cbc:ID>"));
    assert!(!xml.contains("<cbc:ID>1</cbc:ID>"));
}

#[test]
fn missing_totals_rejected() {
    let mut inv = invoice();
    inv.totals.gross = None;
    assert!(matches!(
        ubl::to_ubl_xml(&inv, &aggregate(&inv.lines)),
        Err(EfacturaError::Xml(_))
    ));
}

#[test]
fn number_formatting() {
    assert_eq!(format_amount(dec!(1487.5)), "1487.50");
    assert_eq!(format_amount(dec!(0.125)), "0.13");
    assert_eq!(format_amount(dec!(-0.001)), "0.00");
    assert_eq!(format_amount(dec!(-12.345)), "-12.35");
    assert_eq!(format_rate(dec!(21.00)), "21");
    assert_eq!(format_rate(dec!(5.50)), "5.5");
    assert_eq!(format_rate(dec!(0)), "0");
}
