use chrono::NaiveDate;
use efactura::core::*;
use efactura::ubl;
use rust_decimal_macros::dec;

fn main() {
    let issue_date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();

    let invoice = InvoiceBuilder::new("FCT-2025-0042", issue_date)
        .due_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
        .supplier(
            PartyBuilder::new("Alfa Soft SRL", "RO30834857")
                .address(
                    AddressBuilder::new("Cluj-Napoca")
                        .street("Str. Memorandumului 28")
                        .county("Cluj")
                        .postal_code("400114")
                        .build(),
                )
                .registration_number("J12/3456/2012")
                .bank_account("RO49AAAA1B31007593840000")
                .build(),
        )
        .customer(
            PartyBuilder::new("Beta Trade SRL", "18590117")
                .address(
                    AddressBuilder::new("SECTOR3")
                        .street("Bd. Unirii 15")
                        .county("București")
                        .build(),
                )
                .build(),
        )
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
        .payment_terms("Plata în 30 de zile")
        .build()
        .expect("invoice should be valid");

    println!("Invoice {}", invoice.number);
    let breakdown = aggregate(&invoice.lines);
    for group in &breakdown {
        println!(
            "  {} {:>5}%  base {:>10}  VAT {:>8}",
            group.category.code(),
            group.rate,
            group.taxable_amount,
            group.tax_amount
        );
    }
    println!(
        "  net {}  VAT {}  gross {}",
        invoice.totals.net.unwrap_or_default(),
        invoice.totals.vat.unwrap_or_default(),
        invoice.totals.gross.unwrap_or_default()
    );

    // A broken copy: every finding is reported at once.
    let mut broken = invoice.clone();
    broken.number = "X".into();
    broken.issue_date = "01.09.2025".into();
    broken.customer.tax_id = Some("RO18590118".into());
    broken.lines[1].vat_rate = Some(dec!(24));
    println!("\nFindings for a broken copy:");
    for error in validate(&broken) {
        println!("  {error}");
    }

    match ubl::to_ubl_xml(&invoice, &breakdown) {
        Ok(xml) => println!("\n{xml}"),
        Err(e) => eprintln!("XML generation failed: {e}"),
    }

    // Partial credit note for the second line only.
    let credit = generate_credit_note(&invoice, "CN-2025-0007", "Retur manual", Some(&[1]))
        .expect("credit note");
    println!(
        "\nCredit note {} → {}: gross {}",
        credit.number,
        invoice.number,
        credit.totals.gross.unwrap_or_default()
    );
}
