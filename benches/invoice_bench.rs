use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;

use efactura::core::*;
use efactura::ubl;

fn issue_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

fn supplier() -> Party {
    PartyBuilder::new("Alfa Soft SRL", "RO30834857")
        .address(
            AddressBuilder::new("Cluj-Napoca")
                .street("Str. Memorandumului 28")
                .county("Cluj")
                .build(),
        )
        .bank_account("RO49AAAA1B31007593840000")
        .build()
}

fn customer() -> Party {
    PartyBuilder::new("Beta Trade SRL", "18590117")
        .address(
            AddressBuilder::new("SECTOR1")
                .street("Calea Victoriei 10")
                .county("București")
                .build(),
        )
        .build()
}

fn build_invoice(lines: usize) -> InvoiceDocument {
    let mut builder = InvoiceBuilder::new(format!("BENCH-{lines}"), issue_date())
        .supplier(supplier())
        .customer(customer())
        .payment_means(PaymentMeans::CreditTransfer);

    for i in 1..=lines {
        let rate = if i % 3 == 0 { dec!(11) } else { dec!(21) };
        builder = builder.add_line(
            LineBuilder::new(format!("Articol {i}"), dec!(2), dec!(9.99))
                .vat(VatCategory::Standard, rate)
                .build(),
        );
    }

    builder.build().unwrap()
}

fn bench_build_invoice(c: &mut Criterion) {
    c.bench_function("build_invoice_10_lines", |b| {
        b.iter(|| black_box(build_invoice(10)));
    });
}

fn bench_validate(c: &mut Criterion) {
    let invoice = build_invoice(10);
    c.bench_function("validate_10_lines", |b| {
        b.iter(|| black_box(validate(black_box(&invoice))));
    });
}

fn bench_validate_1000_lines(c: &mut Criterion) {
    let invoice = build_invoice(1000);
    c.bench_function("validate_1000_lines", |b| {
        b.iter(|| black_box(validate(black_box(&invoice))));
    });
}

fn bench_aggregate_1000_lines(c: &mut Criterion) {
    let invoice = build_invoice(1000);
    c.bench_function("aggregate_1000_lines", |b| {
        b.iter(|| black_box(aggregate(black_box(&invoice.lines))));
    });
}

fn bench_ubl_serialize(c: &mut Criterion) {
    let invoice = build_invoice(10);
    let breakdown = aggregate(&invoice.lines);
    c.bench_function("ubl_serialize", |b| {
        b.iter(|| black_box(ubl::to_ubl_xml(black_box(&invoice), black_box(&breakdown))));
    });
}

fn bench_ubl_serialize_1000_lines(c: &mut Criterion) {
    let invoice = build_invoice(1000);
    let breakdown = aggregate(&invoice.lines);
    c.bench_function("ubl_serialize_1000_lines", |b| {
        b.iter(|| black_box(ubl::to_ubl_xml(black_box(&invoice), black_box(&breakdown))));
    });
}

fn bench_credit_note(c: &mut Criterion) {
    let invoice = build_invoice(100);
    c.bench_function("credit_note_100_lines", |b| {
        b.iter(|| {
            black_box(generate_credit_note(
                black_box(&invoice),
                "CN-BENCH",
                "Storno",
                None,
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_build_invoice,
    bench_validate,
    bench_validate_1000_lines,
    bench_aggregate_1000_lines,
    bench_ubl_serialize,
    bench_ubl_serialize_1000_lines,
    bench_credit_note,
);
criterion_main!(benches);
