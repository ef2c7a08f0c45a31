//! Sign-reversed correction documents.
//!
//! A credit note copies the parties, currency and payment data of the
//! original, points back at it through the billing reference, and negates
//! the quantity and net amount of the credited lines. Totals are recomputed
//! from the resulting lines, never by negating the original totals, so a
//! partial credit note carries the correct amounts.

use super::breakdown::{aggregate_with, totals_from};
use super::error::EfacturaError;
use super::rates::VatRateTable;
use super::types::*;

const NUMBER_MIN_LEN: usize = 2;
const NUMBER_MAX_LEN: usize = 50;

/// Derive a credit note from `original`.
///
/// `line_subset` holds 0-based line indices. With `None` every line is
/// reversed; with `Some(indices)` only those lines are reversed and the rest
/// are copied unchanged. The new document starts with the original's issue
/// date; callers set the actual credit note date before submitting.
///
/// ```
/// use efactura::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let invoice = InvoiceBuilder::new("FCT-100", NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
///     .supplier(PartyBuilder::new("Alfa Soft SRL", "RO30834857")
///         .address(AddressBuilder::new("Cluj-Napoca").county("CJ").build()).build())
///     .customer(PartyBuilder::new("Beta Trade SRL", "18590117")
///         .address(AddressBuilder::new("Iași").county("IS").build()).build())
///     .add_line(LineBuilder::new("Abonament", dec!(2), dec!(50)).build())
///     .build()
///     .unwrap();
///
/// let credit = generate_credit_note(&invoice, "CN-100", "Retur", None).unwrap();
/// assert_eq!(credit.type_code, DocumentType::CreditNote);
/// assert_eq!(credit.totals.gross, Some(dec!(-121.00)));
/// ```
pub fn generate_credit_note(
    original: &InvoiceDocument,
    new_number: &str,
    reason: &str,
    line_subset: Option<&[usize]>,
) -> Result<InvoiceDocument, EfacturaError> {
    generate_credit_note_with(original, new_number, reason, line_subset, &VatRateTable::default())
}

/// Same as [`generate_credit_note`], with an explicit rate table for the
/// exemption citations of the recomputed breakdown.
pub fn generate_credit_note_with(
    original: &InvoiceDocument,
    new_number: &str,
    reason: &str,
    line_subset: Option<&[usize]>,
    rates: &VatRateTable,
) -> Result<InvoiceDocument, EfacturaError> {
    if original.is_credit_note() {
        return Err(EfacturaError::CreditNote(format!(
            "document {} is already a credit note",
            original.number
        )));
    }

    let number = new_number.trim();
    let len = number.chars().count();
    if !(NUMBER_MIN_LEN..=NUMBER_MAX_LEN).contains(&len) {
        return Err(EfacturaError::CreditNote(format!(
            "credit note number must be {NUMBER_MIN_LEN}-{NUMBER_MAX_LEN} characters, got {len}"
        )));
    }

    if let Some(indices) = line_subset {
        if indices.is_empty() {
            return Err(EfacturaError::CreditNote(
                "line subset must name at least one line".into(),
            ));
        }
        if let Some(bad) = indices.iter().find(|&&i| i >= original.lines.len()) {
            return Err(EfacturaError::CreditNote(format!(
                "line index {bad} out of range, document has {} lines",
                original.lines.len()
            )));
        }
    }

    let lines: Vec<InvoiceLine> = original
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let credited = line_subset.is_none_or(|indices| indices.contains(&i));
            if credited {
                reverse_line(line)
            } else {
                line.clone()
            }
        })
        .collect();

    let groups = aggregate_with(&lines, rates);
    let totals = totals_from(&groups);

    let mut notes = Vec::new();
    if !reason.trim().is_empty() {
        notes.push(reason.trim().to_string());
    }

    Ok(InvoiceDocument {
        number: number.to_string(),
        issue_date: original.issue_date.clone(),
        due_date: None,
        type_code: DocumentType::CreditNote,
        currency_code: original.currency_code.clone(),
        notes,
        billing_reference: Some(DocumentReference {
            number: original.number.clone(),
            issue_date: original.parsed_issue_date(),
        }),
        supplier: original.supplier.clone(),
        customer: original.customer.clone(),
        lines,
        totals,
        delivery: None,
        payment_terms: original.payment_terms.clone(),
        payment_means: original.payment_means,
    })
}

// The net amount is pinned explicitly: negating the quantity alone would
// also flip the sign of the allowance deduction.
fn reverse_line(line: &InvoiceLine) -> InvoiceLine {
    let net = line.net_amount();
    InvoiceLine {
        quantity: line.quantity.map(|q| -q),
        line_total: Some(-net),
        ..line.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn line(description: &str, qty: Decimal, price: Decimal, rate: Decimal) -> InvoiceLine {
        InvoiceLine {
            id: None,
            description: description.into(),
            quantity: Some(qty),
            unit_code: DEFAULT_UNIT_CODE.into(),
            unit_price: Some(price),
            vat_rate: Some(rate),
            vat_category: VatCategory::Standard,
            line_total: None,
            allowances: Vec::new(),
        }
    }

    fn original() -> InvoiceDocument {
        let lines = vec![
            line("Consultanță", dec!(10), dec!(100), dec!(21)),
            line("Carte", dec!(1), dec!(250), dec!(11)),
        ];
        let totals = totals_from(&aggregate_with(&lines, &VatRateTable::default()));
        InvoiceDocument {
            number: "FCT-7".into(),
            issue_date: "2025-09-01".into(),
            due_date: None,
            type_code: DocumentType::Standard,
            currency_code: "RON".into(),
            notes: vec!["Original".into()],
            billing_reference: None,
            supplier: Party {
                name: "Alfa".into(),
                tax_id: Some("RO30834857".into()),
                ..Party::default()
            },
            customer: Party {
                name: "Beta".into(),
                tax_id: Some("18590117".into()),
                ..Party::default()
            },
            lines,
            totals,
            delivery: None,
            payment_terms: None,
            payment_means: Some(PaymentMeans::CreditTransfer),
        }
    }

    #[test]
    fn full_reversal() {
        let cn = generate_credit_note(&original(), "CN-7", "Anulare", None).unwrap();
        assert_eq!(cn.type_code, DocumentType::CreditNote);
        assert_eq!(cn.notes, vec!["Anulare".to_string()]);
        assert_eq!(cn.billing_reference.as_ref().unwrap().number, "FCT-7");
        assert_eq!(cn.lines[0].quantity, Some(dec!(-10)));
        assert_eq!(cn.totals.net, Some(dec!(-1250.00)));
        assert_eq!(cn.totals.vat, Some(dec!(-237.50)));
        assert_eq!(cn.totals.gross, Some(dec!(-1487.50)));
        assert_eq!(cn.payment_means, Some(PaymentMeans::CreditTransfer));
    }

    #[test]
    fn partial_reversal_keeps_other_lines() {
        let cn = generate_credit_note(&original(), "CN-8", "Retur carte", Some(&[1])).unwrap();
        assert_eq!(cn.lines[0].quantity, Some(dec!(10)));
        assert_eq!(cn.lines[1].quantity, Some(dec!(-1)));
        assert_eq!(cn.lines[1].line_total, Some(dec!(-250)));
        assert_eq!(cn.totals.net, Some(dec!(750.00)));
    }

    #[test]
    fn allowance_stays_a_deduction() {
        let mut doc = original();
        doc.lines[0].allowances.push(LineAllowance {
            amount: dec!(100),
            reason: None,
        });
        let cn = generate_credit_note(&doc, "CN-9", "", Some(&[0])).unwrap();
        assert_eq!(cn.lines[0].net_amount(), dec!(-900));
        assert!(cn.notes.is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        let doc = original();
        assert!(matches!(
            generate_credit_note(&doc, "X", "r", None),
            Err(EfacturaError::CreditNote(_))
        ));
        assert!(matches!(
            generate_credit_note(&doc, "CN-1", "r", Some(&[2])),
            Err(EfacturaError::CreditNote(_))
        ));
        assert!(matches!(
            generate_credit_note(&doc, "CN-1", "r", Some(&[])),
            Err(EfacturaError::CreditNote(_))
        ));
        let cn = generate_credit_note(&doc, "CN-1", "r", None).unwrap();
        assert!(matches!(
            generate_credit_note(&cn, "CN-2", "r", None),
            Err(EfacturaError::CreditNote(_))
        ));
    }
}
