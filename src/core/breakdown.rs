use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::rates::VatRateTable;
use super::types::*;
use super::validation::TOTALS_TOLERANCE;

/// Group lines by (rate, category) into the VAT breakdown, using the default
/// rate table's citations.
pub fn aggregate(lines: &[InvoiceLine]) -> Vec<VatGroup> {
    aggregate_with(lines, &VatRateTable::default())
}

/// Group lines by (rate, category), preserving first-seen order.
///
/// The taxable base of a group is the sum of its line totals; the tax amount
/// is `base * rate / 100`, rounded half away from zero to two decimals once
/// per group. Lines without a rate are grouped at 0 %.
pub fn aggregate_with(lines: &[InvoiceLine], rates: &VatRateTable) -> Vec<VatGroup> {
    let mut groups: Vec<VatGroup> = Vec::new();

    for line in lines {
        let rate = line.vat_rate.unwrap_or(Decimal::ZERO);
        let base = line.net_amount();
        match groups
            .iter_mut()
            .find(|g| g.rate == rate && g.category == line.vat_category)
        {
            Some(group) => group.taxable_amount += base,
            None => groups.push(VatGroup {
                category: line.vat_category,
                rate,
                taxable_amount: base,
                tax_amount: Decimal::ZERO,
                exemption: match line.vat_category {
                    VatCategory::Standard => None,
                    other => rates.citation_for(other),
                },
            }),
        }
    }

    for group in &mut groups {
        group.tax_amount = round_money(group.taxable_amount * group.rate / dec!(100));
    }

    groups
}

/// Totals derived from a breakdown: net = Σ bases, VAT = Σ taxes,
/// gross = net + VAT.
pub fn totals_from(groups: &[VatGroup]) -> DocumentTotals {
    let net: Decimal = groups.iter().map(|g| g.taxable_amount).sum();
    let vat: Decimal = groups.iter().map(|g| g.tax_amount).sum();
    DocumentTotals {
        net: Some(round_money(net)),
        vat: Some(vat),
        gross: Some(round_money(net) + vat),
        prepaid: None,
        rounding: None,
    }
}

/// Cross-check a breakdown against the document's declared totals.
///
/// Returns one error per declared total that differs from the breakdown sum
/// by more than the 0.01 tolerance. Missing declared totals are the
/// validator's concern and are skipped here.
pub fn check_totals(groups: &[VatGroup], totals: &DocumentTotals) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let net: Decimal = groups.iter().map(|g| g.taxable_amount).sum();
    let vat: Decimal = groups.iter().map(|g| g.tax_amount).sum();

    if let Some(declared) = totals.net {
        if (declared - net).abs() > TOTALS_TOLERANCE {
            errors.push(ValidationError::new(
                "totals.net",
                format!("net total {declared} does not match sum of taxable amounts {net}"),
                "BR-CO-13",
            ));
        }
    }
    if let Some(declared) = totals.vat {
        if (declared - vat).abs() > TOTALS_TOLERANCE {
            errors.push(ValidationError::new(
                "totals.vat",
                format!("VAT total {declared} does not match sum of breakdown tax {vat}"),
                "BR-CO-14",
            ));
        }
    }
    errors
}

/// Round a monetary amount to two decimals, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: Decimal, price: Decimal, rate: Decimal, category: VatCategory) -> InvoiceLine {
        InvoiceLine {
            id: None,
            description: "x".into(),
            quantity: Some(qty),
            unit_code: DEFAULT_UNIT_CODE.into(),
            unit_price: Some(price),
            vat_rate: Some(rate),
            vat_category: category,
            line_total: None,
            allowances: Vec::new(),
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let lines = vec![
            line(dec!(1), dec!(250), dec!(11), VatCategory::Standard),
            line(dec!(2), dec!(500), dec!(21), VatCategory::Standard),
            line(dec!(1), dec!(50), dec!(11), VatCategory::Standard),
        ];
        let groups = aggregate(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rate, dec!(11));
        assert_eq!(groups[0].taxable_amount, dec!(300));
        assert_eq!(groups[0].tax_amount, dec!(33.00));
        assert_eq!(groups[1].rate, dec!(21));
        assert_eq!(groups[1].tax_amount, dec!(210.00));
    }

    #[test]
    fn same_rate_different_category_split() {
        let lines = vec![
            line(dec!(1), dec!(100), dec!(0), VatCategory::Export),
            line(dec!(1), dec!(100), dec!(0), VatCategory::IntraCommunity),
        ];
        let groups = aggregate(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].exemption.as_ref().unwrap().code, "VATEX-EU-G");
        assert_eq!(groups[1].exemption.as_ref().unwrap().code, "VATEX-EU-IC");
    }

    #[test]
    fn tax_rounded_per_group() {
        // 3 × 33.33 = 99.99 at 19 % = 18.9981 → 19.00
        let groups = aggregate(&[line(dec!(3), dec!(33.33), dec!(19), VatCategory::Standard)]);
        assert_eq!(groups[0].tax_amount, dec!(19.00));
    }

    #[test]
    fn allowances_reduce_base() {
        let mut l = line(dec!(2), dec!(100), dec!(21), VatCategory::Standard);
        l.allowances.push(LineAllowance {
            amount: dec!(20),
            reason: Some("Discount".into()),
        });
        let groups = aggregate(&[l]);
        assert_eq!(groups[0].taxable_amount, dec!(180));
        assert_eq!(groups[0].tax_amount, dec!(37.80));
    }

    #[test]
    fn check_totals_flags_mismatch() {
        let groups = aggregate(&[line(dec!(1), dec!(100), dec!(21), VatCategory::Standard)]);
        let mut totals = totals_from(&groups);
        assert!(check_totals(&groups, &totals).is_empty());
        totals.vat = Some(dec!(20));
        let errors = check_totals(&groups, &totals);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "totals.vat");
    }
}
