//! Check-digit validation for Romanian tax identifiers (CUI/CIF) and bank
//! accounts (IBAN).

/// Weights applied to the first nine digits of a left-padded CUI.
const CUI_WEIGHTS: [u32; 9] = [7, 5, 3, 2, 1, 7, 5, 3, 2];

/// Length of a Romanian IBAN: `RO` + 2 check digits + 4-letter bank code +
/// 16 alphanumeric account characters.
const RO_IBAN_LEN: usize = 24;

/// Validate a Romanian tax identifier (CUI/CIF).
///
/// Accepts an optional two-letter country prefix ("RO30834857") and ignores
/// every non-digit character. The remaining digits (2 to 10 of them) are
/// left-padded to 10 and the last digit must equal the weighted check digit
/// of the first nine.
pub fn validate_tax_id(id: &str) -> bool {
    let Some(digits) = tax_id_digits(id) else {
        return false;
    };
    let padded = format!("{digits:0>10}");
    let (body, check) = padded.split_at(9);
    match (tax_id_check_digit(body), check.parse::<u8>()) {
        (Some(expected), Ok(actual)) => expected == actual,
        _ => false,
    }
}

/// Compute the check digit for up to nine body digits.
///
/// Returns `None` when `body` is empty, longer than nine characters, or
/// contains anything but ASCII digits.
pub fn tax_id_check_digit(body: &str) -> Option<u8> {
    if body.is_empty() || body.len() > 9 || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{body:0>9}");
    let sum: u32 = padded
        .bytes()
        .zip(CUI_WEIGHTS)
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();
    Some(((sum * 10) % 11 % 10) as u8)
}

/// Digits-only form of a tax identifier, as the ANAF endpoints expect it in
/// the `cif` parameter. `None` when the digit count is outside 2..=10.
pub fn normalize_tax_id(id: &str) -> Option<String> {
    tax_id_digits(id)
}

fn tax_id_digits(id: &str) -> Option<String> {
    let trimmed = id.trim();
    let without_prefix = match trimmed.get(..2) {
        Some(prefix) if prefix.chars().all(|c| c.is_ascii_alphabetic()) => &trimmed[2..],
        _ => trimmed,
    };
    let digits: String = without_prefix
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if (2..=10).contains(&digits.len()) {
        Some(digits)
    } else {
        None
    }
}

/// Validate a Romanian bank account number (IBAN).
///
/// Whitespace is stripped and letters upper-cased before checking the
/// national structure (`RO`, two check digits, four-letter bank code,
/// sixteen alphanumerics). The ISO 7064 mod-97 check digits are verified as
/// well.
pub fn validate_bank_account(iban: &str) -> bool {
    let compact: String = iban
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    has_ro_iban_structure(&compact) && iban_mod97(&compact) == Some(1)
}

fn has_ro_iban_structure(iban: &str) -> bool {
    let b = iban.as_bytes();
    b.len() == RO_IBAN_LEN
        && b[..2].iter().all(u8::is_ascii_uppercase)
        && b[2..4].iter().all(u8::is_ascii_digit)
        && b[4..8].iter().all(u8::is_ascii_uppercase)
        && b[8..].iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// ISO 7064 MOD 97-10 remainder of an IBAN, computed digit by digit so
/// arbitrarily long inputs never overflow.
fn iban_mod97(iban: &str) -> Option<u32> {
    let rearranged = iban.get(4..)?.chars().chain(iban.get(..4)?.chars());
    let mut remainder: u32 = 0;
    for c in rearranged {
        let value = c.to_digit(36)?;
        if value >= 10 {
            remainder = (remainder * 100 + value) % 97;
        } else {
            remainder = (remainder * 10 + value) % 97;
        }
    }
    Some(remainder)
}
