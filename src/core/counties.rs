//! Romanian county (județ) codes, ISO 3166-2:RO.
//!
//! CIUS-RO requires the country subdivision of Romanian addresses to be
//! sent as an ISO 3166-2:RO code ("RO-CJ"). Callers usually store the county
//! name, so names, bare codes and prefixed codes are all accepted.

/// (code, normalized name), sorted by code for binary search.
static COUNTIES: &[(&str, &str)] = &[
    ("AB", "alba"),
    ("AG", "arges"),
    ("AR", "arad"),
    ("B", "bucuresti"),
    ("BC", "bacau"),
    ("BH", "bihor"),
    ("BN", "bistritanasaud"),
    ("BR", "braila"),
    ("BT", "botosani"),
    ("BV", "brasov"),
    ("BZ", "buzau"),
    ("CJ", "cluj"),
    ("CL", "calarasi"),
    ("CS", "carasseverin"),
    ("CT", "constanta"),
    ("CV", "covasna"),
    ("DB", "dambovita"),
    ("DJ", "dolj"),
    ("GJ", "gorj"),
    ("GL", "galati"),
    ("GR", "giurgiu"),
    ("HD", "hunedoara"),
    ("HR", "harghita"),
    ("IF", "ilfov"),
    ("IL", "ialomita"),
    ("IS", "iasi"),
    ("MH", "mehedinti"),
    ("MM", "maramures"),
    ("MS", "mures"),
    ("NT", "neamt"),
    ("OT", "olt"),
    ("PH", "prahova"),
    ("SB", "sibiu"),
    ("SJ", "salaj"),
    ("SM", "satumare"),
    ("SV", "suceava"),
    ("TL", "tulcea"),
    ("TM", "timis"),
    ("TR", "teleorman"),
    ("VL", "valcea"),
    ("VN", "vrancea"),
    ("VS", "vaslui"),
];

/// Resolve a county name or code to its ISO 3166-2:RO code ("RO-CJ").
pub fn county_code(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();
    let bare = upper.strip_prefix("RO-").unwrap_or(&upper);
    if COUNTIES.binary_search_by(|(code, _)| (*code).cmp(bare)).is_ok() {
        return Some(format!("RO-{bare}"));
    }

    let name = normalize_name(trimmed);
    let name = name.strip_prefix("municipiul").unwrap_or(&name);
    let name = name.strip_prefix("judetul").unwrap_or(name);
    COUNTIES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| format!("RO-{code}"))
}

/// Whether `value` names a Romanian county.
pub fn is_known_county(value: &str) -> bool {
    county_code(value).is_some()
}

fn normalize_name(value: &str) -> String {
    value
        .chars()
        .filter_map(|c| match c {
            'ă' | 'â' | 'Ă' | 'Â' => Some('a'),
            'î' | 'Î' => Some('i'),
            'ș' | 'ş' | 'Ș' | 'Ş' => Some('s'),
            'ț' | 'ţ' | 'Ț' | 'Ţ' => Some('t'),
            c if c.is_alphanumeric() => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_names() {
        assert_eq!(county_code("CJ").as_deref(), Some("RO-CJ"));
        assert_eq!(county_code("ro-cj").as_deref(), Some("RO-CJ"));
        assert_eq!(county_code("Cluj").as_deref(), Some("RO-CJ"));
        assert_eq!(county_code("Bistrița-Năsăud").as_deref(), Some("RO-BN"));
        assert_eq!(county_code("Municipiul București").as_deref(), Some("RO-B"));
        assert_eq!(county_code("Județul Iași").as_deref(), Some("RO-IS"));
        assert_eq!(county_code("Satu Mare").as_deref(), Some("RO-SM"));
        assert!(county_code("Bavaria").is_none());
        assert!(county_code("").is_none());
    }

    #[test]
    fn list_is_sorted() {
        for window in COUNTIES.windows(2) {
            assert!(
                window[0].0 < window[1].0,
                "county codes not sorted: {} >= {}",
                window[0].0,
                window[1].0
            );
        }
    }

    #[test]
    fn list_count() {
        assert_eq!(COUNTIES.len(), 42);
    }
}
