//! Legal VAT rates and exemption citations, kept as date-effective data.
//!
//! A change in the rate law is a new [`RateLaw`] entry, not a code change.
//! Tables are serde-deserialisable so they can live in configuration.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::EfacturaError;
use super::types::{ExemptionCitation, VatCategory};

/// Set of legal VAT rates in force from a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLaw {
    /// First day the law applies to (by document issue date).
    pub effective_from: NaiveDate,
    /// Legal rates in percent.
    pub rates: Vec<Decimal>,
}

/// Exemption citation attached to VAT groups of a non-standard category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCitation {
    pub category: VatCategory,
    pub code: String,
    pub text: String,
}

#[derive(Deserialize)]
struct RawRateTable {
    laws: Vec<RateLaw>,
    #[serde(default)]
    citations: Option<Vec<CategoryCitation>>,
}

/// Versioned table of legal VAT rates plus per-category citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRateTable")]
pub struct VatRateTable {
    laws: Vec<RateLaw>,
    citations: Vec<CategoryCitation>,
}

impl TryFrom<RawRateTable> for VatRateTable {
    type Error = EfacturaError;

    fn try_from(raw: RawRateTable) -> Result<Self, Self::Error> {
        Self::new(
            raw.laws,
            raw.citations.unwrap_or_else(default_citations),
        )
    }
}

impl Default for VatRateTable {
    /// Rates accepted on current documents: the post-August-2025 rates (11 %,
    /// 21 %) alongside the earlier 5 %, 9 % and 19 %, which remain valid for
    /// supplies chargeable before the change.
    fn default() -> Self {
        Self {
            laws: vec![RateLaw {
                effective_from: date(2017, 1, 1),
                rates: vec![dec!(0), dec!(5), dec!(9), dec!(11), dec!(19), dec!(21)],
            }],
            citations: default_citations(),
        }
    }
}

impl VatRateTable {
    /// Build a table. Laws are ordered by effective date; an empty table or
    /// a law without rates is rejected.
    pub fn new(
        mut laws: Vec<RateLaw>,
        citations: Vec<CategoryCitation>,
    ) -> Result<Self, EfacturaError> {
        if laws.is_empty() {
            return Err(EfacturaError::Config(
                "VAT rate table needs at least one law".into(),
            ));
        }
        if let Some(law) = laws.iter().find(|l| l.rates.is_empty()) {
            return Err(EfacturaError::Config(format!(
                "VAT rate law effective {} has no rates",
                law.effective_from
            )));
        }
        if citations.iter().any(|c| c.category == VatCategory::Standard) {
            return Err(EfacturaError::Config(
                "standard-rated supplies carry no exemption citation".into(),
            ));
        }
        laws.sort_by_key(|l| l.effective_from);
        Ok(Self { laws, citations })
    }

    /// Strictly dated Romanian rate laws: 19/9/5 % until 31 July 2025,
    /// 21/11 % from 1 August 2025 (Law 141/2025).
    pub fn romania_historical() -> Self {
        Self {
            laws: vec![
                RateLaw {
                    effective_from: date(2017, 1, 1),
                    rates: vec![dec!(0), dec!(5), dec!(9), dec!(19)],
                },
                RateLaw {
                    effective_from: date(2025, 8, 1),
                    rates: vec![dec!(0), dec!(11), dec!(21)],
                },
            ],
            citations: default_citations(),
        }
    }

    /// Legal rates for a document issued on `date`. An unknown date resolves
    /// to the most recent law; a date before the first law to the first.
    pub fn rates_on(&self, date: Option<NaiveDate>) -> &[Decimal] {
        let law = match date {
            Some(d) => self
                .laws
                .iter()
                .rev()
                .find(|l| l.effective_from <= d)
                .or_else(|| self.laws.first()),
            None => self.laws.last(),
        };
        law.map(|l| l.rates.as_slice()).unwrap_or(&[])
    }

    pub fn is_legal_rate(&self, rate: Decimal, date: Option<NaiveDate>) -> bool {
        self.rates_on(date).contains(&rate)
    }

    /// Citation for a non-standard category; `None` for standard-rated.
    pub fn citation_for(&self, category: VatCategory) -> Option<ExemptionCitation> {
        self.citations
            .iter()
            .find(|c| c.category == category)
            .map(|c| ExemptionCitation {
                code: c.code.clone(),
                text: c.text.clone(),
            })
    }

    pub fn laws(&self) -> &[RateLaw] {
        &self.laws
    }
}

fn default_citations() -> Vec<CategoryCitation> {
    let cite = |category, code: &str, text: &str| CategoryCitation {
        category,
        code: code.to_string(),
        text: text.to_string(),
    };
    vec![
        cite(
            VatCategory::ZeroRated,
            "VATEX-EU-148",
            "Scutit cu drept de deducere conform art. 294 alin. (1) din Codul fiscal",
        ),
        cite(
            VatCategory::Exempt,
            "VATEX-EU-132",
            "Scutit fără drept de deducere conform art. 292 din Codul fiscal",
        ),
        cite(
            VatCategory::ReverseCharge,
            "VATEX-EU-AE",
            "Taxare inversă conform art. 331 din Codul fiscal",
        ),
        cite(
            VatCategory::IntraCommunity,
            "VATEX-EU-IC",
            "Livrare intracomunitară scutită conform art. 294 alin. (2) lit. a) din Codul fiscal",
        ),
        cite(
            VatCategory::Export,
            "VATEX-EU-G",
            "Export scutit conform art. 294 alin. (1) lit. a) din Codul fiscal",
        ),
        cite(
            VatCategory::NotSubject,
            "VATEX-EU-O",
            "Operațiune neimpozabilă în România conform art. 278 din Codul fiscal",
        ),
    ]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    // Constant dates; out-of-range values would be a table programming error.
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}
