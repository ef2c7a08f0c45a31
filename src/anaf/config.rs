use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{EfacturaError, VatRateTable};

/// Production SPV e-Factura endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anaf.ro/prod/FCTEL/rest";
/// Test endpoint, same API without legal effect.
pub const TEST_BASE_URL: &str = "https://api.anaf.ro/test/FCTEL/rest";

const ENV_PREFIX: &str = "EFACTURA";

/// Everything the pipeline reads from configuration.
///
/// Loaded once by the host application and passed to the components that
/// need it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EfacturaConfig {
    pub anaf: AnafConfig,
    pub sync: SyncConfig,
    pub rates: VatRateTable,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnafConfig {
    pub base_url: String,
    /// Per-request timeout; a timeout counts as a transport error.
    pub timeout_secs: u64,
}

impl Default for AnafConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Period of the received-invoice sync.
    pub incoming_interval_secs: u64,
    /// Period of the submitted-document status sync.
    pub status_interval_secs: u64,
    /// Window passed to the list call, in days (ANAF accepts 1..=60).
    pub lookback_days: u32,
    /// Submissions still without a final answer after this many whole days
    /// are reported as overdue. They keep being polled.
    pub stale_after_days: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            incoming_interval_secs: 3600,
            status_interval_secs: 300,
            lookback_days: 60,
            stale_after_days: 7,
        }
    }
}

impl EfacturaConfig {
    /// Load from a TOML file, then apply `EFACTURA__SECTION__KEY`
    /// environment overrides. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EfacturaError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(env_source());
        finish(builder)
    }

    /// Parse a TOML document without touching the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, EfacturaError> {
        finish(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<EfacturaConfig, EfacturaError> {
    let config: EfacturaConfig = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| EfacturaError::Config(e.to_string()))?;

    if config.sync.lookback_days == 0 || config.sync.lookback_days > 60 {
        return Err(EfacturaError::Config(format!(
            "sync.lookback_days must be 1-60, got {}",
            config.sync.lookback_days
        )));
    }
    if config.sync.incoming_interval_secs == 0 || config.sync.status_interval_secs == 0 {
        return Err(EfacturaError::Config("sync intervals must be non-zero".into()));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_from_empty_document() {
        let config = EfacturaConfig::from_toml_str("").unwrap();
        assert_eq!(config.anaf.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.sync.lookback_days, 60);
        assert_eq!(config.sync.stale_after_days, 7);
        assert_eq!(config.rates, VatRateTable::default());
    }

    #[test]
    fn sections_and_rate_table() {
        let config = EfacturaConfig::from_toml_str(
            r#"
[anaf]
base_url = "https://api.anaf.ro/test/FCTEL/rest"
timeout_secs = 10

[sync]
status_interval_secs = 120

[[rates.laws]]
effective_from = "2017-01-01"
rates = ["0", "5", "9", "19"]

[[rates.laws]]
effective_from = "2025-08-01"
rates = ["0", "11", "21"]
"#,
        )
        .unwrap();
        assert_eq!(config.anaf.base_url, TEST_BASE_URL);
        assert_eq!(config.anaf.timeout_secs, 10);
        assert_eq!(config.sync.status_interval_secs, 120);
        assert_eq!(config.sync.incoming_interval_secs, 3600);
        let before = NaiveDate::from_ymd_opt(2025, 7, 31);
        assert!(config.rates.is_legal_rate(dec!(19), before));
        assert!(!config.rates.is_legal_rate(dec!(21), before));
    }

    #[test]
    fn rejects_out_of_range_lookback() {
        let err = EfacturaConfig::from_toml_str("[sync]\nlookback_days = 90").unwrap_err();
        assert!(matches!(err, EfacturaError::Config(_)));
    }
}
