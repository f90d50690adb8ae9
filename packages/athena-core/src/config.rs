//! Runtime configuration loaded from TOML.
//!
//! Every field has a default, so an empty or missing file is a valid config.

use crate::portfolio::{DuplicatePolicy, ValuationOptions};
use crate::provider::ProviderKind;
use crate::types::{Interval, Period};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default Yahoo chart endpoint.
pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AthenaConfig {
    pub provider: ProviderConfig,
    pub portfolio: PortfolioConfig,
    pub analysis: AnalysisConfig,
}

/// Price provider selection and transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Which provider to build at startup
    pub kind: ProviderKind,
    /// Chart API base URL (yahoo)
    pub base_url: String,
    /// HTTP timeout in seconds (yahoo)
    pub timeout_secs: u64,
    /// HTTP user agent (yahoo)
    pub user_agent: String,
    /// Directory holding `<TICKER>.csv` files (csv)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Cache lifetime in seconds; 0 disables caching
    pub cache_ttl_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            base_url: DEFAULT_CHART_URL.to_string(),
            timeout_secs: 10,
            user_agent: format!("athena/{}", env!("CARGO_PKG_VERSION")),
            data_dir: None,
            cache_ttl_secs: 900,
        }
    }
}

/// Portfolio valuation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PortfolioConfig {
    pub period: Period,
    pub interval: Interval,
    pub duplicates: DuplicatePolicy,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            period: Period::Year2,
            interval: Interval::Daily,
            duplicates: DuplicatePolicy::Independent,
        }
    }
}

/// Single-ticker analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Benchmark ticker for beta/alpha
    pub benchmark: String,
    pub risk_period: Period,
    pub backtest_period: Period,
    pub technicals_period: Period,
    /// Fast SMA window for the crossover backtest
    pub fast_window: usize,
    /// Slow SMA window for the crossover backtest
    pub slow_window: usize,
    /// VaR confidence level, e.g. 0.95
    pub var_confidence: f64,
    /// SMA windows drawn over the technicals chart
    pub sma_overlays: Vec<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            benchmark: "^GSPC".to_string(),
            risk_period: Period::Year3,
            backtest_period: Period::Year5,
            technicals_period: Period::Year1,
            fast_window: 20,
            slow_window: 50,
            var_confidence: 0.95,
            sma_overlays: vec![20, 50],
        }
    }
}

impl AthenaConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.athena/config.toml`
    /// Can be overridden with `ATHENA_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("ATHENA_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".athena/config.toml"))
            .unwrap_or_else(|| PathBuf::from("athena.toml"))
    }

    /// Load from `ATHENA_CONFIG` or the default location.
    ///
    /// A missing file at the home location yields defaults; a missing file
    /// named by `ATHENA_CONFIG` is an error.
    pub fn load() -> Result<Self> {
        let explicit = env::var_os("ATHENA_CONFIG").is_some();
        let path = Self::default_path();

        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        Self::from_path(&path)
    }

    /// Load from a specific file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the analytics cannot work with.
    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;

        if !(analysis.var_confidence > 0.0 && analysis.var_confidence < 1.0) {
            return Err(Error::Config(format!(
                "analysis.var_confidence must be in (0, 1), got {}",
                analysis.var_confidence
            )));
        }

        if analysis.fast_window == 0 || analysis.slow_window == 0 {
            return Err(Error::Config(
                "analysis.fast_window and analysis.slow_window must be positive".to_string(),
            ));
        }

        if analysis.sma_overlays.contains(&0) {
            return Err(Error::Config(
                "analysis.sma_overlays must not contain 0".to_string(),
            ));
        }

        if self.provider.kind == ProviderKind::Csv && self.provider.data_dir.is_none() {
            return Err(Error::Config(
                "provider.data_dir is required for the csv provider".to_string(),
            ));
        }

        Ok(())
    }

    /// Valuation options derived from the `[portfolio]` section.
    pub fn valuation_options(&self) -> ValuationOptions {
        ValuationOptions {
            period: self.portfolio.period,
            interval: self.portfolio.interval,
            duplicates: self.portfolio.duplicates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AthenaConfig::from_toml_str("").unwrap();
        assert_eq!(config, AthenaConfig::default());
        assert_eq!(config.provider.kind, ProviderKind::Yahoo);
        assert_eq!(config.portfolio.period, Period::Year2);
        assert_eq!(config.analysis.benchmark, "^GSPC");
        assert_eq!(config.analysis.sma_overlays, vec![20, 50]);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [provider]
            kind = "csv"
            data_dir = "/var/lib/athena/prices"
            cache_ttl_secs = 0

            [portfolio]
            period = "1y"
            interval = "1d"
            duplicates = "merge"

            [analysis]
            benchmark = "IVV"
            fast_window = 10
            slow_window = 30
            var_confidence = 0.99
        "#;

        let config = AthenaConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Csv);
        assert_eq!(
            config.provider.data_dir,
            Some(PathBuf::from("/var/lib/athena/prices"))
        );
        assert_eq!(config.provider.cache_ttl_secs, 0);
        assert_eq!(config.portfolio.duplicates, DuplicatePolicy::Merge);

        let options = config.valuation_options();
        assert_eq!(options.period, Period::Year1);
        assert_eq!(options.duplicates, DuplicatePolicy::Merge);

        assert_eq!(config.analysis.benchmark, "IVV");
        assert_eq!(config.analysis.slow_window, 30);
        // Unset fields keep their defaults
        assert_eq!(config.analysis.backtest_period, Period::Year5);
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let result = AthenaConfig::from_toml_str("[analysis]\nvar_confidence = 1.5\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_window_rejected() {
        let result = AthenaConfig::from_toml_str("[analysis]\nfast_window = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_csv_provider_requires_data_dir() {
        let result = AthenaConfig::from_toml_str("[provider]\nkind = \"csv\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_period_rejected() {
        let result = AthenaConfig::from_toml_str("[portfolio]\nperiod = \"7y\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nbenchmark = \"SPY\"").unwrap();

        let config = AthenaConfig::from_path(file.path()).unwrap();
        assert_eq!(config.analysis.benchmark, "SPY");
    }

    #[test]
    fn test_from_missing_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AthenaConfig::from_path(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
