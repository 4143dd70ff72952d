//! # Pricing Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_TAX_RATE_BPS=1100                                       │
//! │     STOREFRONT_CATALOG=/srv/storefront/catalog.toml                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $STOREFRONT_CONFIG, else                                           │
//! │     ~/.config/storefront/pricing.toml (Linux)                          │
//! │     ~/Library/Application Support/com.storefront.storefront/... (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no tax, clamp oversized percentages, zero tolerance                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! [pricing]
//! tax_rate_bps = 1100             # 11%; also enforced by `verify`
//! percentage_overflow = "clamp"   # clamp | reject
//! max_item_quantity = 10000
//! max_line_items = 500
//!
//! [verify]
//! catalog = "/srv/storefront/catalog.toml"
//! tolerance_cents = 0
//!
//! [log]
//! filter = "info,storefront_core=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storefront_core::{
    Money, PercentageOverflow, PriceCalculator, PricingPolicy, TaxRate, ValidationError,
    DEFAULT_MAX_ITEM_QUANTITY, DEFAULT_MAX_LINE_ITEMS,
};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "STOREFRONT_CONFIG";

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid_value(key: &str, value: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

fn default_max_item_quantity() -> i64 {
    DEFAULT_MAX_ITEM_QUANTITY
}

fn default_max_line_items() -> usize {
    DEFAULT_MAX_LINE_ITEMS
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// `[pricing]`: how totals are computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Store tax rate in basis points. When set, payloads without a rate use
    /// it and `verify` enforces it over whatever the submission claims.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate_bps: Option<u32>,

    #[serde(default)]
    pub percentage_overflow: PercentageOverflow,

    #[serde(default = "default_max_item_quantity")]
    pub max_item_quantity: i64,

    #[serde(default = "default_max_line_items")]
    pub max_line_items: usize,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            tax_rate_bps: None,
            percentage_overflow: PercentageOverflow::default(),
            max_item_quantity: default_max_item_quantity(),
            max_line_items: default_max_line_items(),
        }
    }
}

/// `[verify]`: submission re-pricing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifySettings {
    /// Catalog file (TOML or JSON) with trusted prices and promo codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// Claimed totals within this many cents are accepted.
    #[serde(default)]
    pub tolerance_cents: i64,
}

/// `[log]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Pricing Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub verify: VerifySettings,

    #[serde(default)]
    pub log: LogSettings,
}

impl PricingConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$STOREFRONT_CONFIG`, or the platform default)
    /// 3. Environment variables
    ///
    /// An explicitly named file must exist; the platform default may be absent.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit =
            config_path.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match (&explicit, Self::default_config_path()) {
            (Some(path), _) => Self::from_file(path)?,
            (None, Some(path)) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(?path, "Loading pricing config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `STOREFRONT_*` overrides read through `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("STOREFRONT_TAX_RATE_BPS") {
            self.pricing.tax_rate_bps = Some(parse_env("STOREFRONT_TAX_RATE_BPS", &value)?);
        }

        if let Some(value) = lookup("STOREFRONT_PERCENTAGE_OVERFLOW") {
            self.pricing.percentage_overflow =
                value.parse().map_err(|_: ValidationError| {
                    ConfigError::invalid_value("STOREFRONT_PERCENTAGE_OVERFLOW", &value)
                })?;
        }

        if let Some(value) = lookup("STOREFRONT_MAX_ITEM_QUANTITY") {
            self.pricing.max_item_quantity = parse_env("STOREFRONT_MAX_ITEM_QUANTITY", &value)?;
        }

        if let Some(value) = lookup("STOREFRONT_MAX_LINE_ITEMS") {
            self.pricing.max_line_items = parse_env("STOREFRONT_MAX_LINE_ITEMS", &value)?;
        }

        if let Some(value) = lookup("STOREFRONT_CATALOG") {
            debug!(catalog = %value, "Overriding catalog path from environment");
            self.verify.catalog = Some(PathBuf::from(value));
        }

        if let Some(value) = lookup("STOREFRONT_TOLERANCE_CENTS") {
            self.verify.tolerance_cents = parse_env("STOREFRONT_TOLERANCE_CENTS", &value)?;
        }

        if let Some(value) = lookup("STOREFRONT_LOG") {
            self.log.filter = value;
        }

        Ok(())
    }

    /// Checks values a file or the environment could get wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tax_rate()?;

        if self.pricing.max_item_quantity < 1 {
            return Err(ConfigError::Invalid(
                "max_item_quantity must be at least 1".into(),
            ));
        }

        if self.pricing.max_line_items == 0 {
            return Err(ConfigError::Invalid(
                "max_line_items must be greater than 0".into(),
            ));
        }

        if !self.policy().fits_in_cents() {
            return Err(ConfigError::Invalid(format!(
                "max_item_quantity ({}) × max_line_items ({}) admits totals too large to price",
                self.pricing.max_item_quantity, self.pricing.max_line_items
            )));
        }

        if self.verify.tolerance_cents < 0 {
            return Err(ConfigError::Invalid(
                "tolerance_cents must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// The configured store tax rate, if any.
    pub fn tax_rate(&self) -> Result<Option<TaxRate>, ConfigError> {
        self.pricing
            .tax_rate_bps
            .map(|bps| {
                TaxRate::from_bps(bps)
                    .map_err(|_| ConfigError::invalid_value("tax_rate_bps", &bps.to_string()))
            })
            .transpose()
    }

    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            percentage_overflow: self.pricing.percentage_overflow,
            max_item_quantity: self.pricing.max_item_quantity,
            max_line_items: self.pricing.max_line_items,
        }
    }

    pub fn calculator(&self) -> PriceCalculator {
        PriceCalculator::new(self.policy())
    }

    pub fn tolerance(&self) -> Money {
        Money::from_cents(self.verify.tolerance_cents)
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "storefront")
            .map(|dirs| dirs.config_dir().join("pricing.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(key, value))
}
