//! Configuration management for Library Tracker

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::models::enums::Membership;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LibraryConfig {
    pub name: String,
}

/// Borrowing limits for one membership tier
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TierLimits {
    /// Maximum number of items held at once
    pub max_items: usize,
    /// Outstanding fines must stay below this to borrow; zero means none allowed
    pub fine_threshold: Decimal,
    /// Days added to the standard borrow period
    pub bonus_days: i64,
}

impl TierLimits {
    /// Whether a user owing `fine` may still borrow
    pub fn allows_fine(&self, fine: Decimal) -> bool {
        fine <= Decimal::ZERO || fine < self.fine_threshold
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoansConfig {
    pub borrow_period_days: i64,
    pub physical_fee_per_day: Decimal,
    pub electronic_fee_per_day: Decimal,
    pub standard: TierLimits,
    pub silver: TierLimits,
    pub gold: TierLimits,
    pub platinum: TierLimits,
}

impl LoansConfig {
    pub fn limits_for(&self, membership: Membership) -> &TierLimits {
        match membership {
            Membership::Standard => &self.standard,
            Membership::Silver => &self.silver,
            Membership::Gold => &self.gold,
            Membership::Platinum => &self.platinum,
        }
    }

    /// Days an item may be kept before late fees apply
    pub fn borrow_period_for(&self, membership: Membership) -> i64 {
        self.borrow_period_days + self.limits_for(membership).bonus_days
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory the catalog files are written to
    pub data_dir: PathBuf,
    /// File name (without extension) of the catalog files
    pub file_stem: String,
    /// Transaction journal file, relative to `data_dir`
    pub journal: Option<String>,
}

impl StorageConfig {
    pub fn catalog_path(&self, extension: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", self.file_stem, extension))
    }

    pub fn journal_path(&self) -> Option<PathBuf> {
        self.journal.as_ref().map(|name| self.data_dir.join(name))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub loans: LoansConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config/` and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Load configuration from the files in `dir` and environment variables.
    /// Every layer may set any subset of keys.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let file = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let config = Config::builder()
            // Built-in defaults
            .add_source(Config::try_from(&AppConfig::default())?)
            // Optional defaults file
            .add_source(File::with_name(&file("default")).required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&file(&run_mode)).required(false))
            // Add environment variables (e.g. LIBRARY__LOANS__BORROW_PERIOD_DAYS)
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            name: "Python Learning Library".to_string(),
        }
    }
}

impl Default for LoansConfig {
    fn default() -> Self {
        Self {
            borrow_period_days: 14,
            physical_fee_per_day: Decimal::new(50, 2),
            electronic_fee_per_day: Decimal::new(25, 2),
            standard: TierLimits {
                max_items: 3,
                fine_threshold: Decimal::ZERO,
                bonus_days: 0,
            },
            silver: TierLimits {
                max_items: 5,
                fine_threshold: Decimal::new(5, 0),
                bonus_days: 7,
            },
            gold: TierLimits {
                max_items: 7,
                fine_threshold: Decimal::new(5, 0),
                bonus_days: 14,
            },
            platinum: TierLimits {
                max_items: 10,
                fine_threshold: Decimal::new(5, 0),
                bonus_days: 21,
            },
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_stem: "library_data".to_string(),
            journal: Some("library_log.txt".to_string()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}
