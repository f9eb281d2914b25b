//! Configuration file management.
//!
//! Read from `$BEACON_DATA_DIR/config.toml`, or the platform data directory
//! when the variable is unset. Every section is optional.

use std::path::PathBuf;

use anyhow::Context;
use beacon_oracle::access::{RoleTable, Whitelist};
use beacon_oracle::freshness::{FreshnessPolicy, CLOCK_SKEW_SECS, FRESHNESS_WINDOW_SECS};
use serde::{Deserialize, Serialize};

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Freshness policy.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Roles and read grants.
    #[serde(default)]
    pub access: AccessConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Freshness policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Maximum age of a signed timestamp, in seconds.
    #[serde(default = "default_freshness_window")]
    pub freshness_window_secs: u64,
    /// How far ahead of the local clock a timestamp may be, in seconds.
    #[serde(default = "default_clock_skew")]
    pub clock_skew_secs: u64,
}

/// Role assignments and read grants. Identities are hex-encoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// May set aliases. Empty = no manager.
    #[serde(default)]
    pub manager: String,
    /// Bypass the whitelist for every read.
    #[serde(default)]
    pub unlimited_readers: Vec<String>,
    /// May set aliases.
    #[serde(default)]
    pub alias_setters: Vec<String>,
    /// Per-resource grants.
    #[serde(default)]
    pub whitelist: Vec<WhitelistEntry>,
}

/// One reader's grant on one feed or alias name hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub resource: String,
    pub reader: String,
    /// Unix time the time-bounded grant ends. 0 = none.
    #[serde(default)]
    pub expires_at: u64,
    /// Accounts holding an indefinite grant for this reader.
    #[serde(default)]
    pub indefinite_granters: Vec<String>,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_freshness_window() -> u64 {
    FRESHNESS_WINDOW_SECS
}

fn default_clock_skew() -> u64 {
    CLOCK_SKEW_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: default_freshness_window(),
            clock_skew_secs: default_clock_skew(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Parse a hex-encoded 32-byte identifier.
pub fn parse_id(label: &str, value: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .with_context(|| format!("{label} is not valid hex"))?;
    <[u8; 32]>::try_from(bytes)
        .map_err(|b| anyhow::anyhow!("{label} must be 32 bytes, got {}", b.len()))
}

impl NodeConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
                .with_context(|| format!("invalid config {}", config_path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// The configured freshness policy.
    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::with_windows(self.oracle.freshness_window_secs, self.oracle.clock_skew_secs)
    }

    /// Build the role table from `[access]`.
    pub fn roles(&self) -> anyhow::Result<RoleTable> {
        let mut roles = if self.access.manager.is_empty() {
            RoleTable::new()
        } else {
            RoleTable::with_manager(parse_id("access.manager", &self.access.manager)?)
        };
        for reader in &self.access.unlimited_readers {
            roles.add_unlimited_reader(parse_id("access.unlimited_readers", reader)?);
        }
        for setter in &self.access.alias_setters {
            roles.add_alias_setter(parse_id("access.alias_setters", setter)?);
        }
        Ok(roles)
    }

    /// Build the whitelist from `[[access.whitelist]]`.
    pub fn whitelist(&self) -> anyhow::Result<Whitelist> {
        let mut whitelist = Whitelist::new();
        for entry in &self.access.whitelist {
            let resource = parse_id("whitelist.resource", &entry.resource)?;
            let reader = parse_id("whitelist.reader", &entry.reader)?;
            if entry.expires_at > 0 {
                whitelist.set_expiration(resource, reader, entry.expires_at);
            }
            for granter in &entry.indefinite_granters {
                whitelist.grant_indefinite(
                    resource,
                    reader,
                    parse_id("whitelist.indefinite_granters", granter)?,
                );
            }
        }
        Ok(whitelist)
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("BEACON_DATA_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("BEACON_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Beacon")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("Beacon")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs_fallback(".beacon")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/beacon"))
}
