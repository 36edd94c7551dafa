//! Configuration Management
//!
//! Service addresses and tokens, persisted as JSON and overridable from the
//! environment.

use crate::client::{CatalogClient, InventoryClient};
use crate::http::DEFAULT_TIMEOUT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_INVENTORY_ADDRESS: &str = "INFRACTL_INVENTORY_ADDRESS";
const ENV_INVENTORY_TOKEN: &str = "INFRACTL_INVENTORY_TOKEN";
const ENV_CATALOG_ADDRESS: &str = "INFRACTL_CATALOG_ADDRESS";
const ENV_CATALOG_TOKEN: &str = "INFRACTL_CATALOG_TOKEN";

/// Address and credentials of one remote service
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Inventory service (resource collections, automation)
    #[serde(default)]
    pub inventory: ServiceConfig,
    /// Catalog service (descriptor templates)
    #[serde(default)]
    pub catalog: ServiceConfig,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("infractl").join("config.json"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load a config file, falling back to defaults when absent or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut Option<String>, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = Some(value);
            }
        };
        set(&mut self.inventory.address, ENV_INVENTORY_ADDRESS);
        set(&mut self.inventory.token, ENV_INVENTORY_TOKEN);
        set(&mut self.catalog.address, ENV_CATALOG_ADDRESS);
        set(&mut self.catalog.token, ENV_CATALOG_TOKEN);
    }

    /// Overlay every value set in `other`
    pub fn merge(&mut self, other: &Config) {
        fn overlay(target: &mut Option<String>, value: &Option<String>) {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }
        overlay(&mut self.inventory.address, &other.inventory.address);
        overlay(&mut self.inventory.token, &other.inventory.token);
        overlay(&mut self.catalog.address, &other.catalog.address);
        overlay(&mut self.catalog.token, &other.catalog.token);
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// Copy safe to print: tokens are masked
    pub fn redacted(&self) -> Self {
        let mask = |token: &Option<String>| token.as_ref().map(|_| "********".to_string());
        let mut config = self.clone();
        config.inventory.token = mask(&self.inventory.token);
        config.catalog.token = mask(&self.catalog.token);
        config
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn inventory_client(&self) -> Result<InventoryClient> {
        let address = self.inventory.address.as_deref().with_context(|| {
            format!("No inventory address configured. Set {ENV_INVENTORY_ADDRESS} or use --inventory")
        })?;
        InventoryClient::new(address, self.inventory.token.as_deref(), self.timeout())
            .context("Failed to create inventory client")
    }

    pub fn catalog_client(&self) -> Result<CatalogClient> {
        let address = self.catalog.address.as_deref().with_context(|| {
            format!("No catalog address configured. Set {ENV_CATALOG_ADDRESS} or use --catalog")
        })?;
        CatalogClient::new(address, self.catalog.token.as_deref(), self.timeout())
            .context("Failed to create catalog client")
    }
}
