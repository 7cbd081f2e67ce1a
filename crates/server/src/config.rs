use anyhow::{Context, Result};
use salesdesk_core::seed::SeedConfig;
use salesdesk_core::storage::RedbSalesStore;
use salesdesk_mcp::server::McpServer;
use salesdesk_mcp::tools::{register_sales_tools, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

fn default_db_file() -> String {
    "sales.redb".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: default_db_file(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path, data_dir: PathBuf) -> Result<Self> {
        // Create data directory if it doesn't exist
        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        // Load config file if it exists, otherwise use defaults
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::default()
        };

        config.data_dir = data_dir;

        Ok(config)
    }

    /// Get the sales store path
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.db_file)
    }

    pub fn open_store(&self) -> Result<RedbSalesStore> {
        RedbSalesStore::new(self.store_path()).context("Failed to open sales store")
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RedbSalesStore>,
    pub mcp: Arc<McpServer>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Self::from_store(Arc::new(config.open_store()?))
    }

    pub fn from_store(store: Arc<RedbSalesStore>) -> Result<Self> {
        let mut registry = ToolRegistry::new();
        register_sales_tools(&mut registry, store.clone()).context("Failed to register tools")?;
        tracing::info!("Registered {} tools", registry.len());

        Ok(Self {
            store,
            mcp: Arc::new(McpServer::new(registry)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        let config = ServerConfig::load(&temp_dir.path().join("absent.toml"), data_dir.clone()).unwrap();

        assert!(data_dir.is_dir());
        assert_eq!(config.store_path(), data_dir.join("sales.redb"));
        assert_eq!(config.seed.shops, 5);
        assert_eq!(config.seed.orders_per_shop, 200);
        assert_eq!(config.seed.seed, None);
    }

    #[test]
    fn test_partial_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("salesdesk.toml");
        std::fs::write(
            &config_path,
            "[storage]\ndb_file = \"demo.redb\"\n\n[seed]\nshops = 2\nseed = 42\n",
        )
        .unwrap();

        let config = ServerConfig::load(&config_path, temp_dir.path().to_path_buf()).unwrap();

        assert_eq!(config.store_path(), temp_dir.path().join("demo.redb"));
        assert_eq!(config.seed.shops, 2);
        assert_eq!(config.seed.customers_per_shop, 100);
        assert_eq!(config.seed.seed, Some(42));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("salesdesk.toml");
        std::fs::write(&config_path, "[storage\n").unwrap();

        let err = ServerConfig::load(&config_path, temp_dir.path().to_path_buf()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse configuration file"));
    }

    #[test]
    fn test_app_state_registers_sales_tools() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig::load(&temp_dir.path().join("absent.toml"), temp_dir.path().to_path_buf()).unwrap();

        let state = AppState::new(&config).unwrap();
        assert_eq!(state.mcp.registry().len(), 3);
    }
}
