//! Configuration types for the salesdesk SDK.

use std::time::Duration;

/// Configuration shared by every session a client opens.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long one request waits for its response.
    pub timeout: Duration,
    /// Name announced to the server during `initialize`.
    pub client_name: String,
    /// Version announced to the server during `initialize`.
    pub client_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            client_name: "salesdesk-sdk".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.client_name, "salesdesk-sdk");
        assert!(!config.client_version.is_empty());
    }
}
