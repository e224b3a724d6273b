//! Application configuration, deserialized from `config.toml` in the data
//! directory. Every field has a default so a missing or partial file still
//! yields a working config. Secrets (OAuth client id/secret) come from the
//! environment, never from the file.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the REST API binds to.
    pub bind_addr: String,
    /// Base URL of the model-gateway / OAuth provider.
    pub gateway_base_url: String,
    /// Whether an unauthenticated visitor may record a fire interaction.
    /// When false, fire requests without a session are rejected.
    pub allow_anonymous_fire: bool,
    /// Inter-speaker pacing bounds for chat rounds, in milliseconds.
    /// Set both to 0 to disable pacing (tests do).
    pub pace_min_ms: u64,
    pub pace_max_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            gateway_base_url: default_gateway_base_url(),
            allow_anonymous_fire: true,
            pace_min_ms: 1000,
            pace_max_ms: 3000,
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_gateway_base_url() -> String {
    "https://app.mindos.com/gate/lab".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.allow_anonymous_fire);
        assert_eq!(config.pace_min_ms, 1000);
        assert_eq!(config.pace_max_ms, 3000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            allow_anonymous_fire = false
            pace_min_ms = 0
            pace_max_ms = 0
            "#,
        )
        .unwrap();
        assert!(!config.allow_anonymous_fire);
        assert_eq!(config.pace_max_ms, 0);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }
}
