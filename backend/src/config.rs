//! Configuration management for the Sayariq server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with SAYARIQ_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::DiscountConfig;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Upstream Sayariq API
    pub upstream: UpstreamConfig,

    /// Base discount rates applied on settlement
    pub discounts: DiscountConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base URL every resource path is appended to
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("SAYARIQ_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let discounts = DiscountConfig::default();

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("upstream.base_url", "http://localhost:8000/api")?
            .set_default("upstream.timeout_secs", 30)?
            .set_default("discounts.crate_unit_price", discounts.crate_unit_price.to_string())?
            .set_default("discounts.freight_pct", discounts.freight_pct.to_string())?
            .set_default("discounts.issuance_pct", discounts.issuance_pct.to_string())?
            .set_default("discounts.harvest_pct", discounts.harvest_pct.to_string())?
            .set_default("discounts.processing_pct", discounts.processing_pct.to_string())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SAYARIQ_ prefix)
            .add_source(
                Environment::with_prefix("SAYARIQ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            discounts: DiscountConfig::default(),
        }
    }
}
