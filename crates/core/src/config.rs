use serde::Deserialize;

use crate::error::MarketResult;

/// Root application configuration. Loaded from environment variables
/// with the prefix `PODSPONSOR__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Defaults and limits applied by the campaign, ledger and performance operations.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
    #[serde(default = "default_ad_duration_secs")]
    pub default_ad_duration_secs: u32,
    #[serde(default = "default_attribution_days")]
    pub default_attribution_days: u32,
    /// Prefix for generated tracking links; the tracking code is appended.
    #[serde(default = "default_tracking_base_url")]
    pub tracking_base_url: String,
    #[serde(default = "default_tracking_code_len")]
    pub tracking_code_len: usize,
    #[serde(default = "default_max_episodes")]
    pub max_episodes_per_campaign: u32,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_ad_duration_secs() -> u32 {
    30
}
fn default_attribution_days() -> u32 {
    30
}
fn default_tracking_base_url() -> String {
    "https://track.podsponsor.io/c".to_string()
}
fn default_tracking_code_len() -> usize {
    8
}
fn default_max_episodes() -> u32 {
    520
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            default_ad_duration_secs: default_ad_duration_secs(),
            default_attribution_days: default_attribution_days(),
            tracking_base_url: default_tracking_base_url(),
            tracking_code_len: default_tracking_code_len(),
            max_episodes_per_campaign: default_max_episodes(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            marketplace: MarketplaceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> MarketResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("PODSPONSOR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let loaded: Self = config.try_deserialize()?;
        tracing::debug!(node_id = %loaded.node_id, "Configuration deserialized");
        Ok(loaded)
    }
}
