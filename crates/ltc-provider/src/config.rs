//! Provider configuration

use std::time::Duration;

use chain_ltc::network::SOCHAIN_API;
use chain_ltc::LtcNetwork;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// Fee used when a request does not name one: 0.92 LTC.
pub const DEFAULT_FEE_LITOSHI: u64 = 92_000_000;

/// Timeout applied to every explorer request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Network the wallet key lives on
    pub network: LtcNetwork,
    /// Explorer API root, without trailing slash
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Fee for requests that leave it unset
    pub default_fee_litoshi: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            network: LtcNetwork::Mainnet,
            api_base_url: SOCHAIN_API.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_fee_litoshi: DEFAULT_FEE_LITOSHI,
        }
    }
}

impl ProviderConfig {
    /// Default configuration for `network`.
    pub fn for_network(network: LtcNetwork) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ProviderError::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(ProviderError::Config("request_timeout_secs must be positive".into()));
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ProviderError::Config(format!(
                "api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
