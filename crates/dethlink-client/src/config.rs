//! Gateway connection configuration

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

fn default_port() -> u16 {
    dethlink_core::DEFAULT_GATEWAY_PORT
}

fn default_reconnect() -> bool {
    true
}

fn default_reconnect_interval_ms() -> u64 {
    5_000
}

fn default_appinfo_interval_secs() -> u64 {
    3_600
}

fn default_stale_timeout_secs() -> u64 {
    90
}

/// Connection settings for one gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host name or IP address
    pub address: String,
    /// Gateway TCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reconnect automatically after unexpected disconnects
    #[serde(default = "default_reconnect")]
    pub reconnect: bool,
    /// Delay between reconnect attempts
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    /// Interval between full description refreshes
    #[serde(default = "default_appinfo_interval_secs")]
    pub appinfo_interval_secs: u64,
    /// Inbound silence before the session is considered stale
    #[serde(default = "default_stale_timeout_secs")]
    pub stale_timeout_secs: u64,
}

impl GatewayConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: default_port(),
            reconnect: default_reconnect(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            appinfo_interval_secs: default_appinfo_interval_secs(),
            stale_timeout_secs: default_stale_timeout_secs(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ClientError::InvalidConfig("address must be set".into()));
        }
        if self.port == 0 {
            return Err(ClientError::InvalidConfig("port must be non-zero".into()));
        }
        if self.reconnect && self.reconnect_interval_ms < 100 {
            return Err(ClientError::InvalidConfig(
                "reconnect interval below 100 ms".into(),
            ));
        }
        if self.stale_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "stale timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// `host:port` endpoint string
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::new("192.168.1.10");
        assert_eq!(config.port, 17481);
        assert!(config.reconnect);
        assert_eq!(config.stale_timeout_secs, 90);
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(), "192.168.1.10:17481");
    }

    #[test]
    fn test_validation() {
        let mut config = GatewayConfig::new("");
        assert!(config.validate().is_err());

        config.address = "10.0.0.1".into();
        config.port = 0;
        assert!(config.validate().is_err());

        config.port = 17481;
        config.reconnect_interval_ms = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let config: GatewayConfig = serde_json::from_str(r#"{"address":"10.0.0.2"}"#).unwrap();
        assert_eq!(config.port, 17481);
        assert_eq!(config.appinfo_interval_secs, 3_600);
    }
}
