use std::time::Duration;

use argus_core::prelude::{DataType, Venue};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub connectors: Vec<ConnectorConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    pub venue: Venue,
    /// Override for the venue's default public stream endpoint.
    #[serde(default)]
    pub ws_url: Option<String>,
    /// Canonical symbols (`BTCUSDT`) to subscribe on connect.
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub channels: Vec<DataType>,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl ConnectorConfig {
    pub fn new(venue: Venue) -> Self {
        Self {
            venue,
            ws_url: None,
            symbols: Vec::new(),
            channels: Vec::new(),
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn url(&self) -> String {
        self.ws_url
            .clone()
            .unwrap_or_else(|| self.venue.default_ws_url().to_string())
    }

    /// Fail-fast endpoint validation for startup wiring.
    pub fn parsed_url(&self) -> Result<url::Url, url::ParseError> {
        url::Url::parse(&self.url())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub connect_timeout_secs: u64,
    pub ping_interval_secs: u64,
}

impl ReconnectConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            connect_timeout_secs: 10,
            ping_interval_secs: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectorConfig::new(Venue::Binance);
        assert_eq!(config.url(), "wss://stream.binance.com:9443/ws");
        assert_eq!(config.reconnect.max_retries, 10);
        assert_eq!(config.reconnect.base_backoff(), Duration::from_secs(1));
        assert_eq!(config.reconnect.max_backoff(), Duration::from_secs(30));
        assert_eq!(config.reconnect.connect_timeout(), Duration::from_secs(10));
        assert!(config.parsed_url().is_ok());
    }

    #[test]
    fn test_deserialization_with_partial_overrides() {
        let value = serde_json::json!({
            "connectors": [
                {
                    "venue": "okx",
                    "symbols": ["BTCUSDT", "ETHUSDT"],
                    "channels": ["trade", "order_book"],
                    "reconnect": { "max_retries": 3, "base_backoff_ms": 50 }
                },
                { "venue": "bybit", "ws_url": "ws://127.0.0.1:9000/ws" }
            ]
        });
        let config: GatewayConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.connectors.len(), 2);
        assert_eq!(config.connectors[0].venue, Venue::Okx);
        assert_eq!(config.connectors[0].channels, vec![DataType::Trade, DataType::OrderBook]);
        assert_eq!(config.connectors[0].reconnect.max_retries, 3);
        // Unset reconnect fields fall back to defaults.
        assert_eq!(config.connectors[0].reconnect.max_backoff_ms, 30_000);
        assert_eq!(config.connectors[1].url(), "ws://127.0.0.1:9000/ws");
        assert!(config.connectors[1].symbols.is_empty());
    }
}
