use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Quote currencies OKX splits instrument ids on, tried longest-first.
const OKX_QUOTES: [&str; 5] = ["USDT", "USDC", "BTC", "ETH", "USD"];

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Binance,
    Okx,
    Bybit,
}

impl Venue {
    pub const ALL: [Venue; 3] = [Venue::Binance, Venue::Okx, Venue::Bybit];

    pub fn default_ws_url(&self) -> &'static str {
        match self {
            Venue::Binance => "wss://stream.binance.com:9443/ws",
            Venue::Okx => "wss://ws.okx.com:8443/ws/v5/public",
            Venue::Bybit => "wss://stream.bybit.com/v5/public/spot",
        }
    }

    /// Translate a canonical pair (`BTCUSDT`) into the venue's wire form.
    pub fn venue_symbol(&self, canonical: &str) -> String {
        match self {
            Venue::Binance => canonical.to_lowercase(),
            Venue::Okx => {
                for quote in OKX_QUOTES {
                    if let Some(base) = canonical.strip_suffix(quote) {
                        if !base.is_empty() {
                            return format!("{base}-{quote}");
                        }
                    }
                }
                canonical.to_string()
            }
            Venue::Bybit => canonical.to_string(),
        }
    }

    /// Translate a venue wire symbol back to canonical form.
    pub fn canonical_symbol(&self, wire: &str) -> String {
        match self {
            Venue::Binance => wire.to_uppercase(),
            Venue::Okx => wire.replace('-', ""),
            Venue::Bybit => wire.to_string(),
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::Binance => write!(f, "binance"),
            Venue::Okx => write!(f, "okx"),
            Venue::Bybit => write!(f, "bybit"),
        }
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binance" => Ok(Venue::Binance),
            "okx" => Ok(Venue::Okx),
            "bybit" => Ok(Venue::Bybit),
            other => Err(format!("unknown venue: {other}")),
        }
    }
}
