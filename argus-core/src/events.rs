use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::venue::Venue;

/// Message classes emitted by the gateway.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Ticker,
    Trade,
    OrderBook,
    Unknown,
}

impl DataType {
    pub const COUNT: usize = 4;

    /// Stable index for per-type counter arrays.
    pub fn index(self) -> usize {
        match self {
            DataType::Ticker => 0,
            DataType::Trade => 1,
            DataType::OrderBook => 2,
            DataType::Unknown => 3,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Ticker => write!(f, "ticker"),
            DataType::Trade => write!(f, "trade"),
            DataType::OrderBook => write!(f, "order_book"),
            DataType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Aggressor side of a trade.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
    Unknown,
}

impl Side {
    /// Case-insensitive parse of the textual forms venues send,
    /// including one-letter shorthands. Unrecognized input maps to
    /// `Unknown`, never to an error.
    pub fn parse(s: &str) -> Side {
        if s.eq_ignore_ascii_case("buy") || s.eq_ignore_ascii_case("b") || s.eq_ignore_ascii_case("buyer") {
            Side::Buy
        } else if s.eq_ignore_ascii_case("sell") || s.eq_ignore_ascii_case("s") || s.eq_ignore_ascii_case("seller") {
            Side::Sell
        } else {
            Side::Unknown
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
            Side::Unknown => write!(f, "unknown"),
        }
    }
}

/// Periodic pair summary: last price, best bid/ask, rolling volume.
///
/// `bid_price <= ask_price` is deliberately not enforced; venues emit
/// crossed quotes during fast markets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    #[serde(rename = "exchange")]
    pub venue: Venue,
    pub symbol: String,
    pub timestamp: u64,
    #[serde(rename = "gatewayTimestamp")]
    pub gateway_timestamp: u64,
    #[serde(rename = "lastPrice")]
    pub last_price: Decimal,
    #[serde(rename = "bidPrice")]
    pub bid_price: Decimal,
    #[serde(rename = "askPrice")]
    pub ask_price: Decimal,
    /// Absent when the venue did not report volume; distinct from zero.
    #[serde(rename = "volume24h", skip_serializing_if = "Option::is_none", default)]
    pub volume_24h: Option<Decimal>,
}

/// A single match print.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "exchange")]
    pub venue: Venue,
    pub symbol: String,
    pub timestamp: u64,
    #[serde(rename = "gatewayTimestamp")]
    pub gateway_timestamp: u64,
    /// Venue trade id kept verbatim as text; venues mix string and
    /// integer forms.
    #[serde(rename = "tradeId")]
    pub trade_id: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
}

/// One price level. Zero quantity signals removal in diff updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl OrderBookLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

/// Book snapshot or diff. Bids descending, asks ascending by price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(rename = "exchange")]
    pub venue: Venue,
    pub symbol: String,
    pub timestamp: u64,
    #[serde(rename = "gatewayTimestamp")]
    pub gateway_timestamp: u64,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    #[serde(rename = "isSnapshot")]
    pub is_snapshot: bool,
}

/// Unified event union handed to sinks.
#[derive(Clone, Debug, PartialEq)]
pub enum MarketEvent {
    Ticker(Ticker),
    Trade(Trade),
    OrderBook(OrderBook),
}

impl MarketEvent {
    pub fn venue(&self) -> Venue {
        match self {
            MarketEvent::Ticker(t) => t.venue,
            MarketEvent::Trade(t) => t.venue,
            MarketEvent::OrderBook(b) => b.venue,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            MarketEvent::Ticker(t) => &t.symbol,
            MarketEvent::Trade(t) => &t.symbol,
            MarketEvent::OrderBook(b) => &b.symbol,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            MarketEvent::Ticker(t) => t.timestamp,
            MarketEvent::Trade(t) => t.timestamp,
            MarketEvent::OrderBook(b) => b.timestamp,
        }
    }

    pub fn gateway_timestamp(&self) -> u64 {
        match self {
            MarketEvent::Ticker(t) => t.gateway_timestamp,
            MarketEvent::Trade(t) => t.gateway_timestamp,
            MarketEvent::OrderBook(b) => b.gateway_timestamp,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            MarketEvent::Ticker(_) => DataType::Ticker,
            MarketEvent::Trade(_) => DataType::Trade,
            MarketEvent::OrderBook(_) => DataType::OrderBook,
        }
    }
}
