mod binance;
mod bybit;
mod okx;

pub use binance::BinanceParser;
pub use bybit::BybitParser;
pub use okx::OkxParser;

use argus_core::prelude::{DataType, MarketEvent, OrderBookLevel, Venue};
use rust_decimal::Decimal;

use crate::errors::GatewayError;
use crate::scan::array_elements;

/// Classify a raw frame. Never fails; anything that is not a recognized
/// market-data event (acks, pings, errors) is `Unknown`.
pub fn classify(venue: Venue, buf: &[u8]) -> DataType {
    match venue {
        Venue::Binance => BinanceParser::classify(buf),
        Venue::Okx => OkxParser::classify(buf),
        Venue::Bybit => BybitParser::classify(buf),
    }
}

/// Extract the typed event for a frame `classify` already matched.
pub fn parse_event(
    venue: Venue,
    data_type: DataType,
    buf: &[u8],
    gateway_timestamp: u64,
) -> Result<MarketEvent, GatewayError> {
    match data_type {
        DataType::Ticker => match venue {
            Venue::Binance => BinanceParser::parse_ticker(buf, gateway_timestamp).map(MarketEvent::Ticker),
            Venue::Okx => OkxParser::parse_ticker(buf, gateway_timestamp).map(MarketEvent::Ticker),
            Venue::Bybit => BybitParser::parse_ticker(buf, gateway_timestamp).map(MarketEvent::Ticker),
        },
        DataType::Trade => match venue {
            Venue::Binance => BinanceParser::parse_trade(buf, gateway_timestamp).map(MarketEvent::Trade),
            Venue::Okx => OkxParser::parse_trade(buf, gateway_timestamp).map(MarketEvent::Trade),
            Venue::Bybit => BybitParser::parse_trade(buf, gateway_timestamp).map(MarketEvent::Trade),
        },
        DataType::OrderBook => match venue {
            Venue::Binance => BinanceParser::parse_order_book(buf, gateway_timestamp).map(MarketEvent::OrderBook),
            Venue::Okx => OkxParser::parse_order_book(buf, gateway_timestamp).map(MarketEvent::OrderBook),
            Venue::Bybit => BybitParser::parse_order_book(buf, gateway_timestamp).map(MarketEvent::OrderBook),
        },
        DataType::Unknown => Err(GatewayError::MalformedFrame("unclassified frame".to_string())),
    }
}

/// Venue-specific detection of an explicit subscribe rejection. Only
/// consulted for frames `classify` marked `Unknown`, off the hot path.
pub fn subscription_error(venue: Venue, buf: &[u8]) -> Option<String> {
    match venue {
        Venue::Binance => BinanceParser::subscription_error(buf),
        Venue::Okx => OkxParser::subscription_error(buf),
        Venue::Bybit => BybitParser::subscription_error(buf),
    }
}

pub(crate) fn utf8_field<'a>(raw: &'a [u8], field: &'static str) -> Result<&'a str, GatewayError> {
    std::str::from_utf8(raw).map_err(|_| GatewayError::invalid_field(field))
}

/// Venue event times are epoch milliseconds and must be present.
pub(crate) fn required_timestamp(value: Option<i64>, field: &'static str) -> Result<u64, GatewayError> {
    let raw = value.ok_or_else(|| GatewayError::missing_field(field))?;
    u64::try_from(raw).map_err(|_| GatewayError::invalid_field(field))
}

pub(crate) fn decimal_value(raw: &[u8], field: &'static str) -> Result<Decimal, GatewayError> {
    let text = utf8_field(raw, field)?;
    Decimal::from_str_exact(text).map_err(|_| GatewayError::invalid_field(field))
}

/// Strip the surrounding quotes off a scalar array element.
pub(crate) fn unquote(raw: &[u8]) -> &[u8] {
    if raw.len() >= 2 && raw[0] == b'"' && raw[raw.len() - 1] == b'"' {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// Parse a level array of `[price, quantity, ...]` string tuples. Extra
/// per-level entries (OKX ships four) are ignored.
pub(crate) fn parse_level_array(raw: &[u8], field: &'static str) -> Result<Vec<OrderBookLevel>, GatewayError> {
    let mut levels = Vec::new();
    for element in array_elements(raw) {
        let mut parts = array_elements(element);
        let price = parts.next().ok_or_else(|| GatewayError::invalid_field(field))?;
        let quantity = parts.next().ok_or_else(|| GatewayError::invalid_field(field))?;
        levels.push(OrderBookLevel::new(
            decimal_value(unquote(price), field)?,
            decimal_value(unquote(quantity), field)?,
        ));
    }
    Ok(levels)
}

/// Bids must leave the parser descending by price. Venues already emit
/// this order; the adjacency check keeps the common case to one compare
/// per level and only sorts when the order was actually violated.
pub(crate) fn ensure_descending(levels: &mut [OrderBookLevel]) {
    if levels.windows(2).any(|w| w[0].price < w[1].price) {
        levels.sort_by(|a, b| b.price.cmp(&a.price));
    }
}

/// Asks must leave the parser ascending by price.
pub(crate) fn ensure_ascending(levels: &mut [OrderBookLevel]) {
    if levels.windows(2).any(|w| w[0].price > w[1].price) {
        levels.sort_by(|a, b| a.price.cmp(&b.price));
    }
}
