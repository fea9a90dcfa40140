//! Canonical JSON re-emit.
//!
//! Field order is the declaration order of the domain structs: `exchange,
//! symbol, timestamp, gatewayTimestamp`, then the type-specific fields.
//! Decimals serialize as JSON strings to preserve the venue's exact
//! representation; timestamps as numbers. Output is strict JSON and
//! byte-identical across invocations for the same input.

use argus_core::prelude::{MarketEvent, OrderBook, Ticker, Trade};

use crate::errors::GatewayError;

pub fn encode(event: &MarketEvent) -> Result<String, GatewayError> {
    match event {
        MarketEvent::Ticker(t) => encode_record(t),
        MarketEvent::Trade(t) => encode_record(t),
        MarketEvent::OrderBook(b) => encode_record(b),
    }
}

fn encode_record<T: serde::Serialize>(record: &T) -> Result<String, GatewayError> {
    serde_json::to_string(record).map_err(|e| GatewayError::MalformedFrame(format!("json encode: {e}")))
}

pub fn decode_ticker(json: &str) -> Result<Ticker, GatewayError> {
    serde_json::from_str(json).map_err(|e| GatewayError::MalformedFrame(format!("json decode: {e}")))
}

pub fn decode_trade(json: &str) -> Result<Trade, GatewayError> {
    serde_json::from_str(json).map_err(|e| GatewayError::MalformedFrame(format!("json decode: {e}")))
}

pub fn decode_order_book(json: &str) -> Result<OrderBook, GatewayError> {
    serde_json::from_str(json).map_err(|e| GatewayError::MalformedFrame(format!("json decode: {e}")))
}
