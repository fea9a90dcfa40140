use argus_core::prelude::{DataType, OrderBook, Side, Ticker, Trade, Venue};

use super::{decimal_value, ensure_ascending, ensure_descending, parse_level_array, required_timestamp, utf8_field};
use crate::errors::GatewayError;
use crate::scan::Scan;

/// Bybit v5 spot stream parser. The message class is the `"topic"` prefix:
/// `tickers.`, `publicTrade.`, `orderbook.{depth}.`.
pub struct BybitParser;

impl BybitParser {
    pub fn classify(buf: &[u8]) -> DataType {
        let Some(topic) = Scan::new(buf).str_field("topic") else {
            return DataType::Unknown;
        };
        if topic.starts_with(b"tickers.") {
            DataType::Ticker
        } else if topic.starts_with(b"publicTrade.") {
            DataType::Trade
        } else if topic.starts_with(b"orderbook.") {
            DataType::OrderBook
        } else {
            DataType::Unknown
        }
    }

    pub fn parse_trade(buf: &[u8], gateway_timestamp: u64) -> Result<Trade, GatewayError> {
        let mut scan = Scan::new(buf);
        let trade_id = utf8_field(scan.text_field("i").ok_or_else(|| GatewayError::missing_field("i"))?, "i")?.to_string();
        let timestamp = required_timestamp(scan.int_field("T"), "T")?;
        let price = decimal_value(scan.text_field("p").ok_or_else(|| GatewayError::missing_field("p"))?, "p")?;
        let quantity = decimal_value(scan.text_field("v").ok_or_else(|| GatewayError::missing_field("v"))?, "v")?;
        let side = match scan.str_field("S") {
            Some(raw) => Side::parse(utf8_field(raw, "S")?),
            None => Side::Unknown,
        };
        let symbol = utf8_field(scan.str_field("s").ok_or_else(|| GatewayError::missing_field("s"))?, "s")?;
        Ok(Trade {
            venue: Venue::Bybit,
            symbol: symbol.to_string(),
            timestamp,
            gateway_timestamp,
            trade_id,
            price,
            quantity,
            side,
        })
    }

    pub fn parse_ticker(buf: &[u8], gateway_timestamp: u64) -> Result<Ticker, GatewayError> {
        let mut scan = Scan::new(buf);
        let timestamp = required_timestamp(scan.int_field("ts"), "ts")?;
        let symbol = utf8_field(scan.str_field("symbol").ok_or_else(|| GatewayError::missing_field("symbol"))?, "symbol")?;
        let last_price = decimal_value(
            scan.text_field("lastPrice").ok_or_else(|| GatewayError::missing_field("lastPrice"))?,
            "lastPrice",
        )?;
        let volume_24h = match scan.text_field("volume24h") {
            Some(raw) => Some(decimal_value(raw, "volume24h")?),
            None => None,
        };
        let bid_price = decimal_value(
            scan.text_field("bid1Price").ok_or_else(|| GatewayError::missing_field("bid1Price"))?,
            "bid1Price",
        )?;
        let ask_price = decimal_value(
            scan.text_field("ask1Price").ok_or_else(|| GatewayError::missing_field("ask1Price"))?,
            "ask1Price",
        )?;
        Ok(Ticker {
            venue: Venue::Bybit,
            symbol: symbol.to_string(),
            timestamp,
            gateway_timestamp,
            last_price,
            bid_price,
            ask_price,
            volume_24h,
        })
    }

    pub fn parse_order_book(buf: &[u8], gateway_timestamp: u64) -> Result<OrderBook, GatewayError> {
        let mut scan = Scan::new(buf);
        let kind = scan.str_field("type").ok_or_else(|| GatewayError::missing_field("type"))?;
        let is_snapshot = kind == b"snapshot";
        let timestamp = required_timestamp(scan.int_field("ts"), "ts")?;
        let symbol = utf8_field(scan.str_field("s").ok_or_else(|| GatewayError::missing_field("s"))?, "s")?;
        let raw_bids = scan.array_field("b").ok_or_else(|| GatewayError::missing_field("b"))?;
        let raw_asks = scan.array_field("a").ok_or_else(|| GatewayError::missing_field("a"))?;
        let mut bids = parse_level_array(raw_bids, "b")?;
        let mut asks = parse_level_array(raw_asks, "a")?;
        ensure_descending(&mut bids);
        ensure_ascending(&mut asks);
        Ok(OrderBook {
            venue: Venue::Bybit,
            symbol: symbol.to_string(),
            timestamp,
            gateway_timestamp,
            bids,
            asks,
            is_snapshot,
        })
    }

    pub fn subscription_error(buf: &[u8]) -> Option<String> {
        let mut scan = Scan::new(buf);
        if scan.bool_field("success")? {
            return None;
        }
        let msg = scan
            .str_field("ret_msg")
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .unwrap_or("subscribe error");
        Some(msg.to_string())
    }
}
