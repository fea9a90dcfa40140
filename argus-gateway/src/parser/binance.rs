use argus_core::prelude::{DataType, OrderBook, Side, Ticker, Trade, Venue};

use super::{decimal_value, ensure_ascending, ensure_descending, parse_level_array, required_timestamp, utf8_field};
use crate::errors::GatewayError;
use crate::scan::{tag_hash, Scan};

const EVENT_TRADE: u32 = tag_hash(b"trade");
const EVENT_TICKER_24H: u32 = tag_hash(b"24hrTicker");
const EVENT_DEPTH_UPDATE: u32 = tag_hash(b"depthUpdate");

/// Binance spot stream parser. Events are classified by the `"e"` field;
/// frames without it (subscribe acks, errors) are not market data.
pub struct BinanceParser;

impl BinanceParser {
    pub fn classify(buf: &[u8]) -> DataType {
        match Scan::new(buf).hash_field("e") {
            Some(h) if h == EVENT_TRADE => DataType::Trade,
            Some(h) if h == EVENT_TICKER_24H => DataType::Ticker,
            Some(h) if h == EVENT_DEPTH_UPDATE => DataType::OrderBook,
            _ => DataType::Unknown,
        }
    }

    pub fn parse_trade(buf: &[u8], gateway_timestamp: u64) -> Result<Trade, GatewayError> {
        let mut scan = Scan::new(buf);
        let timestamp = required_timestamp(scan.int_field("E"), "E")?;
        let symbol = utf8_field(scan.str_field("s").ok_or_else(|| GatewayError::missing_field("s"))?, "s")?;
        let trade_id = utf8_field(scan.text_field("t").ok_or_else(|| GatewayError::missing_field("t"))?, "t")?;
        let price = decimal_value(scan.text_field("p").ok_or_else(|| GatewayError::missing_field("p"))?, "p")?;
        let quantity = decimal_value(scan.text_field("q").ok_or_else(|| GatewayError::missing_field("q"))?, "q")?;
        // `m` flags the buyer as maker, so the aggressor was the seller.
        let side = match scan.bool_field("m") {
            Some(true) => Side::Sell,
            Some(false) => Side::Buy,
            None => Side::Unknown,
        };
        Ok(Trade {
            venue: Venue::Binance,
            symbol: symbol.to_string(),
            timestamp,
            gateway_timestamp,
            trade_id: trade_id.to_string(),
            price,
            quantity,
            side,
        })
    }

    pub fn parse_ticker(buf: &[u8], gateway_timestamp: u64) -> Result<Ticker, GatewayError> {
        let mut scan = Scan::new(buf);
        let timestamp = required_timestamp(scan.int_field("E"), "E")?;
        let symbol = utf8_field(scan.str_field("s").ok_or_else(|| GatewayError::missing_field("s"))?, "s")?;
        let last_price = decimal_value(scan.text_field("c").ok_or_else(|| GatewayError::missing_field("c"))?, "c")?;
        let bid_price = decimal_value(scan.text_field("b").ok_or_else(|| GatewayError::missing_field("b"))?, "b")?;
        let ask_price = decimal_value(scan.text_field("a").ok_or_else(|| GatewayError::missing_field("a"))?, "a")?;
        let volume_24h = match scan.text_field("v") {
            Some(raw) => Some(decimal_value(raw, "v")?),
            None => None,
        };
        Ok(Ticker {
            venue: Venue::Binance,
            symbol: symbol.to_string(),
            timestamp,
            gateway_timestamp,
            last_price,
            bid_price,
            ask_price,
            volume_24h,
        })
    }

    /// Depth-diff stream. Binance only ships diffs over the socket; the
    /// REST bootstrap snapshot is the embedding application's concern, so
    /// every book here is `is_snapshot = false`.
    pub fn parse_order_book(buf: &[u8], gateway_timestamp: u64) -> Result<OrderBook, GatewayError> {
        let mut scan = Scan::new(buf);
        let timestamp = required_timestamp(scan.int_field("E"), "E")?;
        let symbol = utf8_field(scan.str_field("s").ok_or_else(|| GatewayError::missing_field("s"))?, "s")?;
        let raw_bids = scan.array_field("b").ok_or_else(|| GatewayError::missing_field("b"))?;
        let raw_asks = scan.array_field("a").ok_or_else(|| GatewayError::missing_field("a"))?;
        let mut bids = parse_level_array(raw_bids, "b")?;
        let mut asks = parse_level_array(raw_asks, "a")?;
        ensure_descending(&mut bids);
        ensure_ascending(&mut asks);
        Ok(OrderBook {
            venue: Venue::Binance,
            symbol: symbol.to_string(),
            timestamp,
            gateway_timestamp,
            bids,
            asks,
            is_snapshot: false,
        })
    }

    pub fn subscription_error(buf: &[u8]) -> Option<String> {
        let mut scan = Scan::new(buf);
        scan.str_field("msg")
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .map(|msg| msg.to_string())
    }
}
