use argus_core::prelude::{DataType, OrderBook, Side, Ticker, Trade, Venue};

use super::{decimal_value, ensure_ascending, ensure_descending, parse_level_array, required_timestamp, utf8_field};
use crate::errors::GatewayError;
use crate::scan::{tag_hash, Scan};

const CHANNEL_TICKERS: u32 = tag_hash(b"tickers");
const CHANNEL_TRADES: u32 = tag_hash(b"trades");
const CHANNEL_BOOKS: u32 = tag_hash(b"books");
const EVENT_ERROR: u32 = tag_hash(b"error");

/// OKX public stream parser. Push frames are `{"arg":{"channel":..,
/// "instId":..},"data":[{..}]}`; subscribe acks carry `"event"` and no
/// `"data"`. Instrument ids (`BTC-USDT`) are normalized back to canonical
/// form on emit.
pub struct OkxParser;

impl OkxParser {
    pub fn classify(buf: &[u8]) -> DataType {
        let mut scan = Scan::new(buf);
        let Some(channel) = scan.hash_field("channel") else {
            return DataType::Unknown;
        };
        if scan.array_field("data").is_none() {
            return DataType::Unknown;
        }
        match channel {
            h if h == CHANNEL_TICKERS => DataType::Ticker,
            h if h == CHANNEL_TRADES => DataType::Trade,
            h if h == CHANNEL_BOOKS => DataType::OrderBook,
            _ => DataType::Unknown,
        }
    }

    pub fn parse_trade(buf: &[u8], gateway_timestamp: u64) -> Result<Trade, GatewayError> {
        let mut scan = Scan::new(buf);
        let symbol = canonical_symbol(&mut scan)?;
        let trade_id =
            utf8_field(scan.text_field("tradeId").ok_or_else(|| GatewayError::missing_field("tradeId"))?, "tradeId")?
                .to_string();
        let price = decimal_value(scan.text_field("px").ok_or_else(|| GatewayError::missing_field("px"))?, "px")?;
        let quantity = decimal_value(scan.text_field("sz").ok_or_else(|| GatewayError::missing_field("sz"))?, "sz")?;
        let side = match scan.str_field("side") {
            Some(raw) => Side::parse(utf8_field(raw, "side")?),
            None => Side::Unknown,
        };
        let timestamp = required_timestamp(scan.int_field("ts"), "ts")?;
        Ok(Trade {
            venue: Venue::Okx,
            symbol,
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
        let symbol = canonical_symbol(&mut scan)?;
        let last_price =
            decimal_value(scan.text_field("last").ok_or_else(|| GatewayError::missing_field("last"))?, "last")?;
        // Live frames put askPx ahead of bidPx; the scanner's rescan rule
        // covers feeds that do it the other way round.
        let ask_price =
            decimal_value(scan.text_field("askPx").ok_or_else(|| GatewayError::missing_field("askPx"))?, "askPx")?;
        let bid_price =
            decimal_value(scan.text_field("bidPx").ok_or_else(|| GatewayError::missing_field("bidPx"))?, "bidPx")?;
        let volume_24h = match scan.text_field("vol24h") {
            Some(raw) => Some(decimal_value(raw, "vol24h")?),
            None => None,
        };
        let timestamp = required_timestamp(scan.int_field("ts"), "ts")?;
        Ok(Ticker {
            venue: Venue::Okx,
            symbol,
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
        let symbol = canonical_symbol(&mut scan)?;
        let action = scan.str_field("action").ok_or_else(|| GatewayError::missing_field("action"))?;
        let is_snapshot = action == b"snapshot";
        let raw_asks = scan.array_field("asks").ok_or_else(|| GatewayError::missing_field("asks"))?;
        let raw_bids = scan.array_field("bids").ok_or_else(|| GatewayError::missing_field("bids"))?;
        let mut asks = parse_level_array(raw_asks, "asks")?;
        let mut bids = parse_level_array(raw_bids, "bids")?;
        ensure_ascending(&mut asks);
        ensure_descending(&mut bids);
        let timestamp = required_timestamp(scan.int_field("ts"), "ts")?;
        Ok(OrderBook {
            venue: Venue::Okx,
            symbol,
            timestamp,
            gateway_timestamp,
            bids,
            asks,
            is_snapshot,
        })
    }

    pub fn subscription_error(buf: &[u8]) -> Option<String> {
        let mut scan = Scan::new(buf);
        if scan.hash_field("event")? != EVENT_ERROR {
            return None;
        }
        let msg = scan
            .str_field("msg")
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .unwrap_or("subscribe error");
        Some(msg.to_string())
    }
}

fn canonical_symbol(scan: &mut Scan<'_>) -> Result<String, GatewayError> {
    let inst_id = scan.str_field("instId").ok_or_else(|| GatewayError::missing_field("instId"))?;
    Ok(Venue::Okx.canonical_symbol(utf8_field(inst_id, "instId")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_classify() {
        let ticker = br#"{"arg":{"channel":"tickers","instId":"BTC-USDT"},"data":[{"last":"1"}]}"#;
        assert_eq!(OkxParser::classify(ticker), DataType::Ticker);

        let trade = br#"{"arg":{"channel":"trades","instId":"BTC-USDT"},"data":[{"px":"1"}]}"#;
        assert_eq!(OkxParser::classify(trade), DataType::Trade);

        let book = br#"{"arg":{"channel":"books","instId":"BTC-USDT"},"action":"update","data":[{}]}"#;
        assert_eq!(OkxParser::classify(book), DataType::OrderBook);
    }

    #[test]
    fn test_classify_subscribe_ack_is_unknown() {
        // Acks carry "event" and no "data".
        let ack = br#"{"event":"subscribe","arg":{"channel":"tickers","instId":"BTC-USDT"},"connId":"a4d3ae55"}"#;
        assert_eq!(OkxParser::classify(ack), DataType::Unknown);

        let error = br#"{"event":"error","code":"60012","msg":"Invalid request","connId":"a4d3ae55"}"#;
        assert_eq!(OkxParser::classify(error), DataType::Unknown);
    }

    #[test]
    fn test_classify_unrelated_channel_is_unknown() {
        let frame = br#"{"arg":{"channel":"books5","instId":"BTC-USDT"},"data":[{}]}"#;
        assert_eq!(OkxParser::classify(frame), DataType::Unknown);
    }

    #[test]
    fn test_parse_ticker_normalizes_symbol() {
        let json = br#"{"arg":{"channel":"tickers","instId":"BTC-USDT"},"data":[{"last":"50000.1","bidPx":"49999.9","askPx":"50000.2","ts":"1700000000000"}]}"#;
        let ticker = OkxParser::parse_ticker(json, 11).unwrap();
        assert_eq!(ticker.venue, Venue::Okx);
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(ticker.timestamp, 1700000000000);
        assert_eq!(ticker.gateway_timestamp, 11);
        assert_eq!(ticker.last_price, dec("50000.1"));
        assert_eq!(ticker.bid_price, dec("49999.9"));
        assert_eq!(ticker.ask_price, dec("50000.2"));
        assert_eq!(ticker.volume_24h, None);
    }

    #[test]
    fn test_parse_ticker_live_field_order() {
        let json = br#"{"arg":{"channel":"tickers","instId":"BTC-USDT"},"data":[{"instType":"SPOT","instId":"BTC-USDT","last":"115450","lastSz":"0.01299737","askPx":"115450.1","askSz":"2.57408132","bidPx":"115450","bidSz":"1.62542563","open24h":"113625.5","high24h":"116400","low24h":"112900","volCcy24h":"887468830.390342052","vol24h":"7715.62528481","ts":"1761583471970"}]}"#;
        let ticker = OkxParser::parse_ticker(json, 0).unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(ticker.bid_price, dec("115450"));
        assert_eq!(ticker.ask_price, dec("115450.1"));
        assert_eq!(ticker.volume_24h, Some(dec("7715.62528481")));
        assert_eq!(ticker.timestamp, 1761583471970);
    }

    #[test]
    fn test_parse_trade() {
        let json = br#"{"arg":{"channel":"trades","instId":"BTC-USDT"},"data":[{"instId":"BTC-USDT","tradeId":"835232870","px":"115451.2","sz":"0.0000305","side":"sell","ts":"1761583471606"}]}"#;
        let trade = OkxParser::parse_trade(json, 0).unwrap();
        assert_eq!(trade.symbol, "BTCUSDT");
        assert_eq!(trade.trade_id, "835232870");
        assert_eq!(trade.price, dec("115451.2"));
        assert_eq!(trade.quantity, dec("0.0000305"));
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.timestamp, 1761583471606);
    }

    #[test]
    fn test_parse_trade_missing_price_is_malformed() {
        let json = br#"{"arg":{"channel":"trades","instId":"BTC-USDT"},"data":[{"tradeId":"1","ts":"1"}]}"#;
        assert!(matches!(
            OkxParser::parse_trade(json, 0),
            Err(GatewayError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_parse_order_book_snapshot() {
        let json = br#"{"arg":{"channel":"books","instId":"BTC-USDT"},"action":"snapshot","data":[{"asks":[["8476.98","415","0","13"],["8477.00","7","0","2"]],"bids":[["8476.97","256","0","12"],["8475.55","101","0","1"]],"ts":"1597026383085","checksum":-855196043}]}"#;
        let book = OkxParser::parse_order_book(json, 0).unwrap();
        assert!(book.is_snapshot);
        assert_eq!(book.symbol, "BTCUSDT");
        assert_eq!(book.asks[0].price, dec("8476.98"));
        assert_eq!(book.asks[1].price, dec("8477.00"));
        assert_eq!(book.bids[0].price, dec("8476.97"));
        assert_eq!(book.bids[1].price, dec("8475.55"));
        assert_eq!(book.timestamp, 1597026383085);
    }

    #[test]
    fn test_parse_order_book_update() {
        let json = br#"{"arg":{"channel":"books","instId":"BTC-USDT"},"action":"update","data":[{"asks":[["8477.98","0","0","0"]],"bids":[],"ts":"1597026383086"}]}"#;
        let book = OkxParser::parse_order_book(json, 0).unwrap();
        assert!(!book.is_snapshot);
        assert_eq!(book.asks[0].quantity, Decimal::ZERO);
        assert!(book.bids.is_empty());
    }

    #[test]
    fn test_subscription_error_detection() {
        let error = br#"{"event":"error","code":"60012","msg":"Invalid request","connId":"a4d3ae55"}"#;
        assert_eq!(OkxParser::subscription_error(error), Some("Invalid request".to_string()));

        let ack = br#"{"event":"subscribe","arg":{"channel":"tickers","instId":"BTC-USDT"}}"#;
        assert_eq!(OkxParser::subscription_error(ack), None);
    }
}
