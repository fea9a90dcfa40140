//! Fixed-layout little-endian binary encoding.
//!
//! Every message starts with an 8-byte header
//! `{block_length: u16, template_id: u16, schema_id: u16, version: u16}`
//! followed by the fixed-layout block, then the variable-length tail
//! (u16 length prefix + raw bytes per field). Decimals travel as
//! `(mantissa: i64, exponent: u8)`; book levels as u16 count + 18-byte
//! records. Same input always produces byte-identical output.

use argus_core::prelude::{MarketEvent, OrderBook, OrderBookLevel, Side, Ticker, Trade, Venue};
use rust_decimal::Decimal;

use crate::errors::GatewayError;

pub const SCHEMA_ID: u16 = 1;
pub const SCHEMA_VERSION: u16 = 0;

pub const TEMPLATE_TICKER: u16 = 1;
pub const TEMPLATE_TRADE: u16 = 2;
pub const TEMPLATE_ORDER_BOOK: u16 = 3;

/// Fixed-layout byte sizes, excluding the variable-length tails.
pub const TICKER_BLOCK_LENGTH: u16 = 53;
pub const TRADE_BLOCK_LENGTH: u16 = 36;
pub const ORDER_BOOK_BLOCK_LENGTH: u16 = 18;

/// Exponent sentinel for an absent optional decimal. Real exponents
/// never exceed 28.
const EXPONENT_NULL: u8 = 0xFF;

pub fn encode(event: &MarketEvent) -> Result<Vec<u8>, GatewayError> {
    match event {
        MarketEvent::Ticker(t) => encode_ticker(t),
        MarketEvent::Trade(t) => encode_trade(t),
        MarketEvent::OrderBook(b) => encode_order_book(b),
    }
}

pub fn encode_ticker(t: &Ticker) -> Result<Vec<u8>, GatewayError> {
    let mut buf = Vec::with_capacity(8 + TICKER_BLOCK_LENGTH as usize + 2 + t.symbol.len());
    put_header(&mut buf, TICKER_BLOCK_LENGTH, TEMPLATE_TICKER);
    buf.push(venue_code(t.venue));
    buf.extend_from_slice(&t.timestamp.to_le_bytes());
    buf.extend_from_slice(&t.gateway_timestamp.to_le_bytes());
    put_decimal(&mut buf, &t.last_price)?;
    put_decimal(&mut buf, &t.bid_price)?;
    put_decimal(&mut buf, &t.ask_price)?;
    match &t.volume_24h {
        Some(v) => put_decimal(&mut buf, v)?,
        None => {
            buf.extend_from_slice(&0i64.to_le_bytes());
            buf.push(EXPONENT_NULL);
        }
    }
    put_var_bytes(&mut buf, t.symbol.as_bytes())?;
    Ok(buf)
}

pub fn encode_trade(t: &Trade) -> Result<Vec<u8>, GatewayError> {
    let mut buf = Vec::with_capacity(8 + TRADE_BLOCK_LENGTH as usize + 4 + t.symbol.len() + t.trade_id.len());
    put_header(&mut buf, TRADE_BLOCK_LENGTH, TEMPLATE_TRADE);
    buf.push(venue_code(t.venue));
    buf.extend_from_slice(&t.timestamp.to_le_bytes());
    buf.extend_from_slice(&t.gateway_timestamp.to_le_bytes());
    put_decimal(&mut buf, &t.price)?;
    put_decimal(&mut buf, &t.quantity)?;
    buf.push(side_code(t.side));
    put_var_bytes(&mut buf, t.symbol.as_bytes())?;
    put_var_bytes(&mut buf, t.trade_id.as_bytes())?;
    Ok(buf)
}

pub fn encode_order_book(b: &OrderBook) -> Result<Vec<u8>, GatewayError> {
    let levels = b.bids.len() + b.asks.len();
    let mut buf = Vec::with_capacity(8 + ORDER_BOOK_BLOCK_LENGTH as usize + 6 + b.symbol.len() + levels * 18);
    put_header(&mut buf, ORDER_BOOK_BLOCK_LENGTH, TEMPLATE_ORDER_BOOK);
    buf.push(venue_code(b.venue));
    buf.extend_from_slice(&b.timestamp.to_le_bytes());
    buf.extend_from_slice(&b.gateway_timestamp.to_le_bytes());
    buf.push(b.is_snapshot as u8);
    put_var_bytes(&mut buf, b.symbol.as_bytes())?;
    put_levels(&mut buf, &b.bids)?;
    put_levels(&mut buf, &b.asks)?;
    Ok(buf)
}

/// Decode a full message, dispatching on the header's template id.
pub fn decode(buf: &[u8]) -> Result<MarketEvent, GatewayError> {
    let mut r = Reader::new(buf);
    let block_length = r.u16()?;
    let template_id = r.u16()?;
    let schema_id = r.u16()?;
    let version = r.u16()?;
    if schema_id != SCHEMA_ID {
        return Err(GatewayError::MalformedFrame(format!("unknown schema id {schema_id}")));
    }
    if version != SCHEMA_VERSION {
        return Err(GatewayError::MalformedFrame(format!("unknown schema version {version}")));
    }
    match (template_id, block_length) {
        (TEMPLATE_TICKER, TICKER_BLOCK_LENGTH) => decode_ticker_body(&mut r).map(MarketEvent::Ticker),
        (TEMPLATE_TRADE, TRADE_BLOCK_LENGTH) => decode_trade_body(&mut r).map(MarketEvent::Trade),
        (TEMPLATE_ORDER_BOOK, ORDER_BOOK_BLOCK_LENGTH) => decode_order_book_body(&mut r).map(MarketEvent::OrderBook),
        _ => Err(GatewayError::MalformedFrame(format!(
            "unknown template {template_id} / block length {block_length}"
        ))),
    }
}

fn decode_ticker_body(r: &mut Reader<'_>) -> Result<Ticker, GatewayError> {
    let venue = venue_from_code(r.u8()?)?;
    let timestamp = r.u64()?;
    let gateway_timestamp = r.u64()?;
    let last_price = r.decimal()?;
    let bid_price = r.decimal()?;
    let ask_price = r.decimal()?;
    let volume_24h = r.optional_decimal()?;
    let symbol = r.var_string()?;
    Ok(Ticker {
        venue,
        symbol,
        timestamp,
        gateway_timestamp,
        last_price,
        bid_price,
        ask_price,
        volume_24h,
    })
}

fn decode_trade_body(r: &mut Reader<'_>) -> Result<Trade, GatewayError> {
    let venue = venue_from_code(r.u8()?)?;
    let timestamp = r.u64()?;
    let gateway_timestamp = r.u64()?;
    let price = r.decimal()?;
    let quantity = r.decimal()?;
    let side = side_from_code(r.u8()?)?;
    let symbol = r.var_string()?;
    let trade_id = r.var_string()?;
    Ok(Trade {
        venue,
        symbol,
        timestamp,
        gateway_timestamp,
        trade_id,
        price,
        quantity,
        side,
    })
}

fn decode_order_book_body(r: &mut Reader<'_>) -> Result<OrderBook, GatewayError> {
    let venue = venue_from_code(r.u8()?)?;
    let timestamp = r.u64()?;
    let gateway_timestamp = r.u64()?;
    let is_snapshot = r.u8()? != 0;
    let symbol = r.var_string()?;
    let bids = r.levels()?;
    let asks = r.levels()?;
    Ok(OrderBook {
        venue,
        symbol,
        timestamp,
        gateway_timestamp,
        bids,
        asks,
        is_snapshot,
    })
}

fn put_header(buf: &mut Vec<u8>, block_length: u16, template_id: u16) {
    buf.extend_from_slice(&block_length.to_le_bytes());
    buf.extend_from_slice(&template_id.to_le_bytes());
    buf.extend_from_slice(&SCHEMA_ID.to_le_bytes());
    buf.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
}

fn put_decimal(buf: &mut Vec<u8>, d: &Decimal) -> Result<(), GatewayError> {
    let mantissa = i64::try_from(d.mantissa())
        .map_err(|_| GatewayError::MalformedFrame(format!("decimal mantissa exceeds 64 bits: {d}")))?;
    buf.extend_from_slice(&mantissa.to_le_bytes());
    buf.push(d.scale() as u8);
    Ok(())
}

fn put_var_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), GatewayError> {
    let len = u16::try_from(bytes.len())
        .map_err(|_| GatewayError::MalformedFrame(format!("variable field of {} bytes", bytes.len())))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

fn put_levels(buf: &mut Vec<u8>, levels: &[OrderBookLevel]) -> Result<(), GatewayError> {
    let count = u16::try_from(levels.len())
        .map_err(|_| GatewayError::MalformedFrame(format!("{} book levels", levels.len())))?;
    buf.extend_from_slice(&count.to_le_bytes());
    for level in levels {
        put_decimal(buf, &level.price)?;
        put_decimal(buf, &level.quantity)?;
    }
    Ok(())
}

fn venue_code(venue: Venue) -> u8 {
    match venue {
        Venue::Binance => 1,
        Venue::Okx => 2,
        Venue::Bybit => 3,
    }
}

fn venue_from_code(code: u8) -> Result<Venue, GatewayError> {
    match code {
        1 => Ok(Venue::Binance),
        2 => Ok(Venue::Okx),
        3 => Ok(Venue::Bybit),
        other => Err(GatewayError::MalformedFrame(format!("unknown venue code {other}"))),
    }
}

fn side_code(side: Side) -> u8 {
    match side {
        Side::Unknown => 0,
        Side::Buy => 1,
        Side::Sell => 2,
    }
}

fn side_from_code(code: u8) -> Result<Side, GatewayError> {
    match code {
        0 => Ok(Side::Unknown),
        1 => Ok(Side::Buy),
        2 => Ok(Side::Sell),
        other => Err(GatewayError::MalformedFrame(format!("unknown side code {other}"))),
    }
}

/// Bounds-checked little-endian cursor.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], GatewayError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| GatewayError::MalformedFrame(format!("truncated message at byte {}", self.pos)))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, GatewayError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, GatewayError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u64(&mut self) -> Result<u64, GatewayError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    fn i64(&mut self) -> Result<i64, GatewayError> {
        let b = self.take(8)?;
        Ok(i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    fn decimal(&mut self) -> Result<Decimal, GatewayError> {
        let mantissa = self.i64()?;
        let exponent = self.u8()?;
        Decimal::try_from_i128_with_scale(mantissa as i128, exponent as u32)
            .map_err(|e| GatewayError::MalformedFrame(format!("invalid decimal: {e}")))
    }

    fn optional_decimal(&mut self) -> Result<Option<Decimal>, GatewayError> {
        let mantissa = self.i64()?;
        let exponent = self.u8()?;
        if exponent == EXPONENT_NULL {
            return Ok(None);
        }
        Decimal::try_from_i128_with_scale(mantissa as i128, exponent as u32)
            .map(Some)
            .map_err(|e| GatewayError::MalformedFrame(format!("invalid decimal: {e}")))
    }

    fn var_string(&mut self) -> Result<String, GatewayError> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| GatewayError::MalformedFrame("non-utf8 variable field".into()))
    }

    fn levels(&mut self) -> Result<Vec<OrderBookLevel>, GatewayError> {
        let count = self.u16()? as usize;
        let mut levels = Vec::with_capacity(count);
        for _ in 0..count {
            let price = self.decimal()?;
            let quantity = self.decimal()?;
            levels.push(OrderBookLevel::new(price, quantity));
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn sample_ticker() -> Ticker {
        Ticker {
            venue: Venue::Okx,
            symbol: "BTCUSDT".to_string(),
            timestamp: 1700000000000,
            gateway_timestamp: 99,
            last_price: dec("50000.1"),
            bid_price: dec("49999.9"),
            ask_price: dec("50000.2"),
            volume_24h: Some(dec("7715.62528481")),
        }
    }

    fn sample_trade() -> Trade {
        Trade {
            venue: Venue::Binance,
            symbol: "BNBBTC".to_string(),
            timestamp: 123456789,
            gateway_timestamp: 5,
            trade_id: "12345".to_string(),
            price: dec("0.001"),
            quantity: dec("100"),
            side: Side::Sell,
        }
    }

    fn sample_book() -> OrderBook {
        OrderBook {
            venue: Venue::Bybit,
            symbol: "BTCUSDT".to_string(),
            timestamp: 1672304484978,
            gateway_timestamp: 17,
            bids: vec![
                OrderBookLevel::new(dec("16493.50"), dec("0.006")),
                OrderBookLevel::new(dec("16493.00"), dec("0.100")),
            ],
            asks: vec![OrderBookLevel::new(dec("16611.00"), dec("0.029"))],
            is_snapshot: true,
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_trade(&sample_trade()).unwrap();
        assert_eq!(&bytes[0..2], &TRADE_BLOCK_LENGTH.to_le_bytes());
        assert_eq!(&bytes[2..4], &TEMPLATE_TRADE.to_le_bytes());
        assert_eq!(&bytes[4..6], &SCHEMA_ID.to_le_bytes());
        assert_eq!(&bytes[6..8], &SCHEMA_VERSION.to_le_bytes());
    }

    #[test]
    fn test_ticker_round_trip() {
        let ticker = sample_ticker();
        let bytes = encode_ticker(&ticker).unwrap();
        assert_eq!(decode(&bytes).unwrap(), MarketEvent::Ticker(ticker));
    }

    #[test]
    fn test_ticker_round_trip_without_volume() {
        let mut ticker = sample_ticker();
        ticker.volume_24h = None;
        let bytes = encode_ticker(&ticker).unwrap();
        assert_eq!(decode(&bytes).unwrap(), MarketEvent::Ticker(ticker));
    }

    #[test]
    fn test_trade_round_trip() {
        let trade = sample_trade();
        let bytes = encode_trade(&trade).unwrap();
        assert_eq!(decode(&bytes).unwrap(), MarketEvent::Trade(trade));
    }

    #[test]
    fn test_order_book_round_trip() {
        let book = sample_book();
        let bytes = encode_order_book(&book).unwrap();
        assert_eq!(decode(&bytes).unwrap(), MarketEvent::OrderBook(book));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let book = sample_book();
        assert_eq!(encode_order_book(&book).unwrap(), encode_order_book(&book).unwrap());
    }

    #[test]
    fn test_fixed_block_sizes() {
        // Header + fixed block + symbol length prefix must line up with the
        // declared block lengths.
        let trade = sample_trade();
        let bytes = encode_trade(&trade).unwrap();
        let symbol_offset = 8 + TRADE_BLOCK_LENGTH as usize;
        let symbol_len = u16::from_le_bytes([bytes[symbol_offset], bytes[symbol_offset + 1]]) as usize;
        assert_eq!(symbol_len, trade.symbol.len());

        let ticker = sample_ticker();
        let bytes = encode_ticker(&ticker).unwrap();
        let symbol_offset = 8 + TICKER_BLOCK_LENGTH as usize;
        let symbol_len = u16::from_le_bytes([bytes[symbol_offset], bytes[symbol_offset + 1]]) as usize;
        assert_eq!(symbol_len, ticker.symbol.len());
    }

    #[test]
    fn test_truncated_message_is_rejected() {
        let bytes = encode_trade(&sample_trade()).unwrap();
        for cut in [0, 4, 8, 20, bytes.len() - 1] {
            assert!(matches!(decode(&bytes[..cut]), Err(GatewayError::MalformedFrame(_))));
        }
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        let mut bytes = encode_trade(&sample_trade()).unwrap();
        bytes[2] = 9;
        assert!(matches!(decode(&bytes), Err(GatewayError::MalformedFrame(_))));
    }
}
