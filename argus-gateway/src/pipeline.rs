//! One-shot parse facade: classify, extract, encode, with the latency of
//! the whole pass measured on the monotonic clock.

use std::time::Instant;

use argus_core::prelude::{gateway_now, DataType, Venue};

use crate::encoder::{self, EncodedPayload, OutputFormat};
use crate::errors::GatewayError;
use crate::parser;

#[derive(Debug)]
pub struct ParseResult {
    pub venue: Venue,
    pub data_type: DataType,
    pub format: OutputFormat,
    /// Wall time between entry and return, error path included.
    pub elapsed_nanos: u64,
    /// `Ok(None)` for frames that are not market data (acks, pings),
    /// so callers can skip them cheaply.
    pub payload: Result<Option<EncodedPayload>, GatewayError>,
}

pub fn parse_frame(frame: &[u8], venue: Venue, format: OutputFormat) -> ParseResult {
    let started = Instant::now();
    let gateway_timestamp = gateway_now();
    let data_type = parser::classify(venue, frame);
    let payload = if data_type == DataType::Unknown {
        Ok(None)
    } else {
        parser::parse_event(venue, data_type, frame, gateway_timestamp).and_then(|event| match format {
            OutputFormat::Native => Ok(Some(EncodedPayload::Event(event))),
            OutputFormat::Json | OutputFormat::Sbe => encoder::encode(&event, format).map(Some),
        })
    };
    ParseResult {
        venue,
        data_type,
        format,
        elapsed_nanos: started.elapsed().as_nanos() as u64,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::prelude::{MarketEvent, Side};

    const BINANCE_TRADE: &[u8] =
        br#"{"e":"trade","E":123456789,"s":"BNBBTC","t":"12345","p":"0.001","q":"100","m":true}"#;

    #[test]
    fn test_native_payload_is_domain_event() {
        let result = parse_frame(BINANCE_TRADE, Venue::Binance, OutputFormat::Native);
        assert_eq!(result.data_type, DataType::Trade);
        match result.payload.unwrap() {
            Some(EncodedPayload::Event(MarketEvent::Trade(trade))) => {
                assert_eq!(trade.symbol, "BNBBTC");
                assert_eq!(trade.side, Side::Sell);
                assert_eq!(trade.timestamp, 123456789);
            }
            other => panic!("expected native trade, got {other:?}"),
        }
    }

    #[test]
    fn test_json_payload() {
        let result = parse_frame(BINANCE_TRADE, Venue::Binance, OutputFormat::Json);
        match result.payload.unwrap() {
            Some(EncodedPayload::Json(json)) => {
                assert!(json.contains(r#""tradeId":"12345""#));
                assert!(json.contains(r#""side":"sell""#));
            }
            other => panic!("expected json payload, got {other:?}"),
        }
    }

    #[test]
    fn test_sbe_payload_round_trips() {
        let result = parse_frame(BINANCE_TRADE, Venue::Binance, OutputFormat::Sbe);
        match result.payload.unwrap() {
            Some(EncodedPayload::Binary(bytes)) => {
                let decoded = crate::encoder::sbe::decode(&bytes).unwrap();
                assert_eq!(decoded.symbol(), "BNBBTC");
            }
            other => panic!("expected binary payload, got {other:?}"),
        }
    }

    #[test]
    fn test_ack_is_skipped_not_failed() {
        let result = parse_frame(br#"{"result":null,"id":1}"#, Venue::Binance, OutputFormat::Native);
        assert_eq!(result.data_type, DataType::Unknown);
        assert!(matches!(result.payload, Ok(None)));
    }

    #[test]
    fn test_malformed_frame_reports_error_with_latency() {
        let result = parse_frame(br#"{"e":"trade","s":"X"}"#, Venue::Binance, OutputFormat::Native);
        assert_eq!(result.data_type, DataType::Trade);
        assert!(matches!(result.payload, Err(GatewayError::MalformedFrame(_))));
        // The measurement is taken even though extraction failed.
        assert!(result.elapsed_nanos > 0);
    }
}
