pub mod json;
pub mod sbe;

use std::fmt;

use argus_core::prelude::MarketEvent;
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

/// Output encodings the pipeline can produce.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Hand the domain value through untouched.
    Native,
    /// Canonical JSON re-emit.
    Json,
    /// Fixed-layout little-endian binary.
    Sbe,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Native => write!(f, "native"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sbe => write!(f, "sbe"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EncodedPayload {
    Event(MarketEvent),
    Json(String),
    Binary(Vec<u8>),
}

/// Byte-encode `event` in `format`. The native pass-through has no byte
/// form; asking this module for it fails fast.
pub fn encode(event: &MarketEvent, format: OutputFormat) -> Result<EncodedPayload, GatewayError> {
    match format {
        OutputFormat::Native => Err(GatewayError::UnsupportedEncoding {
            format,
            data_type: event.data_type(),
        }),
        OutputFormat::Json => Ok(EncodedPayload::Json(json::encode(event)?)),
        OutputFormat::Sbe => Ok(EncodedPayload::Binary(sbe::encode(event)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::prelude::*;
    use rust_decimal::Decimal;

    fn sample_trade() -> MarketEvent {
        MarketEvent::Trade(Trade {
            venue: Venue::Binance,
            symbol: "BNBBTC".to_string(),
            timestamp: 123456789,
            gateway_timestamp: 0,
            trade_id: "12345".to_string(),
            price: Decimal::from_str_exact("0.001").unwrap(),
            quantity: Decimal::from(100),
            side: Side::Sell,
        })
    }

    #[test]
    fn test_native_byte_encoding_is_unsupported() {
        let err = encode(&sample_trade(), OutputFormat::Native).unwrap_err();
        match err {
            GatewayError::UnsupportedEncoding { format, data_type } => {
                assert_eq!(format, OutputFormat::Native);
                assert_eq!(data_type, DataType::Trade);
            }
            other => panic!("expected UnsupportedEncoding, got {other}"),
        }
    }

    #[test]
    fn test_encode_dispatch() {
        assert!(matches!(
            encode(&sample_trade(), OutputFormat::Json).unwrap(),
            EncodedPayload::Json(_)
        ));
        assert!(matches!(
            encode(&sample_trade(), OutputFormat::Sbe).unwrap(),
            EncodedPayload::Binary(_)
        ));
    }
}
