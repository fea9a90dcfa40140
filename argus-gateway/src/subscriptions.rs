//! Venue-verbatim subscription payload builders. The connector sends these
//! strings unmodified; each venue gets exactly the JSON its public API
//! docs describe.

use argus_core::prelude::{DataType, Venue};
use serde::Serialize;

use crate::errors::GatewayError;

/// Depth tier for Bybit order-book topics (`orderbook.{depth}.{symbol}`).
const BYBIT_BOOK_DEPTH: u32 = 50;

#[derive(Debug, Serialize)]
struct BinanceSubscription {
    method: &'static str,
    params: Vec<String>,
    id: u64,
}

#[derive(Debug, Serialize)]
struct OkxSubscription {
    op: &'static str,
    args: Vec<OkxArg>,
}

#[derive(Debug, Serialize)]
struct OkxArg {
    channel: &'static str,
    #[serde(rename = "instId")]
    inst_id: String,
}

#[derive(Debug, Serialize)]
struct BybitSubscription {
    op: &'static str,
    args: Vec<String>,
}

/// Build the subscribe messages covering every `(symbol, data_type)` pair.
/// Symbols are canonical (`BTCUSDT`) and converted to the venue's wire form
/// here. Empty inputs produce no messages.
pub fn build_messages(
    venue: Venue,
    symbols: &[String],
    data_types: &[DataType],
) -> Result<Vec<String>, GatewayError> {
    if symbols.is_empty() || data_types.is_empty() {
        return Ok(Vec::new());
    }
    let message = match venue {
        Venue::Binance => {
            let mut params = Vec::with_capacity(symbols.len() * data_types.len());
            for data_type in data_types {
                let suffix = binance_channel(*data_type)?;
                for symbol in symbols {
                    params.push(format!("{}{}", venue.venue_symbol(symbol), suffix));
                }
            }
            serialize(&BinanceSubscription {
                method: "SUBSCRIBE",
                params,
                id: 1,
            })?
        }
        Venue::Okx => {
            let mut args = Vec::with_capacity(symbols.len() * data_types.len());
            for data_type in data_types {
                let channel = okx_channel(*data_type)?;
                for symbol in symbols {
                    args.push(OkxArg {
                        channel,
                        inst_id: venue.venue_symbol(symbol),
                    });
                }
            }
            serialize(&OkxSubscription { op: "subscribe", args })?
        }
        Venue::Bybit => {
            let mut args = Vec::with_capacity(symbols.len() * data_types.len());
            for data_type in data_types {
                for symbol in symbols {
                    let symbol = venue.venue_symbol(symbol);
                    args.push(match data_type {
                        DataType::Trade => format!("publicTrade.{symbol}"),
                        DataType::Ticker => format!("tickers.{symbol}"),
                        DataType::OrderBook => format!("orderbook.{BYBIT_BOOK_DEPTH}.{symbol}"),
                        DataType::Unknown => return Err(no_channel(venue)),
                    });
                }
            }
            serialize(&BybitSubscription { op: "subscribe", args })?
        }
    };
    Ok(vec![message])
}

fn binance_channel(data_type: DataType) -> Result<&'static str, GatewayError> {
    match data_type {
        DataType::Trade => Ok("@trade"),
        DataType::Ticker => Ok("@ticker"),
        DataType::OrderBook => Ok("@depth"),
        DataType::Unknown => Err(no_channel(Venue::Binance)),
    }
}

fn okx_channel(data_type: DataType) -> Result<&'static str, GatewayError> {
    match data_type {
        DataType::Trade => Ok("trades"),
        DataType::Ticker => Ok("tickers"),
        DataType::OrderBook => Ok("books"),
        DataType::Unknown => Err(no_channel(Venue::Okx)),
    }
}

fn no_channel(venue: Venue) -> GatewayError {
    GatewayError::SubscriptionRejected(format!("no {venue} channel for data type `unknown`"))
}

fn serialize<T: Serialize>(message: &T) -> Result<String, GatewayError> {
    serde_json::to_string(message).map_err(|e| GatewayError::SubscriptionRejected(format!("serialize: {e}")))
}
