use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use argus_core::prelude::*;
use argus_gateway::config::GatewayConfig;
use argus_gateway::connector::{ConnectionHandler, ExchangeConnector};
use argus_gateway::encoder::{self, EncodedPayload, OutputFormat};
use argus_gateway::errors::GatewayError;

/// Market-data ingestion gateway: streams Binance, OKX and Bybit public
/// market data into a unified model and logs it in the chosen encoding.
#[derive(Parser, Debug)]
#[clap(name = "argus", version, about = "Market-data ingestion gateway")]
struct Cli {
    /// Configuration directory (falls back to $CONFIG_DIR, then `.`).
    #[arg(long)]
    config_dir: Option<String>,

    /// Run mode selecting `<config_dir>/<run_mode>.yaml` (falls back to
    /// $RUN_MODE, then `dev`).
    #[arg(long)]
    run_mode: Option<String>,

    /// Encoding the logging sink applies to events: native, json or sbe.
    #[arg(long, default_value = "native", value_parser = parse_format)]
    format: OutputFormat,
}

fn parse_format(raw: &str) -> Result<OutputFormat, String> {
    match raw.to_lowercase().as_str() {
        "native" => Ok(OutputFormat::Native),
        "json" => Ok(OutputFormat::Json),
        "sbe" => Ok(OutputFormat::Sbe),
        other => Err(format!("unknown format `{other}` (expected native, json or sbe)")),
    }
}

/// Sink that logs every event, exercising the configured encoder on the
/// way. Stands in for the downstream publication transport.
struct LogSink {
    format: OutputFormat,
}

impl LogSink {
    fn publish(&self, event: MarketEvent) {
        match self.format {
            OutputFormat::Native => {
                info!(venue = %event.venue(), symbol = %event.symbol(), kind = %event.data_type(), ts = event.timestamp(), "event")
            }
            format => match encoder::encode(&event, format) {
                Ok(EncodedPayload::Json(json)) => info!(payload = %json, "event"),
                Ok(EncodedPayload::Binary(bytes)) => {
                    info!(venue = %event.venue(), kind = %event.data_type(), bytes = bytes.len(), "event")
                }
                Ok(EncodedPayload::Event(_)) => {}
                Err(e) => error!(error = %e, "encode failed"),
            },
        }
    }
}

impl MarketSink for LogSink {
    fn on_ticker(&self, ticker: Ticker) {
        self.publish(MarketEvent::Ticker(ticker));
    }

    fn on_trade(&self, trade: Trade) {
        self.publish(MarketEvent::Trade(trade));
    }

    fn on_order_book(&self, book: OrderBook) {
        self.publish(MarketEvent::OrderBook(book));
    }
}

/// Re-issues subscriptions whenever a venue (re)connects; the connector
/// itself deliberately keeps no desired-subscription state.
#[derive(Default)]
struct Resubscriber {
    connectors: Mutex<HashMap<Venue, Registration>>,
}

struct Registration {
    connector: Arc<ExchangeConnector>,
    symbols: Vec<String>,
    channels: Vec<DataType>,
}

impl Resubscriber {
    fn register(&self, venue: Venue, connector: Arc<ExchangeConnector>, symbols: Vec<String>, channels: Vec<DataType>) {
        if let Ok(mut map) = self.connectors.lock() {
            map.insert(
                venue,
                Registration {
                    connector,
                    symbols,
                    channels,
                },
            );
        }
    }
}

impl ConnectionHandler for Resubscriber {
    fn on_connected(&self, venue: Venue) {
        if let Ok(map) = self.connectors.lock() {
            if let Some(registration) = map.get(&venue) {
                registration
                    .connector
                    .subscribe(&registration.symbols, &registration.channels);
            }
        }
    }

    fn on_disconnected(&self, venue: Venue) {
        warn!(%venue, "disconnected");
    }

    fn on_error(&self, venue: Venue, error: &GatewayError) {
        error!(%venue, "{error}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config_dir = cli
        .config_dir
        .or_else(|| env::var("CONFIG_DIR").ok())
        .unwrap_or_else(|| ".".to_string());
    let run_mode = cli
        .run_mode
        .or_else(|| env::var("RUN_MODE").ok())
        .unwrap_or_else(|| "dev".to_string());
    let config: GatewayConfig = load_from(&config_dir, &run_mode);
    anyhow::ensure!(!config.connectors.is_empty(), "no connectors configured");

    let sink = Arc::new(LogSink { format: cli.format });
    let resubscriber = Arc::new(Resubscriber::default());

    let mut connectors = Vec::new();
    for connector_config in config.connectors {
        let venue = connector_config.venue;
        connector_config
            .parsed_url()
            .with_context(|| format!("invalid ws url for {venue}"))?;
        let symbols = connector_config.symbols.clone();
        let channels = connector_config.channels.clone();
        let connector = ExchangeConnector::new(connector_config, sink.clone(), resubscriber.clone());
        resubscriber.register(venue, connector.clone(), symbols, channels);
        connector.clone().connect();
        connectors.push(connector);
    }

    info!("argus gateway running; ctrl-c to stop");
    signal::ctrl_c().await?;
    info!("shutting down");
    for connector in &connectors {
        connector.disconnect().await;
    }
    Ok(())
}
