//! Exchange connector: one I/O task per venue owning the connection
//! lifecycle (connect, subscribe, stream, reconnect) and the hot frame
//! path (classify, extract, sink dispatch).

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Instant;

use argus_core::prelude::{gateway_now, DataType, MarketEvent, MarketSink, Venue};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ConnectorConfig;
use crate::errors::GatewayError;
use crate::metrics::ConnectorMetrics;
use crate::parser;
use crate::subscriptions;
use crate::supervisor::ReconnectSupervisor;
use crate::ws::{SessionEnd, WsSession};

/// Lifecycle callbacks for the embedding application. Re-subscription
/// after a reconnect happens here: the connector only reports
/// `on_connected`, and the embedder re-issues `subscribe`.
pub trait ConnectionHandler: Send + Sync {
    fn on_connected(&self, _venue: Venue) {}
    fn on_disconnected(&self, _venue: Venue) {}
    fn on_error(&self, _venue: Venue, _error: &GatewayError) {}
}

/// For embedders that only consume sink data.
pub struct NoopHandler;

impl ConnectionHandler for NoopHandler {}

pub struct ExchangeConnector {
    config: ConnectorConfig,
    sink: Arc<dyn MarketSink>,
    handler: Arc<dyn ConnectionHandler>,
    metrics: Arc<ConnectorMetrics>,
    out_tx: mpsc::UnboundedSender<String>,
    out_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ExchangeConnector {
    pub fn new(config: ConnectorConfig, sink: Arc<dyn MarketSink>, handler: Arc<dyn ConnectionHandler>) -> Arc<Self> {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            metrics: Arc::new(ConnectorMetrics::new(config.venue)),
            config,
            sink,
            handler,
            out_tx,
            out_rx: Mutex::new(Some(out_rx)),
            shutdown: CancellationToken::new(),
            task: Mutex::new(None),
        })
    }

    pub fn venue(&self) -> Venue {
        self.config.venue
    }

    pub fn metrics(&self) -> Arc<ConnectorMetrics> {
        self.metrics.clone()
    }

    /// Transport state, not protocol-level subscription state.
    pub fn is_connected(&self) -> bool {
        self.metrics.is_connected()
    }

    /// Spawn the venue's I/O task. Idempotent: a second call is a no-op.
    pub fn connect(self: Arc<Self>) {
        let mut slot = lock(&self.task);
        if slot.is_some() {
            debug!(venue = %self.config.venue, "connect ignored: already running");
            return;
        }
        let connector = self.clone();
        *slot = Some(tokio::spawn(async move { connector.run().await }));
    }

    /// Cancel the I/O task and close the connection. Safe to call from
    /// any thread; unblocks an in-progress read.
    pub async fn disconnect(&self) {
        self.shutdown.cancel();
        let handle = lock(&self.task).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Send the venue's subscribe messages for every `(symbol, data_type)`
    /// pair. Warning no-op when disconnected.
    pub fn subscribe(&self, symbols: &[String], data_types: &[DataType]) {
        let venue = self.config.venue;
        if !self.is_connected() {
            warn!(%venue, "subscribe ignored: not connected");
            return;
        }
        match subscriptions::build_messages(venue, symbols, data_types) {
            Ok(messages) => {
                for message in messages {
                    debug!(%venue, %message, "subscribing");
                    let _ = self.out_tx.send(message);
                }
            }
            Err(e) => warn!(%venue, error = %e, "invalid subscription request"),
        }
    }

    async fn run(self: Arc<Self>) {
        let venue = self.config.venue;
        let url = self.config.url();
        let reconnect = &self.config.reconnect;
        let mut supervisor = ReconnectSupervisor::new(
            reconnect.base_backoff(),
            reconnect.max_backoff(),
            reconnect.max_retries,
        );
        supervisor.start();
        let Some(mut out_rx) = lock(&self.out_rx).take() else {
            return;
        };

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            let session = tokio::select! {
                result = WsSession::connect(&url, reconnect.connect_timeout(), reconnect.ping_interval()) => result,
                _ = self.shutdown.cancelled() => break,
            };
            match session {
                Ok(session) => {
                    supervisor.reset();
                    self.metrics.set_connected(true);
                    info!(%venue, %url, "connected");
                    self.handler.on_connected(venue);

                    let outcome = session
                        .run(&mut out_rx, &self.shutdown, |raw| self.handle_frame(raw))
                        .await;

                    self.metrics.set_connected(false);
                    self.handler.on_disconnected(venue);
                    match outcome {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Closed => info!(%venue, "stream closed by venue"),
                        SessionEnd::Failed(e) => warn!(%venue, error = %e, "transport failed"),
                    }
                }
                Err(e) => warn!(%venue, error = %e, "connect failed"),
            }
            match supervisor.on_failure() {
                Some(delay) => {
                    info!(%venue, attempt = supervisor.attempts(), ?delay, "scheduling reconnect");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.shutdown.cancelled() => break,
                    }
                }
                None => {
                    let fatal = GatewayError::RetriesExhausted {
                        attempts: supervisor.attempts(),
                    };
                    error!(%venue, "{fatal}");
                    self.handler.on_error(venue, &fatal);
                    break;
                }
            }
        }
        self.metrics.set_connected(false);
    }

    /// Hot path for one inbound frame. Malformed frames are counted,
    /// logged and dropped; nothing here ever tears the connection down.
    fn handle_frame(&self, raw: &str) {
        let venue = self.config.venue;
        let buf = raw.as_bytes();
        let gateway_timestamp = gateway_now();
        let started = Instant::now();

        let data_type = parser::classify(venue, buf);
        self.metrics.record_received(data_type);
        if data_type == DataType::Unknown {
            if let Some(message) = parser::subscription_error(venue, buf) {
                let rejected = GatewayError::SubscriptionRejected(message);
                warn!(%venue, "{rejected}");
                self.handler.on_error(venue, &rejected);
            }
            return;
        }

        match parser::parse_event(venue, data_type, buf, gateway_timestamp) {
            Ok(event) => {
                self.metrics.observe_parse_latency(started.elapsed().as_nanos() as u64);
                self.metrics.record_published(data_type);
                match event {
                    MarketEvent::Ticker(ticker) => self.sink.on_ticker(ticker),
                    MarketEvent::Trade(trade) => self.sink.on_trade(trade),
                    MarketEvent::OrderBook(book) => self.sink.on_order_book(book),
                }
            }
            Err(e) => {
                self.metrics.record_parse_error();
                warn!(%venue, error = %e, frame = excerpt(raw), "dropping malformed frame");
            }
        }
    }
}

/// Frame excerpt for warn logs, truncated on a char boundary.
fn excerpt(raw: &str) -> &str {
    const MAX: usize = 256;
    if raw.len() <= MAX {
        return raw;
    }
    let mut end = MAX;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let short = "abc";
        assert_eq!(excerpt(short), "abc");

        let long = "é".repeat(200);
        let cut = excerpt(&long);
        assert!(cut.len() <= 256);
        assert!(long.starts_with(cut));
    }

    #[tokio::test]
    async fn test_subscribe_before_connect_is_noop() {
        struct PanicSink;
        impl MarketSink for PanicSink {
            fn on_ticker(&self, _: argus_core::prelude::Ticker) {
                panic!("no data expected")
            }
            fn on_trade(&self, _: argus_core::prelude::Trade) {
                panic!("no data expected")
            }
            fn on_order_book(&self, _: argus_core::prelude::OrderBook) {
                panic!("no data expected")
            }
        }

        let connector = ExchangeConnector::new(
            ConnectorConfig::new(Venue::Binance),
            Arc::new(PanicSink),
            Arc::new(NoopHandler),
        );
        assert!(!connector.is_connected());
        connector.subscribe(&["BTCUSDT".to_string()], &[DataType::Trade]);
        // Nothing was queued and nothing blew up; the connector is
        // still down.
        assert!(!connector.is_connected());
    }
}
