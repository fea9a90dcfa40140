//! One duplex WebSocket connection: connect with a timeout, then a single
//! driving loop that delivers inbound text frames, forwards queued
//! outbound messages in order, answers server pings and emits client
//! keepalive pings.

use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::GatewayError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Cooperative shutdown; the close handshake was sent.
    Shutdown,
    /// The peer closed the stream.
    Closed,
    /// Transport failure.
    Failed(GatewayError),
}

pub struct WsSession {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    ping_timer: Interval,
}

impl WsSession {
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        ping_interval: Duration,
    ) -> Result<Self, GatewayError> {
        let (ws, _response) = timeout(connect_timeout, connect_async(url)).await.map_err(|_| {
            GatewayError::TransportFailed(tokio_tungstenite::tungstenite::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "connect timed out",
            )))
        })??;
        let (sink, stream) = ws.split();
        // A zero interval would panic; treat it as keepalive disabled.
        let ping_every = if ping_interval.is_zero() {
            Duration::from_secs(3600)
        } else {
            ping_interval
        };
        let mut ping_timer = interval(ping_every);
        ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Self {
            sink,
            stream,
            ping_timer,
        })
    }

    /// Drive the session until it ends: every inbound text frame goes to
    /// `on_frame` (in arrival order, on this task), messages queued on
    /// `out_rx` are sent in order, server pings are answered, keepalive
    /// pings go out on the configured interval, and `shutdown` triggers
    /// the close handshake. After this returns no further frames are
    /// delivered.
    pub async fn run(
        mut self,
        out_rx: &mut mpsc::UnboundedReceiver<String>,
        shutdown: &CancellationToken,
        mut on_frame: impl FnMut(&str),
    ) -> SessionEnd {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    let _ = self.sink.send(Message::Close(None)).await;
                    let _ = self.sink.flush().await;
                    return SessionEnd::Shutdown;
                }
                outbound = out_rx.recv() => {
                    // The connector keeps a sender alive, so recv never
                    // yields None here.
                    if let Some(text) = outbound {
                        if let Err(e) = self.sink.send(Message::text(text)).await {
                            return SessionEnd::Failed(e.into());
                        }
                    }
                }
                _ = self.ping_timer.tick() => {
                    if let Err(e) = self.sink.send(Message::Ping(Bytes::new())).await {
                        return SessionEnd::Failed(e.into());
                    }
                }
                message = self.stream.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => on_frame(text.as_str()),
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = self.sink.send(Message::Pong(data)).await {
                                return SessionEnd::Failed(e.into());
                            }
                        }
                        Some(Ok(Message::Pong(_))) => {}
                        Some(Ok(Message::Binary(_))) => {
                            warn!("skipping unexpected binary frame");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!(?frame, "received close frame");
                            return SessionEnd::Closed;
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => return SessionEnd::Failed(e.into()),
                        None => return SessionEnd::Closed,
                    }
                }
            }
        }
    }
}
