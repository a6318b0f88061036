//! Live bar subscription over WebSocket.
//!
//! A [`LiveFeed`] follows one symbol at a time:
//!
//! ```text
//! Inactive -> Connecting -> Active -> Closed
//!     ^                                  |
//!     +----------- stop() / start() -----+
//! ```
//!
//! The connection runs in its own task and reports [`FeedEvent`]s through the
//! session's channel; bars reach the store only through [`LiveFeed::apply`].
//! A dropped connection is not re-established. Only a new
//! [`start`](LiveFeed::start) connects again.

pub mod decode;

use futures_util::{SinkExt, StreamExt};
use tokio::{
    sync::{mpsc::UnboundedSender, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::{
    events::ChartEvent,
    models::{bar::Bar, request_params::normalize_symbol},
    providers::dip_api::params::live_feed_path,
    store::BarStore,
};

pub use decode::decode_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Inactive,
    Connecting,
    Active,
    Closed,
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// [`LiveFeed::stop`] was called.
    Stopped,
    /// The server sent a close frame or the stream ended.
    ClosedByPeer,
    ConnectFailed(String),
    Error(String),
}

/// Progress of one connection, tagged with the generation that started it.
#[derive(Debug)]
pub enum FeedEvent {
    Opened { generation: u64 },
    Bars { generation: u64, bars: Vec<Bar> },
    Closed { generation: u64, reason: CloseReason },
}

impl FeedEvent {
    pub fn generation(&self) -> u64 {
        match self {
            FeedEvent::Opened { generation }
            | FeedEvent::Bars { generation, .. }
            | FeedEvent::Closed { generation, .. } => *generation,
        }
    }
}

pub struct LiveFeed {
    ws_base: String,
    events: UnboundedSender<ChartEvent>,
    state: FeedState,
    symbol: Option<String>,
    generation: u64,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// `ws_base` is the WebSocket origin, e.g. `ws://127.0.0.1:8000`.
    pub fn new(ws_base: impl Into<String>, events: UnboundedSender<ChartEvent>) -> Self {
        Self {
            ws_base: ws_base.into().trim_end_matches('/').to_string(),
            events,
            state: FeedState::Inactive,
            symbol: None,
            generation: 0,
            shutdown: None,
            task: None,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Bumped by every [`start`](Self::start) and [`stop`](Self::stop).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn url_for(&self, symbol: &str) -> String {
        format!("{}{}", self.ws_base, live_feed_path(symbol))
    }

    /// Closes any current connection and connects to `symbol`'s stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, symbol: &str) -> u64 {
        self.stop();
        self.generation += 1;
        self.state = FeedState::Connecting;

        let symbol = normalize_symbol(symbol);
        let url = self.url_for(&symbol);
        let generation = self.generation;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!(%symbol, %url, generation, "connecting live feed");

        self.task = Some(tokio::spawn(run_connection(
            url,
            generation,
            self.events.clone(),
            shutdown_rx,
        )));
        self.shutdown = Some(shutdown_tx);
        self.symbol = Some(symbol);
        generation
    }

    /// Closes the connection, if any, and returns to `Inactive`. Events
    /// still queued from it will be ignored.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if self.task.take().is_some() {
            debug!(symbol = ?self.symbol, generation = self.generation, "live feed stopped");
        }
        self.generation += 1;
        self.state = FeedState::Inactive;
    }

    /// Applies one connection event. Bars are upserted into `store` in
    /// order. Returns how many upserts changed the store.
    pub fn apply(&mut self, event: FeedEvent, store: &mut BarStore) -> usize {
        if event.generation() != self.generation {
            debug!(
                generation = event.generation(),
                current = self.generation,
                "ignoring event from a previous feed connection"
            );
            return 0;
        }

        match event {
            FeedEvent::Opened { .. } => {
                self.state = FeedState::Active;
                0
            }
            FeedEvent::Bars { bars, .. } => bars
                .into_iter()
                .filter(|bar| store.upsert(*bar).is_applied())
                .count(),
            FeedEvent::Closed { reason, .. } => {
                debug!(symbol = ?self.symbol, ?reason, "live feed closed");
                self.state = FeedState::Closed;
                self.shutdown = None;
                self.task = None;
                0
            }
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_connection(
    url: String,
    generation: u64,
    events: UnboundedSender<ChartEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let send = |event: FeedEvent| {
        let _ = events.send(event.into());
    };

    let connected = tokio::select! {
        _ = shutdown.changed() => return,
        result = connect_async(url.as_str()) => result,
    };
    let mut stream = match connected {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!(%url, error = %err, "failed to connect live feed");
            send(FeedEvent::Closed {
                generation,
                reason: CloseReason::ConnectFailed(err.to_string()),
            });
            return;
        }
    };

    info!(%url, generation, "live feed connected");
    send(FeedEvent::Opened { generation });

    let reason = loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = stream.close(None).await;
                break CloseReason::Stopped;
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        forward_bars(&text, generation, &send);
                    }
                    Some(Ok(Message::Binary(binary))) => {
                        if let Ok(text) = String::from_utf8(binary) {
                            forward_bars(&text, generation, &send);
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if stream.send(Message::Pong(payload)).await.is_err() {
                            break CloseReason::Error("failed to reply to websocket ping".into());
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break CloseReason::ClosedByPeer,
                    Some(Err(err)) => {
                        warn!(%url, error = %err, "live feed websocket error");
                        break CloseReason::Error(err.to_string());
                    }
                    _ => {}
                }
            }
        }
    };

    debug!(%url, generation, ?reason, "live feed connection finished");
    send(FeedEvent::Closed { generation, reason });
}

fn forward_bars(payload: &str, generation: u64, send: &impl Fn(FeedEvent)) {
    let bars = decode_message(payload);
    if !bars.is_empty() {
        send(FeedEvent::Bars { generation, bars });
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn feed() -> LiveFeed {
        let (tx, _rx) = mpsc::unbounded_channel();
        LiveFeed::new("ws://127.0.0.1:1/", tx)
    }

    #[test]
    fn url_is_built_from_ws_base() {
        assert_eq!(feed().url_for(" nvda "), "ws://127.0.0.1:1/ws/chart/intraday/NVDA");
    }

    #[test]
    fn events_drive_state_and_store() {
        let mut feed = feed();
        let mut store = BarStore::new();
        // Pretend a connection was started without spawning one.
        feed.generation = 7;
        feed.state = FeedState::Connecting;

        assert_eq!(feed.apply(FeedEvent::Opened { generation: 7 }, &mut store), 0);
        assert_eq!(feed.state(), FeedState::Active);

        let bars = vec![
            Bar::new(100, 1.0, 1.0, 1.0, 10.0, 1.0),
            Bar::new(100, 1.0, 1.0, 1.0, 11.0, 1.0),
            Bar::new(90, 1.0, 1.0, 1.0, 9.0, 1.0),
        ];
        assert_eq!(feed.apply(FeedEvent::Bars { generation: 7, bars }, &mut store), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.bars()[0].close, 11.0);

        let closed = FeedEvent::Closed {
            generation: 7,
            reason: CloseReason::ClosedByPeer,
        };
        feed.apply(closed, &mut store);
        assert_eq!(feed.state(), FeedState::Closed);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut feed = feed();
        let mut store = BarStore::new();
        feed.generation = 3;
        feed.state = FeedState::Connecting;

        let bars = vec![Bar::new(1, 1.0, 1.0, 1.0, 1.0, 1.0)];
        assert_eq!(feed.apply(FeedEvent::Bars { generation: 2, bars }, &mut store), 0);
        feed.apply(FeedEvent::Opened { generation: 2 }, &mut store);

        assert!(store.is_empty());
        assert_eq!(feed.state(), FeedState::Connecting);
    }

    #[test]
    fn stop_returns_to_inactive() {
        let mut feed = feed();
        feed.state = FeedState::Closed;
        let before = feed.generation;
        feed.stop();
        assert_eq!(feed.state(), FeedState::Inactive);
        assert!(feed.generation > before);
    }
}
