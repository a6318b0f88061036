//! The chart session: one bar store, one loader, one live feed.
//!
//! A [`ChartSession`] owns its [`BarStore`] exclusively. Fetch and feed
//! tasks report through a channel, and every mutation is applied by
//! [`ChartSession::handle_event`] on the task that drives the session, so
//! readers of [`ChartSession::store`] always see a settled series.
//!
//! Selecting a new symbol or range supersedes the in-flight fetch and closes
//! the live feed. The feed is opened again only once a fresh history for a
//! live range has been applied, so the historical `replace` always precedes
//! the first live `upsert`. A live range whose history failed to load gets
//! no feed until [`ChartSession::retry`] succeeds. A blank symbol selects
//! nothing: no fetch runs and the feed stays inactive.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;

use crate::{
    events::ChartEvent,
    feed::{CloseReason, FeedEvent, FeedState, LiveFeed},
    loader::{HistoricalLoader, LoadState},
    models::{
        range::RangeSelection,
        request_params::{ChartRequest, normalize_symbol},
    },
    providers::{HistoryProvider, dip_api::DipApiClient},
    store::BarStore,
};

/// What [`ChartSession::handle_event`] did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The event belonged to a superseded fetch or connection.
    Discarded,
    HistoryLoaded { bars: usize },
    HistoryFailed(String),
    FeedOpened,
    /// A feed frame was applied; `applied` upserts changed the store.
    LiveBars { applied: usize },
    FeedClosed(CloseReason),
}

pub struct ChartSession {
    store: BarStore,
    loader: HistoricalLoader,
    feed: LiveFeed,
    request: Option<ChartRequest>,
    events: UnboundedReceiver<ChartEvent>,
}

impl ChartSession {
    /// A session fetching history from `provider` and streaming from
    /// `ws_base`, keeping at most `capacity` bars.
    pub fn new(
        provider: Arc<dyn HistoryProvider>,
        ws_base: impl Into<String>,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store: BarStore::with_capacity(capacity),
            loader: HistoricalLoader::new(provider, tx.clone()),
            feed: LiveFeed::new(ws_base, tx),
            request: None,
            events: rx,
        }
    }

    /// A session backed by the dip backend, streaming from the same host.
    pub fn with_client(client: DipApiClient, capacity: usize) -> Self {
        let ws_base = client.ws_base_url();
        Self::new(Arc::new(client), ws_base, capacity)
    }

    pub fn store(&self) -> &BarStore {
        &self.store
    }

    /// Mutable access, e.g. to [`subscribe`](BarStore::subscribe) a renderer.
    pub fn store_mut(&mut self) -> &mut BarStore {
        &mut self.store
    }

    pub fn request(&self) -> Option<&ChartRequest> {
        self.request.as_ref()
    }

    pub fn load_state(&self) -> &LoadState {
        self.loader.state()
    }

    pub fn feed_state(&self) -> FeedState {
        self.feed.state()
    }

    /// Shows `request`. Returns `false` if it is already showing.
    ///
    /// A blank symbol deselects instead: the fetch and the feed are stopped,
    /// the store is cleared and `false` is returned.
    ///
    /// Must be called from within a tokio runtime.
    pub fn select(&mut self, request: ChartRequest) -> bool {
        if request.symbol.trim().is_empty() {
            self.deselect();
            return false;
        }
        if self.request.as_ref() == Some(&request) {
            return false;
        }

        let symbol_changed = self
            .request
            .as_ref()
            .is_none_or(|current| current.symbol != request.symbol);
        self.feed.stop();
        if symbol_changed && !self.store.is_empty() {
            self.store.clear();
        }

        debug!(
            symbol = %request.symbol,
            range = %request.range,
            symbol_changed,
            "chart selection changed"
        );
        self.loader.start(request.clone());
        self.request = Some(request);
        true
    }

    /// Switches range, keeping symbol and dip window. No-op without a
    /// current selection.
    pub fn select_range(&mut self, range: RangeSelection) -> bool {
        match &self.request {
            Some(current) => {
                let next = current.with_range(range);
                self.select(next)
            }
            None => false,
        }
    }

    /// Switches symbol, keeping the current range (intraday if none).
    pub fn select_symbol(&mut self, symbol: &str) -> bool {
        let next = match &self.request {
            Some(current) => ChartRequest {
                symbol: normalize_symbol(symbol),
                ..current.clone()
            },
            None => ChartRequest::new(symbol, RangeSelection::Intraday),
        };
        self.select(next)
    }

    /// Re-fetches the current selection once. The feed is reopened after
    /// the retry succeeds.
    pub fn retry(&mut self) -> bool {
        if self.request.is_none() {
            return false;
        }
        self.feed.stop();
        self.loader.retry().is_some()
    }

    /// Waits for the next event and applies it.
    ///
    /// Returns `None` only if every task sender is gone, which cannot happen
    /// while the session is alive; callers usually race this against their
    /// own shutdown signal.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let event = self.events.recv().await?;
        Some(self.handle_event(event))
    }

    /// Applies every event already queued without waiting.
    pub fn drain_pending(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            updates.push(self.handle_event(event));
        }
        updates
    }

    pub fn handle_event(&mut self, event: ChartEvent) -> SessionUpdate {
        match event {
            ChartEvent::History(completion) => {
                if !self.loader.apply(completion, &mut self.store) {
                    return SessionUpdate::Discarded;
                }
                match self.loader.state().clone() {
                    LoadState::Loaded { bars } => {
                        self.start_feed_if_live();
                        SessionUpdate::HistoryLoaded { bars }
                    }
                    LoadState::Failed(message) => SessionUpdate::HistoryFailed(message),
                    LoadState::Idle | LoadState::Loading => SessionUpdate::Discarded,
                }
            }
            ChartEvent::Feed(event) => {
                if event.generation() != self.feed.generation() {
                    self.feed.apply(event, &mut self.store);
                    return SessionUpdate::Discarded;
                }
                let update = match &event {
                    FeedEvent::Opened { .. } => SessionUpdate::FeedOpened,
                    FeedEvent::Closed { reason, .. } => SessionUpdate::FeedClosed(reason.clone()),
                    FeedEvent::Bars { .. } => SessionUpdate::LiveBars { applied: 0 },
                };
                let applied = self.feed.apply(event, &mut self.store);
                match update {
                    SessionUpdate::LiveBars { .. } => SessionUpdate::LiveBars { applied },
                    other => other,
                }
            }
        }
    }

    /// Stops the feed and abandons any fetch. The store keeps its contents.
    pub fn close(&mut self) {
        self.loader.stop();
        self.feed.stop();
    }

    fn deselect(&mut self) {
        if self.request.take().is_some() {
            debug!("chart selection cleared");
        }
        self.close();
        if !self.store.is_empty() {
            self.store.clear();
        }
    }

    fn start_feed_if_live(&mut self) {
        let Some(request) = &self.request else {
            return;
        };
        if request.range.is_live() {
            self.feed.start(&request.symbol);
        }
    }
}

impl Drop for ChartSession {
    fn drop(&mut self) {
        self.close();
    }
}
