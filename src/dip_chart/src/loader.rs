//! Historical series loading with supersession.
//!
//! [`HistoricalLoader::start`] spawns one fetch per request. Each fetch is
//! tagged with a generation number; starting another fetch, retrying, or
//! stopping bumps the generation, so a completion that arrives for an older
//! generation is discarded by [`HistoricalLoader::apply`] instead of
//! overwriting newer data.

use std::sync::Arc;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    events::ChartEvent,
    models::{bar_series::BarSeries, request_params::ChartRequest},
    providers::{HistoryProvider, ProviderError},
    store::BarStore,
};

/// What the loader last reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing requested yet, or stopped.
    #[default]
    Idle,
    Loading,
    /// The store holds the fetched series.
    Loaded { bars: usize },
    /// The fetch failed; the store keeps whatever it showed before.
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Result of one fetch, sent back through the session's event channel.
#[derive(Debug)]
pub struct LoadCompletion {
    pub generation: u64,
    pub request: ChartRequest,
    pub result: Result<BarSeries, ProviderError>,
}

pub struct HistoricalLoader {
    provider: Arc<dyn HistoryProvider>,
    events: UnboundedSender<ChartEvent>,
    request: Option<ChartRequest>,
    generation: u64,
    state: LoadState,
    task: Option<JoinHandle<()>>,
}

impl HistoricalLoader {
    pub fn new(provider: Arc<dyn HistoryProvider>, events: UnboundedSender<ChartEvent>) -> Self {
        Self {
            provider,
            events,
            request: None,
            generation: 0,
            state: LoadState::Idle,
            task: None,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// The request of the most recent [`start`](Self::start).
    pub fn request(&self) -> Option<&ChartRequest> {
        self.request.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts fetching `request`, superseding any fetch in flight.
    ///
    /// Must be called from within a tokio runtime. Returns the generation
    /// the completion will carry.
    pub fn start(&mut self, request: ChartRequest) -> u64 {
        self.abort_in_flight();
        self.generation += 1;
        self.state = LoadState::Loading;
        self.request = Some(request.clone());

        let generation = self.generation;
        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();
        debug!(
            symbol = %request.symbol,
            range = %request.range,
            generation,
            "history fetch started"
        );

        self.task = Some(tokio::spawn(async move {
            let result = provider.fetch_bars(request.clone()).await;
            let completion = LoadCompletion {
                generation,
                request,
                result,
            };
            // The receiver is gone once the session is dropped.
            let _ = events.send(completion.into());
        }));
        generation
    }

    /// Re-runs the last request as a single new attempt. Returns `None` if
    /// nothing was ever requested.
    pub fn retry(&mut self) -> Option<u64> {
        let request = self.request.clone()?;
        info!(symbol = %request.symbol, range = %request.range, "retrying history fetch");
        Some(self.start(request))
    }

    /// Abandons any fetch in flight. A completion already queued for it
    /// will be discarded.
    pub fn stop(&mut self) {
        self.abort_in_flight();
        self.generation += 1;
        if self.state.is_loading() {
            self.state = LoadState::Idle;
        }
    }

    /// Applies a completion to `store` if it belongs to the current
    /// generation. On success the store is replaced; on failure it is left
    /// untouched.
    ///
    /// Returns `false` for a superseded completion.
    pub fn apply(&mut self, completion: LoadCompletion, store: &mut BarStore) -> bool {
        if completion.generation != self.generation {
            debug!(
                symbol = %completion.request.symbol,
                generation = completion.generation,
                current = self.generation,
                "discarding superseded history result"
            );
            return false;
        }
        self.task = None;

        match completion.result {
            Ok(series) => {
                let bars = series.bars.len();
                store.replace(series.bars);
                info!(
                    symbol = %completion.request.symbol,
                    range = %completion.request.range,
                    bars,
                    "history loaded"
                );
                self.state = LoadState::Loaded { bars: store.len() };
            }
            Err(err) => {
                warn!(
                    symbol = %completion.request.symbol,
                    range = %completion.request.range,
                    error = %err,
                    "history fetch failed"
                );
                self.state = LoadState::Failed(err.to_string());
            }
        }
        true
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for HistoricalLoader {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
