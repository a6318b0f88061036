//! The bar store: an ordered, time-deduplicated, capacity-bounded series.
//!
//! Two operations mutate it:
//! - [`BarStore::replace`] swaps in a whole historical series.
//! - [`BarStore::upsert`] merges one live update. The update either replaces
//!   the last bar (same timestamp), extends the series (newer timestamp), or
//!   is dropped (older timestamp, or any non-finite value). The store never
//!   inserts in the middle.
//!
//! After every successful mutation, observers registered with
//! [`BarStore::subscribe`] are called synchronously with the full series.

use std::{cmp::Ordering, fmt};

use tracing::trace;

use crate::models::bar::Bar;

/// Default capacity of a [`BarStore`].
pub const MAX_BARS: usize = 500;

/// Result of [`BarStore::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The bar was newer than the last one (or the store was empty).
    Appended,
    /// The bar had the last bar's timestamp and overwrote it.
    ReplacedLast,
    /// The bar was older than the last one and was dropped.
    Stale,
    /// The bar carried a non-finite value and was dropped.
    Invalid,
}

impl UpsertOutcome {
    pub const fn is_applied(self) -> bool {
        matches!(self, UpsertOutcome::Appended | UpsertOutcome::ReplacedLast)
    }
}

/// The kind of mutation an observer is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Replaced,
    Appended,
    ReplacedLast,
}

/// Handle returned by [`BarStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(StoreChange, &[Bar]) + Send>;

pub struct BarStore {
    bars: Vec<Bar>,
    capacity: usize,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

impl BarStore {
    /// An empty store holding at most [`MAX_BARS`] bars.
    pub fn new() -> Self {
        Self::with_capacity(MAX_BARS)
    }

    /// An empty store holding at most `capacity` bars (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bars: Vec::new(),
            capacity: capacity.max(1),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discards the current series and stores `bars` as given, keeping only
    /// the most recent `capacity` entries.
    ///
    /// The input is trusted to be ordered and deduplicated already.
    pub fn replace(&mut self, mut bars: Vec<Bar>) {
        if bars.len() > self.capacity {
            let excess = bars.len() - self.capacity;
            bars.drain(..excess);
        }
        self.bars = bars;
        self.notify(StoreChange::Replaced);
    }

    /// Empties the store. Observers see a [`StoreChange::Replaced`].
    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Merges one live update into the series.
    pub fn upsert(&mut self, candidate: Bar) -> UpsertOutcome {
        if !candidate.is_valid() {
            trace!(timestamp = candidate.timestamp, "dropping bar with non-finite values");
            return UpsertOutcome::Invalid;
        }

        let Some(last_ts) = self.bars.last().map(|bar| bar.timestamp) else {
            self.bars.push(candidate);
            self.notify(StoreChange::Appended);
            return UpsertOutcome::Appended;
        };

        match candidate.timestamp.cmp(&last_ts) {
            Ordering::Less => {
                trace!(
                    timestamp = candidate.timestamp,
                    last = last_ts,
                    "dropping out-of-order bar"
                );
                UpsertOutcome::Stale
            }
            Ordering::Equal => {
                let idx = self.bars.len() - 1;
                self.bars[idx] = candidate;
                self.notify(StoreChange::ReplacedLast);
                UpsertOutcome::ReplacedLast
            }
            Ordering::Greater => {
                self.bars.push(candidate);
                if self.bars.len() > self.capacity {
                    let excess = self.bars.len() - self.capacity;
                    self.bars.drain(..excess);
                }
                self.notify(StoreChange::Appended);
                UpsertOutcome::Appended
            }
        }
    }

    /// Registers `observer` to be called after every successful mutation.
    pub fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(StoreChange, &[Bar]) + Send + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn notify(&mut self, change: StoreChange) {
        for (_, observer) in &mut self.observers {
            observer(change, &self.bars);
        }
    }
}

impl Default for BarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BarStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarStore")
            .field("len", &self.bars.len())
            .field("capacity", &self.capacity)
            .field("last", &self.bars.last())
            .field("observers", &self.observers.len())
            .finish()
    }
}
