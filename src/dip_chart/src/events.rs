use crate::{feed::FeedEvent, loader::LoadCompletion};

/// Everything a background task can report back to the owning
/// [`ChartSession`](crate::session::ChartSession).
///
/// Tasks never touch the bar store; they send one of these and the session
/// applies it on its own task.
#[derive(Debug)]
pub enum ChartEvent {
    History(LoadCompletion),
    Feed(FeedEvent),
}

impl From<LoadCompletion> for ChartEvent {
    fn from(completion: LoadCompletion) -> Self {
        ChartEvent::History(completion)
    }
}

impl From<FeedEvent> for ChartEvent {
    fn from(event: FeedEvent) -> Self {
        ChartEvent::Feed(event)
    }
}
