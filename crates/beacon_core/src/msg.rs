use crate::{PageSnapshot, TimerHandle, TrackOptions};

/// Host events, each carrying the page as observed when the event fired.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Script initialized; performs the initial-load navigation.
    Started { page: PageSnapshot },
    /// Public tracking entry point.
    Track {
        name: String,
        options: TrackOptions,
        page: PageSnapshot,
    },
    /// Window finished loading; layout keeps settling for a while.
    Loaded { page: PageSnapshot },
    Scrolled { page: PageSnapshot },
    /// Tab moved to the foreground or background (or left prerender).
    VisibilityChanged { page: PageSnapshot },
    /// Programmatic navigation through the history API.
    HistoryPushed { page: PageSnapshot },
    /// Browser back/forward.
    PoppedState { page: PageSnapshot },
    /// Page shown; `persisted` is set when restored from the back-forward cache.
    PageShown { persisted: bool, page: PageSnapshot },
    TimerFired {
        handle: TimerHandle,
        page: PageSnapshot,
    },
}
