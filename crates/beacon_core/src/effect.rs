use std::time::Duration;

use crate::{CallbackId, Payload};

/// Identifies a timer scheduled through [`Effect::ScheduleTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Once,
    /// Fires every `delay` until cancelled.
    Repeating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand a finished payload to the dispatch boundary.
    Dispatch {
        payload: Payload,
        callback: Option<CallbackId>,
    },
    /// Invoke a caller's callback without a delivery status.
    NotifyCallback { callback: CallbackId },
    /// Start delivering visibility changes. Emitted at most once per session.
    BindVisibilityObserver,
    ScheduleTimer {
        handle: TimerHandle,
        delay: Duration,
        mode: TimerMode,
    },
    CancelTimer { handle: TimerHandle },
}
