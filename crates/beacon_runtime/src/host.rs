use std::time::Duration;

use beacon_core::{PageSnapshot, TimerHandle, TimerMode};
use thiserror::Error;

/// Storage read failure; callers treat it as "flag absent".
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage access denied")]
    Denied,
}

/// Markers left by headless browsers and test frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutomationFlags {
    pub phantom: bool,
    pub nightmare: bool,
    pub webdriver: bool,
    pub cypress: bool,
    /// Set by the site to track even under automation.
    pub tracking_override: bool,
}

impl AutomationFlags {
    pub fn is_automated(&self) -> bool {
        self.phantom || self.nightmare || self.webdriver || self.cypress
    }
}

/// The embedding page.
///
/// The host delivers visibility changes to [`crate::Tracker::visibility_changed`]
/// from the start; `bind_visibility_observer` tells it engagement tracking now
/// depends on them.
pub trait Host {
    /// Current clock, location, referrer, visibility and layout.
    fn snapshot(&self) -> PageSnapshot;
    fn automation(&self) -> AutomationFlags;
    /// Value of the opt-out flag in the page's persistent storage.
    fn opt_out_flag(&self) -> Result<Option<String>, StorageError>;
    fn bind_visibility_observer(&mut self);
}

/// Host timer queue. Elapsed timers are reported through
/// [`crate::Tracker::timer_fired`].
pub trait Timers {
    fn schedule(&mut self, handle: TimerHandle, delay: Duration, mode: TimerMode);
    fn cancel(&mut self, handle: TimerHandle);
}
