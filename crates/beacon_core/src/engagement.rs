//! Visible-time accounting and engagement eligibility.

use std::time::Duration;

use beacon_logging::beacon_debug;

use crate::{
    EngagementPayload, Effect, Payload, SessionState, TimerHandle, TimerMode, Timestamp,
};

pub const ENGAGEMENT_EVENT: &str = "engagement";
/// Visible dwell time that makes a pageview eligible without further scrolling.
pub const ENGAGEMENT_DWELL_FLOOR_MS: u64 = 3000;
/// Cooldown after an engagement record during which no other one is emitted.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Pending debounce cooldown, owned by the pageview generation that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Debounce {
    pub(crate) handle: TimerHandle,
    pub(crate) generation: u64,
}

/// Deepest position reached as a share of the document height, in `0..=100`.
///
/// A zero height yields `0`. A stale height lower than the watermark would
/// exceed 100 and is clamped.
pub fn scroll_depth_percent(max_scroll_position: f64, document_height: f64) -> u8 {
    if document_height.is_nan() || document_height <= 0.0 || !max_scroll_position.is_finite() {
        return 0;
    }
    let percent = (max_scroll_position / document_height * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

impl SessionState {
    /// Visible time banked so far plus the live interval, if any.
    pub fn elapsed_visible_ms(&self, now: Timestamp) -> u64 {
        match self.engagement_started_at {
            Some(started) => self.accumulated_visible_ms + now.saturating_since(started),
            None => self.accumulated_visible_ms,
        }
    }

    pub(crate) fn note_visible(&mut self, now: Timestamp) {
        if self.engagement_started_at.is_none() {
            self.engagement_started_at = Some(now);
        }
    }

    /// Banks the live interval, then attempts a flush.
    pub(crate) fn note_hidden(&mut self, now: Timestamp, effects: &mut Vec<Effect>) {
        if let Some(started) = self.engagement_started_at.take() {
            self.accumulated_visible_ms += now.saturating_since(started);
        }
        self.try_flush(now, effects);
    }

    /// Emits an engagement record if the pageview is eligible, no cooldown is
    /// running, and the visitor either scrolled past the last report or
    /// stayed visible for the dwell floor.
    pub(crate) fn try_flush(&mut self, now: Timestamp, effects: &mut Vec<Effect>) -> bool {
        if self.is_debouncing() || !self.pageview_eligible {
            return false;
        }
        let elapsed = self.elapsed_visible_ms(now);
        let scrolled = self.last_reported_scroll_position < self.max_scroll_position;
        if !scrolled && elapsed < ENGAGEMENT_DWELL_FLOOR_MS {
            return false;
        }

        self.last_reported_scroll_position = self.max_scroll_position;
        let handle = self.allocate_timer();
        self.debounce = Some(Debounce {
            handle,
            generation: self.generation,
        });
        effects.push(Effect::ScheduleTimer {
            handle,
            delay: DEBOUNCE_WINDOW,
            mode: TimerMode::Once,
        });
        self.accumulated_visible_ms = 0;
        self.engagement_started_at = None;

        let payload = EngagementPayload {
            name: ENGAGEMENT_EVENT.to_string(),
            scroll_depth: scroll_depth_percent(self.max_scroll_position, self.document_height),
            domain: self.domain.clone(),
            url: self.current_url.clone(),
            props: self.custom_properties.clone(),
            engaged_ms: elapsed,
        };
        beacon_debug!(
            "engagement url={} sd={} e={}",
            payload.url,
            payload.scroll_depth,
            payload.engaged_ms
        );
        effects.push(Effect::Dispatch {
            payload: Payload::Engagement(payload),
            callback: None,
        });
        true
    }

    /// Ends the cooldown if `handle` is the current generation's debounce timer.
    ///
    /// A timer left over from a superseded pageview never clears the flag.
    pub(crate) fn end_debounce(&mut self, handle: TimerHandle) -> bool {
        match self.debounce {
            Some(debounce) if debounce.handle == handle && debounce.generation == self.generation => {
                self.debounce = None;
                true
            }
            _ => false,
        }
    }

    /// Drops a cooldown left over from the outgoing pageview.
    pub(crate) fn cancel_debounce(&mut self, effects: &mut Vec<Effect>) {
        if let Some(debounce) = self.debounce.take() {
            effects.push(Effect::CancelTimer {
                handle: debounce.handle,
            });
        }
    }
}
