//! Turns initial load, history navigation, back/forward and cache restores
//! into pageviews.

use beacon_logging::{beacon_debug, beacon_warn};

use crate::{
    Effect, EventPayload, PageSnapshot, Payload, SessionState, TrackOptions, Visibility,
    PAGEVIEW_EVENT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationPhase {
    #[default]
    Idle,
    /// Prerendered; the initial pageview waits until the page is first shown.
    AwaitingActivation,
    PageviewActive,
}

/// Whether accepting a pageview first closes out the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outgoing {
    Finalize,
    /// Initial load: a manual pageview replayed from the queue belongs to the
    /// same page load and has nothing to report yet.
    Keep,
}

/// Initial-load transition. Runs once, even if queued calls already tracked
/// a pageview.
pub(crate) fn start(state: &mut SessionState, page: &PageSnapshot, effects: &mut Vec<Effect>) {
    if state.started {
        return;
    }
    state.started = true;
    if page.visibility == Visibility::Prerender {
        beacon_debug!("prerendered, deferring initial pageview");
        state.phase = NavigationPhase::AwaitingActivation;
    } else {
        trigger_pageview(state, page, Outgoing::Keep, effects);
    }
}

pub(crate) fn check_activation(
    state: &mut SessionState,
    page: &PageSnapshot,
    effects: &mut Vec<Effect>,
) {
    if state.phase == NavigationPhase::AwaitingActivation
        && state.previous_pathname.is_none()
        && page.visibility == Visibility::Visible
    {
        trigger_pageview(state, page, Outgoing::Keep, effects);
    }
}

/// Programmatic navigation; ignored when the pathname did not change.
pub(crate) fn history_pushed(
    state: &mut SessionState,
    page: &PageSnapshot,
    effects: &mut Vec<Effect>,
) {
    if state.previous_pathname.as_deref() == Some(page.location.pathname.as_str()) {
        beacon_debug!("same pathname {}, no pageview", page.location.pathname);
        return;
    }
    trigger_pageview(state, page, Outgoing::Finalize, effects);
}

pub(crate) fn popped_state(state: &mut SessionState, page: &PageSnapshot, effects: &mut Vec<Effect>) {
    trigger_pageview(state, page, Outgoing::Finalize, effects);
}

pub(crate) fn page_shown(
    state: &mut SessionState,
    persisted: bool,
    page: &PageSnapshot,
    effects: &mut Vec<Effect>,
) {
    if persisted {
        beacon_debug!("restored from back-forward cache");
        trigger_pageview(state, page, Outgoing::Finalize, effects);
    }
}

fn trigger_pageview(
    state: &mut SessionState,
    page: &PageSnapshot,
    outgoing: Outgoing,
    effects: &mut Vec<Effect>,
) {
    state.previous_pathname = Some(page.location.pathname.clone());
    track(
        state,
        PAGEVIEW_EVENT.to_string(),
        TrackOptions::default(),
        page,
        outgoing,
        effects,
    );
}

/// Public entry point for pageviews and custom events.
pub(crate) fn track(
    state: &mut SessionState,
    name: String,
    options: TrackOptions,
    page: &PageSnapshot,
    outgoing: Outgoing,
    effects: &mut Vec<Effect>,
) {
    let is_pageview = name == PAGEVIEW_EVENT;

    if let Some(reason) = page.suppressed {
        if let Some(text) = reason.log_reason() {
            beacon_warn!("Ignoring Event: {}", text);
        }
        if let Some(callback) = options.callback {
            effects.push(Effect::NotifyCallback { callback });
        }
        if is_pageview {
            state.pageview_eligible = false;
            state.phase = NavigationPhase::PageviewActive;
        }
        return;
    }

    let payload = EventPayload {
        name,
        url: page.location.href.clone(),
        domain: state.domain.clone(),
        referrer: page.referrer.clone().filter(|referrer| !referrer.is_empty()),
        meta: options
            .meta
            .as_ref()
            .and_then(|meta| serde_json::to_string(meta).ok()),
        props: options.props,
    };

    if is_pageview {
        accept_pageview(state, &payload, page, outgoing, effects);
    }
    effects.push(Effect::Dispatch {
        payload: Payload::Event(payload),
        callback: options.callback,
    });
}

/// Finalizes the outgoing pageview's engagement, then starts a fresh one.
fn accept_pageview(
    state: &mut SessionState,
    payload: &EventPayload,
    page: &PageSnapshot,
    outgoing: Outgoing,
    effects: &mut Vec<Effect>,
) {
    if outgoing == Outgoing::Finalize && state.phase == NavigationPhase::PageviewActive {
        // Partial engagement that does not qualify is dropped here.
        state.note_hidden(page.now, effects);
    }

    state.generation += 1;
    state.cancel_debounce(effects);
    state.reset_scroll(page);
    state.pageview_eligible = true;
    state.current_url = payload.url.clone();
    state.custom_properties = payload.props.clone().unwrap_or_default();
    state.accumulated_visible_ms = 0;
    state.engagement_started_at = None;
    if page.visibility == Visibility::Visible {
        state.note_visible(page.now);
    }
    state.visibility.bind(effects);
    state.phase = NavigationPhase::PageviewActive;
    beacon_debug!("pageview {} generation={}", state.current_url, state.generation);
}
