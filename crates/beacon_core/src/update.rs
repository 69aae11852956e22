use beacon_logging::beacon_trace;

use crate::geometry::{document_height, SETTLE_INTERVAL, SETTLE_ITERATIONS};
use crate::state::SettleTimer;
use crate::{navigation, visibility, Effect, Msg, PageSnapshot, SessionState, TimerHandle, TimerMode};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::Started { page } => navigation::start(&mut state, &page, &mut effects),
        Msg::Track {
            name,
            options,
            page,
        } => navigation::track(
            &mut state,
            name,
            options,
            &page,
            navigation::Outgoing::Finalize,
            &mut effects,
        ),
        Msg::Loaded { page } => start_settling(&mut state, &page, &mut effects),
        Msg::Scrolled { page } => state.record_scroll(&page),
        Msg::VisibilityChanged { page } => {
            visibility::visibility_changed(&mut state, &page, &mut effects)
        }
        Msg::HistoryPushed { page } => navigation::history_pushed(&mut state, &page, &mut effects),
        Msg::PoppedState { page } => navigation::popped_state(&mut state, &page, &mut effects),
        Msg::PageShown { persisted, page } => {
            navigation::page_shown(&mut state, persisted, &page, &mut effects)
        }
        Msg::TimerFired { handle, page } => timer_fired(&mut state, handle, &page, &mut effects),
    }

    (state, effects)
}

fn start_settling(state: &mut SessionState, page: &PageSnapshot, effects: &mut Vec<Effect>) {
    state.document_height = document_height(&page.layout);
    if let Some(settle) = state.settle.take() {
        effects.push(Effect::CancelTimer {
            handle: settle.handle,
        });
    }
    let handle = state.allocate_timer();
    state.settle = Some(SettleTimer {
        handle,
        remaining: SETTLE_ITERATIONS,
    });
    effects.push(Effect::ScheduleTimer {
        handle,
        delay: SETTLE_INTERVAL,
        mode: TimerMode::Repeating,
    });
}

fn timer_fired(
    state: &mut SessionState,
    handle: TimerHandle,
    page: &PageSnapshot,
    effects: &mut Vec<Effect>,
) {
    if state.end_debounce(handle) {
        return;
    }
    match state.settle {
        Some(mut settle) if settle.handle == handle => {
            state.document_height = document_height(&page.layout);
            settle.remaining = settle.remaining.saturating_sub(1);
            if settle.remaining == 0 {
                effects.push(Effect::CancelTimer { handle });
                state.settle = None;
            } else {
                state.settle = Some(settle);
            }
        }
        _ => beacon_trace!("stale timer {:?}", handle),
    }
}
