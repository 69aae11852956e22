//! Drives the core state machine from host events and executes its effects.

use std::collections::HashMap;

use beacon_core::{
    update, CallbackId, Effect, Msg, PageSnapshot, Payload, SessionState, SessionView,
    TimerHandle, TrackOptions,
};
use beacon_logging::{beacon_debug, beacon_warn};

use crate::{
    BeaconRequest, CallOptions, CommandBuffer, DeliveryCallback, Host, IgnoreContext,
    IgnorePolicy, Timers, TrackerConfig, Transport, TransportError,
};

/// Navigation signals from the host's history interception.
///
/// `history_pushed` fires after a programmatic navigation has updated the
/// location, `popped_state` after browser back/forward, and `page_shown` on
/// every page show with `persisted` set for back-forward cache restores.
pub trait NavigationObserver {
    fn history_pushed(&mut self);
    fn popped_state(&mut self);
    fn page_shown(&mut self, persisted: bool);
}

pub struct Tracker<H: Host, T: Timers> {
    config: TrackerConfig,
    host: H,
    timers: T,
    transport: Box<dyn Transport>,
    policy: Box<dyn IgnorePolicy>,
    state: Option<SessionState>,
    callbacks: HashMap<CallbackId, DeliveryCallback>,
    next_callback: u64,
    started: bool,
}

impl<H: Host, T: Timers> Tracker<H, T> {
    pub fn new(
        config: TrackerConfig,
        host: H,
        timers: T,
        transport: Box<dyn Transport>,
        policy: Box<dyn IgnorePolicy>,
    ) -> Self {
        let state = SessionState::new(config.domain.clone(), &host.snapshot());
        Self {
            config,
            host,
            timers,
            transport,
            policy,
            state: Some(state),
            callbacks: HashMap::new(),
            next_callback: 0,
            started: false,
        }
    }

    /// Replays calls queued before initialization, then performs the
    /// initial-load pageview (deferred while prerendering).
    pub fn start(&mut self, queued: CommandBuffer) {
        if self.started {
            beacon_warn!("Tracker already started; ignoring {} queued calls", queued.len());
            return;
        }
        self.started = true;
        for call in queued.into_calls() {
            self.track(call.name, call.options);
        }
        let page = self.gated_snapshot();
        self.apply(Msg::Started { page });
    }

    /// Public entry point for pageviews and custom events.
    pub fn track(&mut self, name: impl Into<String>, options: CallOptions) {
        let callback = options.callback.map(|callback| self.register_callback(callback));
        let options = TrackOptions {
            props: options.props,
            meta: options.meta,
            callback,
        };
        let page = self.gated_snapshot();
        self.apply(Msg::Track {
            name: name.into(),
            options,
            page,
        });
        if let Some(id) = callback {
            // Every track produces a dispatch or a notification; drop anything left.
            self.callbacks.remove(&id);
        }
    }

    pub fn loaded(&mut self) {
        let page = self.host.snapshot();
        self.apply(Msg::Loaded { page });
    }

    pub fn scrolled(&mut self) {
        let page = self.host.snapshot();
        self.apply(Msg::Scrolled { page });
    }

    pub fn visibility_changed(&mut self) {
        let page = self.gated_snapshot();
        self.apply(Msg::VisibilityChanged { page });
    }

    pub fn timer_fired(&mut self, handle: TimerHandle) {
        let page = self.host.snapshot();
        self.apply(Msg::TimerFired { handle, page });
    }

    pub fn view(&self) -> SessionView {
        self.state
            .as_ref()
            .map(SessionState::view)
            .unwrap_or_default()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    fn register_callback(&mut self, callback: DeliveryCallback) -> CallbackId {
        self.next_callback += 1;
        let id = CallbackId(self.next_callback);
        self.callbacks.insert(id, callback);
        id
    }

    /// Snapshot with the ignore gate evaluated, for events that may track.
    fn gated_snapshot(&self) -> PageSnapshot {
        let mut page = self.host.snapshot();
        let context = IgnoreContext {
            hostname: &page.location.hostname,
            protocol: &page.location.protocol,
            automation: self.host.automation(),
            opt_out: self.host.opt_out_flag(),
        };
        page.suppressed = self.policy.check(&context);
        page
    }

    fn apply(&mut self, msg: Msg) {
        let Some(state) = self.state.take() else {
            return;
        };
        let (next, effects) = update(state, msg);
        self.state = Some(next);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Dispatch { payload, callback } => {
                    let done = callback.and_then(|id| self.callbacks.remove(&id));
                    self.dispatch(payload, done);
                }
                Effect::NotifyCallback { callback } => {
                    if let Some(done) = self.callbacks.remove(&callback) {
                        done(None);
                    }
                }
                Effect::BindVisibilityObserver => self.host.bind_visibility_observer(),
                Effect::ScheduleTimer {
                    handle,
                    delay,
                    mode,
                } => self.timers.schedule(handle, delay, mode),
                Effect::CancelTimer { handle } => self.timers.cancel(handle),
            }
        }
    }

    fn dispatch(&self, payload: Payload, done: Option<DeliveryCallback>) {
        let body = match payload.to_json() {
            Ok(body) => body,
            Err(err) => {
                beacon_warn!("Failed to serialize {} payload: {}", payload.name(), err);
                return;
            }
        };
        let request = BeaconRequest {
            endpoint: self.config.endpoint.clone(),
            body,
        };
        match self.transport.send(request, done) {
            Ok(()) => {}
            Err(TransportError::Unavailable) => {
                beacon_debug!("No transport, skipping {}", payload.name());
            }
            Err(err) => beacon_warn!("Failed to send {}: {}", payload.name(), err),
        }
    }
}

impl<H: Host, T: Timers> NavigationObserver for Tracker<H, T> {
    fn history_pushed(&mut self) {
        let page = self.gated_snapshot();
        self.apply(Msg::HistoryPushed { page });
    }

    fn popped_state(&mut self) {
        let page = self.gated_snapshot();
        self.apply(Msg::PoppedState { page });
    }

    fn page_shown(&mut self, persisted: bool) {
        let page = self.gated_snapshot();
        self.apply(Msg::PageShown { persisted, page });
    }
}
