use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use beacon_core::{
    ElementExtents, LayoutMetrics, Location, PageSnapshot, TimerHandle, TimerMode, Timestamp,
    Visibility,
};
use beacon_runtime::{
    AutomationFlags, BeaconRequest, CallOptions, CommandBuffer, DeliveryCallback, DeliveryStatus,
    Host, NavigationObserver, StandardIgnorePolicy, StorageError, Timers, Tracker, TrackerConfig,
    Transport, TransportError,
};
use serde_json::Value;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(beacon_logging::initialize_for_tests);
}

#[derive(Debug, Clone)]
struct PageModel {
    now: u64,
    href: String,
    visibility: Visibility,
    scroll_y: f64,
    opt_out: Option<String>,
    storage_broken: bool,
}

#[derive(Clone)]
struct FakeHost {
    page: Arc<Mutex<PageModel>>,
    binds: Arc<AtomicUsize>,
}

impl FakeHost {
    fn new(href: &str) -> Self {
        Self {
            page: Arc::new(Mutex::new(PageModel {
                now: 0,
                href: href.to_string(),
                visibility: Visibility::Visible,
                scroll_y: 0.0,
                opt_out: None,
                storage_broken: false,
            })),
            binds: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn edit(&self, f: impl FnOnce(&mut PageModel)) {
        f(&mut self.page.lock().unwrap());
    }
}

impl Host for FakeHost {
    fn snapshot(&self) -> PageSnapshot {
        let page = self.page.lock().unwrap();
        PageSnapshot {
            now: Timestamp(page.now),
            location: Location::parse(&page.href).unwrap(),
            referrer: Some(String::new()),
            visibility: page.visibility,
            layout: LayoutMetrics {
                body: Some(ElementExtents {
                    scroll_height: 4000.0,
                    offset_height: 4000.0,
                    client_height: 1000.0,
                    scroll_top: 0.0,
                }),
                root: None,
                inner_height: Some(1000.0),
                scroll_y: Some(page.scroll_y),
            },
            suppressed: None,
        }
    }

    fn automation(&self) -> AutomationFlags {
        AutomationFlags::default()
    }

    fn opt_out_flag(&self) -> Result<Option<String>, StorageError> {
        let page = self.page.lock().unwrap();
        if page.storage_broken {
            return Err(StorageError::Denied);
        }
        Ok(page.opt_out.clone())
    }

    fn bind_visibility_observer(&mut self) {
        self.binds.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeTimers {
    scheduled: Vec<(TimerHandle, Duration, TimerMode)>,
    cancelled: Vec<TimerHandle>,
}

impl Timers for FakeTimers {
    fn schedule(&mut self, handle: TimerHandle, delay: Duration, mode: TimerMode) {
        self.scheduled.push((handle, delay, mode));
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.cancelled.push(handle);
    }
}

#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<BeaconRequest>>>,
    unavailable: bool,
}

impl RecordingTransport {
    fn bodies(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|request| serde_json::from_str(&request.body).unwrap())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn send(
        &self,
        request: BeaconRequest,
        done: Option<DeliveryCallback>,
    ) -> Result<(), TransportError> {
        if self.unavailable {
            return Err(TransportError::Unavailable);
        }
        self.sent.lock().unwrap().push(request);
        if let Some(done) = done {
            done(Some(DeliveryStatus { status: 202 }));
        }
        Ok(())
    }
}

fn config() -> TrackerConfig {
    TrackerConfig::from_script_attributes(
        "https://stats.example.net/js/script.js",
        None,
        Some("example.com"),
    )
    .unwrap()
}

fn tracker(
    host: &FakeHost,
    transport: &RecordingTransport,
) -> Tracker<FakeHost, FakeTimers> {
    init_logging();
    Tracker::new(
        config(),
        host.clone(),
        FakeTimers::default(),
        Box::new(transport.clone()),
        Box::new(StandardIgnorePolicy),
    )
}

fn names_and_urls(bodies: &[Value]) -> Vec<(String, String)> {
    bodies
        .iter()
        .map(|body| {
            (
                body["n"].as_str().unwrap().to_string(),
                body["u"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[test]
fn spa_session_dedups_and_flushes_engagement() {
    let host = FakeHost::new("https://example.com/a");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);

    tracker.start(CommandBuffer::new());
    let bodies = transport.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["n"], "pageview");
    assert!(bodies[0]["u"].as_str().unwrap().ends_with("/a"));
    assert_eq!(bodies[0]["d"], "example.com");
    assert_eq!(bodies[0]["r"], Value::Null);

    host.edit(|page| page.now = 500);
    tracker.history_pushed();
    assert_eq!(transport.bodies().len(), 1);

    host.edit(|page| {
        page.now = 4200;
        page.href = "https://example.com/b".to_string();
    });
    tracker.history_pushed();

    let bodies = transport.bodies();
    assert_eq!(
        names_and_urls(&bodies[1..]),
        vec![
            ("engagement".to_string(), "https://example.com/a".to_string()),
            ("pageview".to_string(), "https://example.com/b".to_string()),
        ]
    );
    assert_eq!(bodies[1]["e"], 4200);
    assert_eq!(bodies[1]["sd"], 25);
    assert_eq!(bodies[1]["p"], serde_json::json!({}));
    assert!(transport.sent.lock().unwrap().iter().all(|request| {
        request.endpoint.as_str() == "https://stats.example.net/api/event"
    }));
}

#[test]
fn queued_calls_replay_in_order_before_initial_pageview() {
    let host = FakeHost::new("https://example.com/");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);

    let mut queue = CommandBuffer::new();
    queue.push("signup", CallOptions::default());
    queue.push(
        "download",
        CallOptions::default().with_meta(serde_json::json!({ "file": "a.pdf" })),
    );
    assert_eq!(queue.len(), 2);
    tracker.start(queue);

    let bodies = transport.bodies();
    let names: Vec<&str> = bodies.iter().map(|body| body["n"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["signup", "download", "pageview"]);
    assert_eq!(bodies[1]["m"], r#"{"file":"a.pdf"}"#);

    // A second start does not replay or send another initial pageview.
    let mut again = CommandBuffer::new();
    again.push("late", CallOptions::default());
    tracker.start(again);
    assert_eq!(transport.bodies().len(), 3);
}

#[test]
fn queued_pageview_is_followed_by_initial_load_pageview() {
    let host = FakeHost::new("https://example.com/landing");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);

    let mut props = beacon_core::Props::new();
    props.insert("variant".to_string(), "b".to_string());
    let mut queue = CommandBuffer::new();
    queue.push("pageview", CallOptions::default().with_props(props));
    tracker.start(queue);

    let bodies = transport.bodies();
    assert_eq!(
        names_and_urls(&bodies),
        vec![
            ("pageview".to_string(), "https://example.com/landing".to_string()),
            ("pageview".to_string(), "https://example.com/landing".to_string()),
        ]
    );
    assert_eq!(bodies[0]["p"], serde_json::json!({ "variant": "b" }));
    assert_eq!(tracker.view().previous_pathname.as_deref(), Some("/landing"));

    host.edit(|page| page.now = 300);
    tracker.history_pushed();
    assert_eq!(transport.bodies().len(), 2);
}

#[test]
fn opted_out_visitor_still_gets_callback() {
    let host = FakeHost::new("https://example.com/");
    host.edit(|page| page.opt_out = Some("true".to_string()));
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);
    tracker.start(CommandBuffer::new());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    tracker.track(
        "pageview",
        CallOptions::default().with_callback(move |status| sink.lock().unwrap().push(status)),
    );

    assert_eq!(*seen.lock().unwrap(), vec![None]);
    assert!(transport.bodies().is_empty());
    assert!(!tracker.view().pageview_eligible);
}

#[test]
fn broken_storage_counts_as_no_opt_out() {
    let host = FakeHost::new("https://example.com/");
    host.edit(|page| page.storage_broken = true);
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);

    tracker.start(CommandBuffer::new());

    assert_eq!(transport.bodies().len(), 1);
}

#[test]
fn localhost_pages_are_ignored() {
    let host = FakeHost::new("http://localhost:8080/");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);

    tracker.start(CommandBuffer::new());
    tracker.track("signup", CallOptions::default());

    assert!(transport.bodies().is_empty());
}

#[test]
fn delivered_callback_receives_status() {
    let host = FakeHost::new("https://example.com/");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);
    tracker.start(CommandBuffer::new());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    tracker.track(
        "signup",
        CallOptions::default().with_callback(move |status| sink.lock().unwrap().push(status)),
    );

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some(DeliveryStatus { status: 202 })]
    );
}

#[test]
fn missing_transport_is_silent() {
    let host = FakeHost::new("https://example.com/");
    let transport = RecordingTransport {
        unavailable: true,
        ..RecordingTransport::default()
    };
    let mut tracker = tracker(&host, &transport);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    tracker.start(CommandBuffer::new());
    tracker.track(
        "signup",
        CallOptions::default().with_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    assert!(transport.bodies().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(tracker.view().pageview_eligible);
}

#[test]
fn visibility_observer_binds_once_across_pageviews() {
    let host = FakeHost::new("https://example.com/0");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);
    tracker.start(CommandBuffer::new());

    for step in 1..=4u64 {
        host.edit(|page| {
            page.now = step * 100;
            page.href = format!("https://example.com/{step}");
        });
        tracker.history_pushed();
    }
    tracker.popped_state();

    assert_eq!(tracker.host().binds.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.view().generation, 6);
}

#[test]
fn hidden_tab_flushes_and_debounce_clears_through_timers() {
    let host = FakeHost::new("https://example.com/article");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);
    tracker.start(CommandBuffer::new());

    host.edit(|page| {
        page.now = 800;
        page.scroll_y = 2000.0;
    });
    tracker.scrolled();
    host.edit(|page| {
        page.now = 1000;
        page.visibility = Visibility::Hidden;
    });
    tracker.visibility_changed();

    let bodies = transport.bodies();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[1]["n"], "engagement");
    assert_eq!(bodies[1]["sd"], 75);
    assert_eq!(bodies[1]["e"], 1000);
    assert!(tracker.view().is_debouncing);

    let (handle, delay, mode) = tracker.timers().scheduled[0];
    assert_eq!(delay, Duration::from_millis(300));
    assert_eq!(mode, TimerMode::Once);
    tracker.timer_fired(handle);
    assert!(!tracker.view().is_debouncing);
}

#[test]
fn back_forward_cache_restore_tracks_again() {
    let host = FakeHost::new("https://example.com/a");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);
    tracker.start(CommandBuffer::new());

    tracker.page_shown(false);
    assert_eq!(transport.bodies().len(), 1);

    host.edit(|page| page.now = 60_000);
    tracker.page_shown(true);
    let names: Vec<String> = names_and_urls(&transport.bodies())
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["pageview", "engagement", "pageview"]);
}

#[test]
fn load_schedules_settle_burst() {
    let host = FakeHost::new("https://example.com/");
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);
    tracker.start(CommandBuffer::new());

    tracker.loaded();
    let (handle, delay, mode) = tracker.timers().scheduled[0];
    assert_eq!(delay, Duration::from_millis(200));
    assert_eq!(mode, TimerMode::Repeating);

    for _ in 0..15 {
        tracker.timer_fired(handle);
    }
    assert_eq!(tracker.timers().cancelled, vec![handle]);
}

#[test]
fn prerendered_page_tracks_when_shown() {
    let host = FakeHost::new("https://example.com/");
    host.edit(|page| page.visibility = Visibility::Prerender);
    let transport = RecordingTransport::default();
    let mut tracker = tracker(&host, &transport);

    tracker.start(CommandBuffer::new());
    assert!(transport.bodies().is_empty());

    host.edit(|page| page.visibility = Visibility::Visible);
    tracker.visibility_changed();
    assert_eq!(transport.bodies().len(), 1);
}
