use crate::engagement::Debounce;
use crate::geometry::{document_height, viewport_scroll_extent};
use crate::navigation::NavigationPhase;
use crate::view_model::SessionView;
use crate::visibility::VisibilityObserver;
use crate::{PageSnapshot, Props, TimerHandle};

/// Event name that starts a new pageview.
pub const PAGEVIEW_EVENT: &str = "pageview";

/// Report watermark for a pageview with no engagement record yet; below any
/// real extent, so its first flush always counts as scroll progress.
pub(crate) const UNREPORTED_SCROLL_POSITION: f64 = -1.0;

/// Re-measurement burst after `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SettleTimer {
    pub(crate) handle: TimerHandle,
    pub(crate) remaining: u32,
}

/// The one mutable record for a page's lifetime.
///
/// Fields are only reachable through [`SessionState::view`]; all mutation goes
/// through [`crate::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub(crate) domain: String,
    pub(crate) current_url: String,
    pub(crate) custom_properties: Props,
    pub(crate) pageview_eligible: bool,
    pub(crate) max_scroll_position: f64,
    pub(crate) last_reported_scroll_position: f64,
    pub(crate) document_height: f64,
    pub(crate) engagement_started_at: Option<crate::Timestamp>,
    pub(crate) accumulated_visible_ms: u64,
    pub(crate) debounce: Option<Debounce>,
    /// Written only by the navigation detector.
    pub(crate) previous_pathname: Option<String>,
    pub(crate) phase: NavigationPhase,
    /// Set once the initial-load transition has run.
    pub(crate) started: bool,
    /// Bumped on every accepted pageview.
    pub(crate) generation: u64,
    pub(crate) visibility: VisibilityObserver,
    pub(crate) settle: Option<SettleTimer>,
    next_timer: u64,
}

impl SessionState {
    /// Creates the session for a page, measuring its initial layout.
    pub fn new(domain: impl Into<String>, page: &PageSnapshot) -> Self {
        let max_scroll_position = viewport_scroll_extent(&page.layout);
        Self {
            domain: domain.into(),
            current_url: page.location.href.clone(),
            custom_properties: Props::new(),
            pageview_eligible: false,
            max_scroll_position,
            last_reported_scroll_position: UNREPORTED_SCROLL_POSITION,
            document_height: document_height(&page.layout),
            engagement_started_at: None,
            accumulated_visible_ms: 0,
            debounce: None,
            previous_pathname: None,
            phase: NavigationPhase::Idle,
            started: false,
            generation: 0,
            visibility: VisibilityObserver::default(),
            settle: None,
            next_timer: 0,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            domain: self.domain.clone(),
            current_url: self.current_url.clone(),
            custom_properties: self.custom_properties.clone(),
            pageview_eligible: self.pageview_eligible,
            max_scroll_position: self.max_scroll_position,
            last_reported_scroll_position: self.last_reported_scroll_position,
            document_height: self.document_height,
            engagement_started_at: self.engagement_started_at,
            accumulated_visible_ms: self.accumulated_visible_ms,
            is_debouncing: self.is_debouncing(),
            previous_pathname: self.previous_pathname.clone(),
            phase: self.phase,
            visibility_bound: self.visibility.is_bound(),
            generation: self.generation,
        }
    }

    pub fn is_debouncing(&self) -> bool {
        self.debounce.is_some()
    }

    pub(crate) fn allocate_timer(&mut self) -> TimerHandle {
        self.next_timer += 1;
        TimerHandle(self.next_timer)
    }

    /// Refreshes the document height and advances the scroll watermark.
    pub(crate) fn record_scroll(&mut self, page: &PageSnapshot) {
        self.document_height = document_height(&page.layout);
        let position = viewport_scroll_extent(&page.layout);
        if self.max_scroll_position < position {
            self.max_scroll_position = position;
        }
    }

    /// Re-measures geometry and resets both watermarks for a new pageview.
    pub(crate) fn reset_scroll(&mut self, page: &PageSnapshot) {
        self.document_height = document_height(&page.layout);
        self.max_scroll_position = viewport_scroll_extent(&page.layout);
        self.last_reported_scroll_position = UNREPORTED_SCROLL_POSITION;
    }
}
