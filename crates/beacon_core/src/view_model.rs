use crate::{NavigationPhase, Props, Timestamp};

/// Read-only copy of the session, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionView {
    pub domain: String,
    pub current_url: String,
    pub custom_properties: Props,
    pub pageview_eligible: bool,
    pub max_scroll_position: f64,
    pub last_reported_scroll_position: f64,
    pub document_height: f64,
    pub engagement_started_at: Option<Timestamp>,
    pub accumulated_visible_ms: u64,
    pub is_debouncing: bool,
    pub previous_pathname: Option<String>,
    pub phase: NavigationPhase,
    pub visibility_bound: bool,
    pub generation: u64,
}
