//! Beacon core: pure engagement state machine and payload types.
mod effect;
mod engagement;
mod geometry;
mod msg;
mod navigation;
mod options;
mod page;
mod payload;
mod state;
mod update;
mod view_model;
mod visibility;

pub use effect::{Effect, TimerHandle, TimerMode};
pub use engagement::{
    scroll_depth_percent, DEBOUNCE_WINDOW, ENGAGEMENT_DWELL_FLOOR_MS, ENGAGEMENT_EVENT,
};
pub use geometry::{
    document_height, scroll_offset, viewport_height, viewport_scroll_extent, ElementExtents,
    LayoutMetrics, SETTLE_INTERVAL, SETTLE_ITERATIONS,
};
pub use msg::Msg;
pub use navigation::NavigationPhase;
pub use options::{CallbackId, IgnoreReason, TrackOptions};
pub use page::{Location, PageSnapshot, Timestamp, Visibility};
pub use payload::{EngagementPayload, EventPayload, Payload, Props};
pub use state::{SessionState, PAGEVIEW_EVENT};
pub use update::update;
pub use view_model::SessionView;
