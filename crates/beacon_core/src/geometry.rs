//! Document height and scroll extent sampling.
//!
//! All functions are pure over a [`LayoutMetrics`] snapshot. Missing elements,
//! negative values and non-finite values all read as `0`, so a detached or
//! half-laid-out document yields zero-valued measurements instead of errors.

use std::time::Duration;

/// Delay between re-measurements of the document height after `load`.
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(200);
/// Number of re-measurements after `load` before the settle timer is cancelled.
pub const SETTLE_ITERATIONS: u32 = 15;

/// Extents reported by one element (`body` or the root element).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementExtents {
    pub scroll_height: f64,
    pub offset_height: f64,
    pub client_height: f64,
    pub scroll_top: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutMetrics {
    pub body: Option<ElementExtents>,
    pub root: Option<ElementExtents>,
    /// Window inner height, when the host exposes one.
    pub inner_height: Option<f64>,
    /// Window vertical scroll offset, when the host exposes one.
    pub scroll_y: Option<f64>,
}

fn metric(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// First usable (positive, finite) value in order of preference.
fn first_usable(candidates: impl IntoIterator<Item = Option<f64>>) -> f64 {
    candidates
        .into_iter()
        .flatten()
        .map(metric)
        .find(|value| *value > 0.0)
        .unwrap_or(0.0)
}

/// Largest of the scroll, offset and client heights of body and root.
pub fn document_height(layout: &LayoutMetrics) -> f64 {
    [layout.body, layout.root]
        .into_iter()
        .flatten()
        .flat_map(|el| [el.scroll_height, el.offset_height, el.client_height])
        .map(metric)
        .fold(0.0, f64::max)
}

pub fn viewport_height(layout: &LayoutMetrics) -> f64 {
    first_usable([
        layout.inner_height,
        layout.root.map(|root| root.client_height),
    ])
}

pub fn scroll_offset(layout: &LayoutMetrics) -> f64 {
    first_usable([
        layout.scroll_y,
        layout.root.map(|root| root.scroll_top),
        layout.body.map(|body| body.scroll_top),
    ])
}

/// Lowest document position currently inside the viewport.
///
/// A document that fits in one viewport counts as fully seen.
pub fn viewport_scroll_extent(layout: &LayoutMetrics) -> f64 {
    let height = document_height(layout);
    let viewport = viewport_height(layout);
    if height <= viewport {
        height
    } else {
        scroll_offset(layout) + viewport
    }
}
