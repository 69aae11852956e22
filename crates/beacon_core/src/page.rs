use url::Url;

use crate::LayoutMetrics;

/// Milliseconds on the host's clock. Only differences are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`; zero if the clock went backwards.
    pub fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    /// Loaded speculatively; not yet shown to the visitor.
    Prerender,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub href: String,
    pub pathname: String,
    pub hostname: String,
    /// Scheme with trailing colon, e.g. `https:`.
    pub protocol: String,
}

impl Location {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(href)?;
        Ok(Self {
            href: url.to_string(),
            pathname: url.path().to_string(),
            hostname: url.host_str().unwrap_or_default().to_string(),
            protocol: format!("{}:", url.scheme()),
        })
    }
}

/// Everything the host observed at the moment an event fired.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSnapshot {
    pub now: Timestamp,
    pub location: Location,
    pub referrer: Option<String>,
    pub visibility: Visibility,
    pub layout: LayoutMetrics,
    /// Result of the ignore gate, when the host evaluated it for this event.
    pub suppressed: Option<crate::IgnoreReason>,
}
