use crate::Props;

/// Identifies a caller-supplied completion callback held by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub u64);

/// Recognized options for a tracking call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackOptions {
    /// Custom properties, sent as `p`.
    pub props: Option<Props>,
    /// Arbitrary metadata, serialized to a JSON string and sent as `m`.
    pub meta: Option<serde_json::Value>,
    pub callback: Option<CallbackId>,
}

impl TrackOptions {
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_callback(mut self, callback: CallbackId) -> Self {
        self.callback = Some(callback);
        self
    }
}

/// Why the ignore gate suppressed a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Loopback host or `file:` page.
    Localhost,
    /// Headless browser or test framework without the override flag.
    Automation,
    /// The visitor set the opt-out storage flag.
    OptOut,
}

impl IgnoreReason {
    /// Reason reported in the log, if this kind of suppression is reported at all.
    pub fn log_reason(self) -> Option<&'static str> {
        match self {
            IgnoreReason::Localhost => Some("localhost"),
            IgnoreReason::Automation => None,
            IgnoreReason::OptOut => Some("localStorage flag"),
        }
    }
}
