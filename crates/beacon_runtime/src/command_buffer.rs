use beacon_core::Props;

use crate::{DeliveryCallback, DeliveryStatus};

/// Options accepted by [`crate::Tracker::track`].
#[derive(Default)]
pub struct CallOptions {
    pub props: Option<Props>,
    pub meta: Option<serde_json::Value>,
    /// Invoked with the delivery status, or with `None` when the call was
    /// suppressed by the ignore policy.
    pub callback: Option<DeliveryCallback>,
}

impl CallOptions {
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_callback(
        mut self,
        callback: impl FnOnce(Option<DeliveryStatus>) + Send + 'static,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }
}

pub struct QueuedCall {
    pub name: String,
    pub options: CallOptions,
}

/// Calls recorded before the tracker exists, replayed in order by
/// [`crate::Tracker::start`].
#[derive(Default)]
pub struct CommandBuffer {
    calls: Vec<QueuedCall>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, options: CallOptions) {
        self.calls.push(QueuedCall {
            name: name.into(),
            options,
        });
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub(crate) fn into_calls(self) -> Vec<QueuedCall> {
        self.calls
    }
}
