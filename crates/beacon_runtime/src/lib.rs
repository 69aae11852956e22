//! Beacon runtime: host bindings, ignore policy, delivery and effect execution.
mod command_buffer;
mod config;
mod host;
mod ignore;
mod tracker;
mod transport;

pub use command_buffer::{CallOptions, CommandBuffer, QueuedCall};
pub use config::{ConfigError, TrackerConfig, DEFAULT_EVENT_PATH};
pub use host::{AutomationFlags, Host, StorageError, Timers};
pub use ignore::{is_loopback_host, IgnoreContext, IgnorePolicy, StandardIgnorePolicy};
pub use tracker::{NavigationObserver, Tracker};
pub use transport::{
    BeaconRequest, DeliveryCallback, DeliveryStatus, PostSettings, Poster, QueuedTransport,
    ReqwestPoster, Transport, TransportError,
};
