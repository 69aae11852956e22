use beacon_core::IgnoreReason;
use beacon_logging::beacon_debug;

use crate::{AutomationFlags, StorageError};

/// Inputs to the ignore decision for one call.
#[derive(Debug)]
pub struct IgnoreContext<'a> {
    pub hostname: &'a str,
    pub protocol: &'a str,
    pub automation: AutomationFlags,
    pub opt_out: Result<Option<String>, StorageError>,
}

pub trait IgnorePolicy {
    /// Returns why the call must be suppressed, or `None` to let it through.
    fn check(&self, context: &IgnoreContext<'_>) -> Option<IgnoreReason>;
}

/// Suppresses local pages, automated browsers and visitors who opted out.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardIgnorePolicy;

impl IgnorePolicy for StandardIgnorePolicy {
    fn check(&self, context: &IgnoreContext<'_>) -> Option<IgnoreReason> {
        if is_loopback_host(context.hostname) || context.protocol == "file:" {
            return Some(IgnoreReason::Localhost);
        }
        if context.automation.is_automated() && !context.automation.tracking_override {
            return Some(IgnoreReason::Automation);
        }
        match &context.opt_out {
            Ok(Some(flag)) if flag == "true" => Some(IgnoreReason::OptOut),
            Ok(_) => None,
            Err(err) => {
                beacon_debug!("opt-out lookup failed, treating as absent: {}", err);
                None
            }
        }
    }
}

/// `localhost`, `127.x`, `127.x.y`, `127.x.y.z`, `[::1]` or `[::]`.
pub fn is_loopback_host(hostname: &str) -> bool {
    if hostname == "localhost" || hostname == "[::1]" || hostname == "[::]" {
        return true;
    }
    let mut parts = hostname.split('.');
    if parts.next() != Some("127") {
        return false;
    }
    let rest: Vec<&str> = parts.collect();
    (1..=3).contains(&rest.len())
        && rest
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}
