//! Outbound payloads handed to the dispatch boundary.
//!
//! Field names follow the collector's compact wire format: `n` name, `u` url,
//! `d` domain, `r` referrer, `m` metadata, `p` props, `sd` scroll depth and
//! `e` engaged milliseconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Props = BTreeMap<String, String>;

/// Pageview or custom event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "u")]
    pub url: String,
    #[serde(rename = "d")]
    pub domain: String,
    #[serde(rename = "r")]
    pub referrer: Option<String>,
    #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Props>,
}

/// Scroll depth and visible dwell time for one pageview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementPayload {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "sd")]
    pub scroll_depth: u8,
    #[serde(rename = "d")]
    pub domain: String,
    #[serde(rename = "u")]
    pub url: String,
    #[serde(rename = "p")]
    pub props: Props,
    #[serde(rename = "e")]
    pub engaged_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Engagement(EngagementPayload),
    Event(EventPayload),
}

impl Payload {
    pub fn name(&self) -> &str {
        match self {
            Payload::Engagement(payload) => &payload.name,
            Payload::Event(payload) => &payload.name,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Payload::Engagement(payload) => &payload.url,
            Payload::Event(payload) => &payload.url,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
