//! Trusted-origin derivation and message classification

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use super::messages::WidgetMessage;

/// Target origin that matches any recipient
pub const WILDCARD: &str = "*";

/// A configured URL that could not be parsed
#[derive(Debug, Error)]
#[error("Invalid widget URL '{url}': {reason}")]
pub struct InvalidUrl {
    pub url: String,
    pub reason: String,
}

/// Serialized origin (`scheme://host[:port]`) of an absolute URL
///
/// URLs with opaque origins (e.g. `data:`) serialize as `"null"`.
pub fn origin_of(url: &str) -> Result<String, InvalidUrl> {
    Url::parse(url)
        .map(|parsed| parsed.origin().ascii_serialization())
        .map_err(|e| InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Origin a side accepts messages from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustedOrigin {
    /// Only messages from exactly this origin
    Exact(String),
    /// Any origin; used when the endpoint could not be parsed
    Any,
}

impl TrustedOrigin {
    /// Derive the trusted origin from a configured endpoint
    ///
    /// Never fails: a malformed endpoint is logged and degrades to [`TrustedOrigin::Any`].
    pub fn from_endpoint(endpoint: &str) -> Self {
        match origin_of(endpoint) {
            Ok(origin) => {
                debug!(%endpoint, %origin, "TrustedOrigin::from_endpoint: derived origin");
                TrustedOrigin::Exact(origin)
            }
            Err(e) => {
                error!(error = %e, "Invalid widget URL, accepting messages from any origin");
                TrustedOrigin::Any
            }
        }
    }

    /// Whether a message from `origin` passes validation
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            TrustedOrigin::Exact(expected) => expected == origin,
            TrustedOrigin::Any => true,
        }
    }

    /// Target origin to use when posting to the trusted side
    pub fn as_target(&self) -> &str {
        match self {
            TrustedOrigin::Exact(origin) => origin,
            TrustedOrigin::Any => WILDCARD,
        }
    }
}

impl std::fmt::Display for TrustedOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_target())
    }
}

/// What a receiver should do with an incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Reset,
    Close,
    Ignore,
}

/// Validate the sender and decode the payload in one step
///
/// Messages from untrusted origins and payloads that are not ours are both
/// [`Signal::Ignore`].
pub fn classify(trusted: &TrustedOrigin, origin: &str, payload: &Value) -> Signal {
    if !trusted.matches(origin) {
        debug!(%origin, %trusted, "classify: origin mismatch, ignoring");
        return Signal::Ignore;
    }
    match WidgetMessage::from_value(payload) {
        Some(WidgetMessage::Reset) => Signal::Reset,
        Some(WidgetMessage::Close) => Signal::Close,
        None => Signal::Ignore,
    }
}
