//! Error bodies (RFC 7807 Problem Details).

use serde::{Deserialize, Serialize};

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,

    pub title: String,

    pub status: u16,

    /// Client-facing explanation. Carries the domain message of a 400.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn title_for(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Internal Server Error",
    }
}

impl ErrorResponse {
    /// Body for `status` with its canonical title and no detail.
    pub fn for_status(status: u16) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title_for(status).to_string(),
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::for_status(400).with_detail(detail)
    }

    pub fn unauthorized() -> Self {
        Self::for_status(401).with_detail("Authentication credentials were not provided or are invalid.")
    }

    pub fn forbidden() -> Self {
        Self::for_status(403).with_detail("Only the author may modify this post.")
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::for_status(404).with_detail(detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::for_status(409).with_detail(detail)
    }

    /// Never includes the underlying cause.
    pub fn internal_error() -> Self {
        Self::for_status(500)
    }
}
