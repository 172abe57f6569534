//! HTTP status line.

use http::{StatusCode, Version};

use crate::ensure;
use crate::protocol::{Headers, MalformedHeaderError, Message};

/// The `<Version> <Status> <Reason>` line opening a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    version: Version,
    status: StatusCode,
    reason: String,
}

impl StatusLine {
    /// Creates an HTTP/1.1 status line with the canonical reason phrase, or an
    /// empty one for codes that have none.
    pub fn new(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        Self { version: Version::HTTP_11, status, reason }
    }

    /// Creates an HTTP/1.1 status line with a custom reason phrase.
    pub fn with_reason<R: Into<String>>(status: StatusCode, reason: R) -> Result<Self, MalformedHeaderError> {
        let reason = reason.into();
        ensure!(
            !reason.bytes().any(|b| matches!(b, b'\r' | b'\n')),
            MalformedHeaderError::new(format!("reason phrase {reason:?} contains CR or LF"))
        );
        Ok(Self { version: Version::HTTP_11, status, reason })
    }

    pub(crate) fn from_parts(version: Version, status: StatusCode, reason: String) -> Self {
        Self { version, status, reason }
    }

    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A complete response: status line, headers and optional body.
pub type Response = Message<StatusLine>;

impl Response {
    /// Starts a response without headers or body.
    pub fn with_status(status: StatusCode) -> Self {
        Message::from_parts(StatusLine::new(status), Headers::new(), None)
    }

    pub fn status(&self) -> StatusCode {
        self.line().status()
    }
}
