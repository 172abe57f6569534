//! HTTP request line.

use http::{Method, Version};

use crate::ensure;
use crate::protocol::{Headers, MalformedHeaderError, Message};

/// The `<Method> <Target> <Version>` line opening a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: Method,
    target: String,
    version: Version,
}

impl RequestLine {
    /// Creates an HTTP/1.1 request line.
    ///
    /// The target is sent verbatim, it only has to be non-empty and free of
    /// CR, LF and spaces so it cannot break out of the start-line.
    pub fn new<T: Into<String>>(method: Method, target: T) -> Result<Self, MalformedHeaderError> {
        let target = target.into();
        ensure!(!target.is_empty(), MalformedHeaderError::new("empty request target"));
        ensure!(
            !target.bytes().any(|b| matches!(b, b'\r' | b'\n' | b' ')),
            MalformedHeaderError::new(format!("request target {target:?} contains CR, LF or space"))
        );
        Ok(Self { method, target, version: Version::HTTP_11 })
    }

    pub(crate) fn from_parts(method: Method, target: String, version: Version) -> Self {
        Self { method, target, version }
    }

    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

/// A complete request: request line, headers and optional body.
pub type Request = Message<RequestLine>;

impl Request {
    /// Starts a request without headers or body.
    pub fn new<T: Into<String>>(method: Method, target: T) -> Result<Self, MalformedHeaderError> {
        Ok(Message::from_parts(RequestLine::new(method, target)?, Headers::new(), None))
    }

    pub fn get<T: Into<String>>(target: T) -> Result<Self, MalformedHeaderError> {
        Self::new(Method::GET, target)
    }

    pub fn post<T: Into<String>>(target: T) -> Result<Self, MalformedHeaderError> {
        Self::new(Method::POST, target)
    }

    pub fn method(&self) -> &Method {
        self.line().method()
    }

    pub fn target(&self) -> &str {
        self.line().target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_must_not_break_the_line() {
        assert!(RequestLine::new(Method::GET, "/").is_ok());
        assert!(RequestLine::new(Method::GET, "/index?a=1&b=2").is_ok());
        assert!(RequestLine::new(Method::GET, "").is_err());
        assert!(RequestLine::new(Method::GET, "/ HTTP/1.1\r\nHost: evil").is_err());
        assert!(RequestLine::new(Method::GET, "/\n").is_err());
    }

    #[test]
    fn builder_defaults_to_http_11() {
        let request = Request::get("/").unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.target(), "/");
        assert_eq!(request.line().version(), Version::HTTP_11);
        assert!(request.body().is_none());
    }
}
