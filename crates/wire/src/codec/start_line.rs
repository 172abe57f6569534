//! Parsing and serialization of the first line of a message.
//!
//! The grammar of both start-lines is checked by `httparse`: the line is handed
//! to it followed by an empty header section, so `httparse` sees a complete
//! message head with zero headers and reports the method/target/version or
//! version/code/reason it found.

use std::io::Write;

use bytes::BytesMut;
use http::{Method, StatusCode, Version};
use httparse::Status;

use crate::codec::FastWrite;
use crate::protocol::{MalformedHeaderError, ProtocolError, RequestLine, StatusLine};

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// A start-line the message codecs can read and write.
pub trait StartLine: Sized {
    /// Parses a received start-line, without its CRLF.
    fn parse(line: &[u8]) -> Result<Self, ProtocolError>;

    /// Writes the start-line and its CRLF to `dst`.
    ///
    /// Nothing is written when an error is returned.
    fn encode(&self, dst: &mut BytesMut) -> Result<(), MalformedHeaderError>;
}

impl StartLine for RequestLine {
    fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let head = terminate(line);
        let mut req = httparse::Request::new(&mut []);

        match req.parse(&head) {
            Ok(Status::Complete(_)) => {}
            Ok(Status::Partial) => return Err(ProtocolError::invalid_start_line("incomplete request line")),
            Err(e) => return Err(ProtocolError::invalid_start_line(e)),
        }

        let method = req.method.ok_or_else(|| ProtocolError::invalid_start_line("missing method"))?;
        let method = Method::from_bytes(method.as_bytes()).map_err(ProtocolError::invalid_start_line)?;
        let target = req.path.ok_or_else(|| ProtocolError::invalid_start_line("missing request target"))?;
        let version = parse_version(req.version)?;

        Ok(RequestLine::from_parts(method, target.to_string(), version))
    }

    fn encode(&self, dst: &mut BytesMut) -> Result<(), MalformedHeaderError> {
        let version = version_str(self.version())?;
        write!(FastWrite(dst), "{} {} {}\r\n", self.method(), self.target(), version)
            .map_err(|e| MalformedHeaderError::new(format!("failed to write request line: {e}")))
    }
}

impl StartLine for StatusLine {
    fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let head = terminate(line);
        let mut resp = httparse::Response::new(&mut []);

        match resp.parse(&head) {
            Ok(Status::Complete(_)) => {}
            Ok(Status::Partial) => return Err(ProtocolError::invalid_start_line("incomplete status line")),
            Err(e) => return Err(ProtocolError::invalid_start_line(e)),
        }

        let version = parse_version(resp.version)?;
        let code = resp.code.ok_or_else(|| ProtocolError::invalid_start_line("missing status code"))?;
        let status = StatusCode::from_u16(code).map_err(ProtocolError::invalid_start_line)?;
        let reason = resp.reason.unwrap_or_default().to_string();

        Ok(StatusLine::from_parts(version, status, reason))
    }

    fn encode(&self, dst: &mut BytesMut) -> Result<(), MalformedHeaderError> {
        let version = version_str(self.version())?;
        write!(FastWrite(dst), "{} {} {}\r\n", version, self.status().as_str(), self.reason())
            .map_err(|e| MalformedHeaderError::new(format!("failed to write status line: {e}")))
    }
}

fn terminate(line: &[u8]) -> Vec<u8> {
    let mut head = Vec::with_capacity(line.len() + HEAD_TERMINATOR.len());
    head.extend_from_slice(line);
    head.extend_from_slice(HEAD_TERMINATOR);
    head
}

fn parse_version(version: Option<u8>) -> Result<Version, ProtocolError> {
    match version {
        Some(0) => Ok(Version::HTTP_10),
        Some(1) => Ok(Version::HTTP_11),
        v => Err(ProtocolError::invalid_start_line(format!("unsupported http version {v:?}"))),
    }
}

fn version_str(version: Version) -> Result<&'static str, MalformedHeaderError> {
    match version {
        Version::HTTP_10 => Ok("HTTP/1.0"),
        Version::HTTP_11 => Ok("HTTP/1.1"),
        v => Err(MalformedHeaderError::new(format!("unsupported http version {v:?}"))),
    }
}
