use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Top-level error of the crate.
///
/// Codecs and connection sessions share this type so a single `?` carries any
/// failure from the wire up to the component driving the connection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connection error: {source}")]
    Connection {
        #[from]
        source: ConnectionError,
    },

    #[error("malformed header: {source}")]
    MalformedHeader {
        #[from]
        source: MalformedHeaderError,
    },

    #[error("protocol error: {source}")]
    Protocol {
        #[from]
        source: ProtocolError,
    },

    #[error("truncated message: {source}")]
    Truncated {
        #[from]
        source: TruncatedMessageError,
    },
}

impl Error {
    /// Returns true if this error was raised while decoding received bytes.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::Protocol { .. } | Error::Truncated { .. })
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Connection { source: ConnectionError::io(e) }
    }
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("failed to resolve {host}: {source}")]
    Resolve { host: String, source: io::Error },

    #[error("no address found for {host}")]
    NoAddress { host: String },

    #[error("connection refused by {addr}")]
    Refused { addr: SocketAddr },

    #[error("connect to {host}:{port} timed out after {timeout:?}")]
    Timeout { host: String, port: u16, timeout: Duration },

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("connection is closed")]
    Closed,

    #[error("peer closed the connection with {pending} exchange(s) in flight")]
    PeerClosed { pending: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ConnectionError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Invalid start-line or header content supplied by the caller.
///
/// Raised before any byte reaches the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct MalformedHeaderError {
    reason: String,
}

impl MalformedHeaderError {
    pub fn new<S: ToString>(reason: S) -> Self {
        Self { reason: reason.to_string() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid start line: {reason}")]
    InvalidStartLine { reason: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("conflicting content-length headers: {first} and {second}")]
    ConflictingContentLength { first: u64, second: u64 },

    #[error("unsupported transfer-encoding: {value}")]
    UnsupportedTransferEncoding { value: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("received a response with no request in flight")]
    UnsolicitedResponse,

    #[error("{pending} exchange(s) still in flight")]
    PendingExchanges { pending: usize },
}

impl ProtocolError {
    pub fn invalid_start_line<S: ToString>(str: S) -> Self {
        Self::InvalidStartLine { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }
}

/// The decoder stage a message was cut off in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeStage {
    StartLine,
    Headers,
    Body,
}

impl std::fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            DecodeStage::StartLine => "start line",
            DecodeStage::Headers => "headers",
            DecodeStage::Body => "body",
        };
        f.write_str(stage)
    }
}

/// The peer ended its write side while a message was only partially received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("peer closed while reading {stage}, {buffered} byte(s) left unassembled")]
pub struct TruncatedMessageError {
    stage: DecodeStage,
    buffered: usize,
}

impl TruncatedMessageError {
    pub fn new(stage: DecodeStage, buffered: usize) -> Self {
        Self { stage, buffered }
    }

    pub fn stage(&self) -> DecodeStage {
        self.stage
    }

    pub fn buffered(&self) -> usize {
        self.buffered
    }
}
