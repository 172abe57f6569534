//! HTTP message decoder module
//!
//! This module reassembles complete messages from a byte stream that arrives in
//! chunks of arbitrary size. Chunk boundaries carry no meaning: the decoder only
//! looks at the bytes accumulated in its source buffer.
//!
//! # State Machine
//!
//! ```text
//!                       CRLF found                blank line, no Content-Length
//!  AwaitingStartLine ──────────────▶ AwaitingHeaders ─────────────────────────────▶ complete
//!          ▲                           │    ▲  header line                              │
//!          │                           │    └──────┘                                    │
//!          │                           │ blank line, Content-Length: n                  │
//!          │                           ▼                                                │
//!          │                     AwaitingBody(n) ── n bytes buffered ──▶ complete       │
//!          └────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A completed message is returned to the caller and the decoder starts over on
//! the bytes that are left, so several messages can share one buffer.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_wire::codec::ResponseDecoder;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = ResponseDecoder::new();
//! let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi"[..]);
//! let response = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(response.status(), 200);
//! assert_eq!(&response.body().unwrap()[..], b"hi");
//! ```

use std::mem;

use bytes::BytesMut;
use http::header;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::StartLine;
use crate::ensure;
use crate::protocol::{DecodeStage, Error, HeaderField, Headers, Message, ProtocolError, TruncatedMessageError};

/// Default maximum size in bytes of a start-line plus header section
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Default maximum number of header fields in one message
pub const DEFAULT_MAX_HEADER_NUM: usize = 64;

/// Size limits applied while the head of a message is being read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Limits {
    max_header_bytes: usize,
    max_headers: usize,
}

impl Limits {
    pub fn new(max_header_bytes: usize, max_headers: usize) -> Self {
        Self { max_header_bytes, max_headers }
    }

    pub fn max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    pub fn max_headers(&self) -> usize {
        self.max_headers
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_header_bytes: DEFAULT_MAX_HEADER_BYTES, max_headers: DEFAULT_MAX_HEADER_NUM }
    }
}

#[derive(Debug)]
enum DecodeState<L> {
    AwaitingStartLine,
    AwaitingHeaders(Message<L>),
    AwaitingBody(Message<L>, usize),
}

impl<L> DecodeState<L> {
    fn stage(&self) -> DecodeStage {
        match self {
            DecodeState::AwaitingStartLine => DecodeStage::StartLine,
            DecodeState::AwaitingHeaders(_) => DecodeStage::Headers,
            DecodeState::AwaitingBody(..) => DecodeStage::Body,
        }
    }
}

/// A decoder for HTTP/1.1 messages framed by `Content-Length`
///
/// `L` selects the start-line grammar: [`RequestDecoder`](crate::codec::RequestDecoder)
/// is used by servers and [`ResponseDecoder`](crate::codec::ResponseDecoder) by
/// clients.
#[derive(Debug)]
pub struct MessageDecoder<L> {
    state: DecodeState<L>,
    limits: Limits,
    /// bytes of the current message head consumed so far
    head_size: usize,
}

impl<L: StartLine> MessageDecoder<L> {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self { state: DecodeState::AwaitingStartLine, limits, head_size: 0 }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Returns true between messages, when no partial message is held.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, DecodeState::AwaitingStartLine)
    }

    /// Returns the stage of the message currently being assembled.
    pub fn stage(&self) -> DecodeStage {
        self.state.stage()
    }

    /// Drops any partially assembled message.
    pub fn reset(&mut self) {
        self.state = DecodeState::AwaitingStartLine;
        self.head_size = 0;
    }

    /// Splits the next CRLF terminated line off `src`, without the CRLF.
    fn take_line(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, ProtocolError> {
        let max_size = self.limits.max_header_bytes;
        let budget = max_size.saturating_sub(self.head_size);

        let Some(lf) = src.iter().position(|b| *b == b'\n') else {
            ensure!(src.len() <= budget, ProtocolError::too_large_header(self.head_size + src.len(), max_size));
            return Ok(None);
        };

        ensure!(lf < budget, ProtocolError::too_large_header(self.head_size + lf + 1, max_size));
        ensure!(lf > 0 && src[lf - 1] == b'\r', ProtocolError::invalid_header("line terminated by a bare LF"));

        let mut line = src.split_to(lf + 1);
        line.truncate(lf - 1);
        self.head_size += lf + 1;
        Ok(Some(line))
    }

    /// Runs the state machine until a message completes or `src` runs dry.
    fn advance(&mut self, src: &mut BytesMut) -> Result<Option<Message<L>>, Error> {
        loop {
            // the state is put back explicitly on every path that keeps a partial message
            self.state = match mem::replace(&mut self.state, DecodeState::AwaitingStartLine) {
                DecodeState::AwaitingStartLine => {
                    let Some(line) = self.take_line(src)? else {
                        return Ok(None);
                    };

                    // empty lines ahead of a start-line are ignored, RFC 9112 section 2.2,
                    // but they count against the head budget of the message that follows
                    if line.is_empty() {
                        continue;
                    }

                    let start_line = L::parse(&line)?;
                    trace!(line = %String::from_utf8_lossy(&line), "parsed start line");
                    DecodeState::AwaitingHeaders(Message::from_parts(start_line, Headers::new(), None))
                }

                DecodeState::AwaitingHeaders(mut message) => {
                    let Some(line) = self.take_line(src)? else {
                        self.state = DecodeState::AwaitingHeaders(message);
                        return Ok(None);
                    };

                    if line.is_empty() {
                        trace!(head_size = self.head_size, header_count = message.headers().len(), "parsed message head");
                        self.head_size = 0;
                        match Self::body_length(message.headers())? {
                            Some(length) => DecodeState::AwaitingBody(message, length),
                            None => return Ok(Some(message)),
                        }
                    } else {
                        let max_num = self.limits.max_headers;
                        ensure!(message.headers().len() < max_num, ProtocolError::too_many_headers(max_num).into());
                        message.headers_mut().push(HeaderField::parse_line(&line)?);
                        DecodeState::AwaitingHeaders(message)
                    }
                }

                DecodeState::AwaitingBody(mut message, length) => {
                    if src.len() < length {
                        self.state = DecodeState::AwaitingBody(message, length);
                        return Ok(None);
                    }

                    let body = src.split_to(length).freeze();
                    trace!(body_size = length, remaining = src.len(), "parsed message body");
                    message.set_body(Some(body));
                    return Ok(Some(message));
                }
            };
        }
    }

    /// Decides how the body of a message whose head is complete is framed.
    fn body_length(headers: &Headers) -> Result<Option<usize>, ProtocolError> {
        if let Some(value) = headers.get(header::TRANSFER_ENCODING.as_str()) {
            return Err(ProtocolError::UnsupportedTransferEncoding { value: String::from_utf8_lossy(value.as_bytes()).into_owned() });
        }

        match headers.content_length()? {
            Some(length) => {
                let length =
                    usize::try_from(length).map_err(|_e| ProtocolError::invalid_content_length(format!("{length} does not fit in memory")))?;
                Ok(Some(length))
            }
            None => Ok(None),
        }
    }
}

impl<L: StartLine> Default for MessageDecoder<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: StartLine> Decoder for MessageDecoder<L> {
    type Item = Message<L>;
    type Error = Error;

    /// Advances the state machine over the bytes buffered in `src`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))`: a complete message, its bytes are removed from `src`
    /// - `Ok(None)`: need more data to proceed, partial state is kept
    /// - `Err(_)`: the bytes are not a valid message, the stream can't be resynchronized
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let decoded = self.advance(src);
        if decoded.is_err() {
            self.reset();
        }
        decoded
    }

    /// Called once the peer ended its write side.
    ///
    /// Complete messages still buffered are returned first. Once none is left,
    /// any remaining byte or partially assembled message is a truncation.
    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(buf)? {
            return Ok(Some(message));
        }

        if self.is_idle() && buf.is_empty() {
            return Ok(None);
        }

        let error = TruncatedMessageError::new(self.stage(), buf.len());
        self.reset();
        buf.clear();
        Err(error.into())
    }
}
