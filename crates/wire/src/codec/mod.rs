//! HTTP codec module for encoding and decoding HTTP/1.1 messages
//!
//! This module turns [`Message`](crate::protocol::Message) values into wire bytes
//! and back. Both directions implement the `tokio_util` codec traits, so they
//! can be driven by the connection session of this crate or by
//! `tokio_util::codec::Framed*` adapters.
//!
//! # Architecture
//!
//! - Encoding:
//!   - [`RequestEncoder`] / [`ResponseEncoder`]: one message into one contiguous buffer
//!   - [`HeaderEncoder`]: header section and the `Content-Length` contract
//!
//! - Decoding:
//!   - [`RequestDecoder`] / [`ResponseDecoder`]: per-connection state machine,
//!     see [`MessageDecoder`]
//!   - [`ReceiveBuffer`]: bytes not yet assembled, plus the decoder working on them
//!
//! - Start-lines: the [`StartLine`] trait selects request or response grammar
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_wire::codec::{RequestDecoder, RequestEncoder};
//! use micro_wire::protocol::Request;
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let request = Request::post("/").unwrap().header("Host", "localhost:8124").unwrap().with_body("Hello");
//!
//! let mut buffer = BytesMut::new();
//! RequestEncoder::new().encode(&request, &mut buffer).unwrap();
//!
//! let decoded = RequestDecoder::new().decode(&mut buffer).unwrap();
//! assert_eq!(decoded.unwrap().body().unwrap(), "Hello");
//! ```

mod header;
mod message_decoder;
mod message_encoder;
mod receive_buffer;
mod start_line;

pub use header::HeaderEncoder;
pub use message_decoder::{DEFAULT_MAX_HEADER_BYTES, DEFAULT_MAX_HEADER_NUM, Limits, MessageDecoder};
pub use message_encoder::MessageEncoder;
pub use receive_buffer::ReceiveBuffer;
pub use start_line::StartLine;

pub(crate) use header::FastWrite;

use crate::protocol::{RequestLine, StatusLine};

/// Server side decoder of requests
pub type RequestDecoder = MessageDecoder<RequestLine>;

/// Client side decoder of responses
pub type ResponseDecoder = MessageDecoder<StatusLine>;

/// Client side encoder of requests
pub type RequestEncoder = MessageEncoder<RequestLine>;

/// Server side encoder of responses
pub type ResponseEncoder = MessageEncoder<StatusLine>;
