//! HTTP header section encoding.
//!
//! Decoding happens line by line inside the message decoder state machine, see
//! [`MessageDecoder`](crate::codec::MessageDecoder); this module only holds
//! the serializing half.
//!
//! - [`HeaderEncoder`]: Encodes the header section to bytes
//!   - Keeps field order and name spelling
//!   - Owns the `Content-Length` of messages that carry a body

mod header_encoder;

pub use header_encoder::HeaderEncoder;
pub(crate) use header_encoder::FastWrite;
