//! Core HTTP/1.1 message types and errors.
//!
//! # Architecture
//!
//! - **Messages** ([`message`]): [`Message`] pairs a start-line with ordered
//!   [`Headers`] and an optional body
//!   - [`Request`] / [`RequestLine`]: `<Method> <Target> <Version>`
//!   - [`Response`] / [`StatusLine`]: `<Version> <Status> <Reason>`
//!
//! - **Headers** ([`header`]): [`HeaderField`] keeps the received spelling of a
//!   name while comparing names case-insensitively
//!
//! - **Error Handling** ([`error`]):
//!   - [`Error`]: Top-level error type
//!   - [`ConnectionError`]: transport could not be established or maintained
//!   - [`MalformedHeaderError`]: caller supplied content that would break framing
//!   - [`ProtocolError`]: received bytes are not a valid message
//!   - [`TruncatedMessageError`]: peer closed in the middle of a message
//!
//! Invalid header or start-line content is rejected when it is constructed, so
//! encoding a [`Message`] only fails for a version other than HTTP/1.0 or 1.1.

mod message;
pub use message::Message;

mod header;
pub use header::HeaderField;
pub use header::Headers;

mod request;
pub use request::Request;
pub use request::RequestLine;

mod response;
pub use response::Response;
pub use response::StatusLine;

mod error;
pub use error::ConnectionError;
pub use error::DecodeStage;
pub use error::Error;
pub use error::MalformedHeaderError;
pub use error::ProtocolError;
pub use error::TruncatedMessageError;
