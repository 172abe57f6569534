//! HTTP/1.1 message framing over a raw TCP connection
//!
//! This crate turns the byte stream of a TCP connection into complete HTTP/1.1
//! requests and responses, and serializes messages back into bytes. It is built
//! on top of tokio and uses the `tokio_util` codec traits, so the same decoders
//! work with this crate's connection session or with `Framed*` adapters.
//!
//! # Features
//!
//! - Request and response start-lines, ordered header fields, `Content-Length` bodies
//! - Any split of the incoming stream into chunks decodes the same messages
//! - Pipelining: several messages in flight per connection, answered in order
//! - Truncation detection when the peer half-closes mid-message
//! - Caller input validated before anything reaches the wire
//! - Connection lifecycle hooks through an [`Observer`](connection::Observer)
//!
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use micro_wire::config::ServerConfig;
//! use micro_wire::handler::{HandlerError, make_handler};
//! use micro_wire::protocol::{Request, Response};
//! use micro_wire::server::Server;
//! use tracing::{Level, error, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let server = match Server::bind(&ServerConfig::port(8124)).await {
//!         Ok(server) => server,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     server.serve(make_handler(hello_world)).await;
//! }
//!
//! async fn hello_world(request: Request) -> Result<Response, HandlerError> {
//!     info!(path = request.target(), "receiving request");
//!
//!     let response = Response::with_status(StatusCode::OK)
//!         .header("Content-Type", "text/plain")?
//!         .with_body("Hello World!");
//!     Ok(response)
//! }
//! ```
//!
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`protocol`]: Message types, header fields and the error taxonomy
//! - [`codec`]: Encoders and the incremental decoders
//! - [`connection`]: Connection session, lifecycle and observer hooks
//! - [`client`]: Pipelined request/response exchanges over one connection
//! - [`server`] and [`handler`]: Accept loop and request handlers
//! - [`config`]: Client and server settings
//!
//! # Error Handling
//!
//! [`protocol::Error`] is the top-level error, one variant per family:
//!
//! - [`protocol::ConnectionError`]: connecting, binding, transport failures
//! - [`protocol::MalformedHeaderError`]: invalid caller input, nothing was sent
//! - [`protocol::ProtocolError`]: the peer violated the message grammar
//! - [`protocol::TruncatedMessageError`]: the peer ended inside a message
//!
//! Decode failures are fatal for their connection; the byte stream is never
//! resynchronized.
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 framing only, no chunked transfer encoding
//! - A message without `Content-Length` has no body
//! - No TLS support
//! - Default maximum header size: 8KB
//! - Default maximum number of headers: 64

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
