//! Connection session module
//!
//! A connection owns the two halves of a byte stream, the receive buffer and
//! decoder for what the peer sends, and an encode buffer for what goes out.
//!
//! # Components
//!
//! - [`Connection`]: lifecycle (`Open`, `HalfClosed`, `Closed`), pulled
//!   message reception and whole-message sends
//! - [`open`]: client side resolve and connect, bounded by a timeout
//! - [`ServerConnection`]: serves requests of one accepted connection with a
//!   [`Handler`](crate::handler::Handler), one response per request in order
//! - [`Observer`]: lifecycle hooks, [`TracingObserver`] logs them
//!
//! Reading and writing never happen concurrently on one connection; a
//! connection is driven by a single task.

mod connect;
mod message_writer;
mod observer;
mod server_connection;
mod session;

pub use connect::open;
pub use observer::{ConnectionInfo, Observer, Role, TracingObserver};
pub use server_connection::ServerConnection;
pub use session::{Connection, ConnectionState, TcpConnection};
