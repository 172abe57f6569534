use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info, trace};

use crate::protocol::Error;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Which end of the exchange a connection plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends requests, decodes responses
    Client,
    /// Decodes requests, sends responses
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => f.write_str("client"),
            Role::Server => f.write_str("server"),
        }
    }
}

/// Identity of a connection as reported to an [`Observer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    id: u64,
    role: Role,
    peer: Option<SocketAddr>,
}

impl ConnectionInfo {
    /// Allocates a process-unique connection id.
    pub fn new(role: Role, peer: Option<SocketAddr>) -> Self {
        Self { id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed), role, peer }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

/// Lifecycle hooks of a connection.
///
/// Every method has an empty default body, implement the ones you care about.
/// For one connection, `on_open` comes first and at most one of `on_error` or
/// `on_close` ends the sequence. `on_end` fires at most once, when the peer
/// finished sending and every message before that point was delivered.
///
/// Callbacks run inline on the task driving the connection, keep them short.
pub trait Observer: Send + Sync {
    fn on_open(&self, _info: &ConnectionInfo) {}

    /// `len` bytes arrived from the peer.
    fn on_data(&self, _info: &ConnectionInfo, _len: usize) {}

    /// `len` bytes were handed to the transport.
    fn on_sent(&self, _info: &ConnectionInfo, _len: usize) {}

    /// A complete message was delivered to the caller.
    fn on_message(&self, _info: &ConnectionInfo) {}

    /// The peer half-closed cleanly.
    fn on_end(&self, _info: &ConnectionInfo) {}

    /// The connection failed and was torn down.
    fn on_error(&self, _info: &ConnectionInfo, _error: &Error) {}

    /// The connection was closed locally.
    fn on_close(&self, _info: &ConnectionInfo) {}
}

/// Default observer, reports every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_open(&self, info: &ConnectionInfo) {
        info!(conn_id = info.id, role = %info.role, peer = ?info.peer, "connection open");
    }

    fn on_data(&self, info: &ConnectionInfo, len: usize) {
        trace!(conn_id = info.id, len, "received bytes");
    }

    fn on_sent(&self, info: &ConnectionInfo, len: usize) {
        trace!(conn_id = info.id, len, "sent bytes");
    }

    fn on_message(&self, info: &ConnectionInfo) {
        debug!(conn_id = info.id, role = %info.role, "message received");
    }

    fn on_end(&self, info: &ConnectionInfo) {
        info!(conn_id = info.id, "peer finished sending");
    }

    fn on_error(&self, info: &ConnectionInfo, error: &Error) {
        error!(conn_id = info.id, peer = ?info.peer, cause = %error, "connection failed");
    }

    fn on_close(&self, info: &ConnectionInfo) {
        info!(conn_id = info.id, "connection closed");
    }
}
