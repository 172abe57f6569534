//! Client and server settings.
//!
//! Both configs are plain values built with chained `with_*` calls; anything
//! not set keeps its default.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::codec::Limits;

/// Bound on resolving and connecting, together
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    host: String,
    port: u16,
    connect_timeout: Duration,
    limits: Limits,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, connect_timeout: DEFAULT_CONNECT_TIMEOUT, limits: Limits::default() }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Limits applied when decoding responses
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    addr: SocketAddr,
    limits: Limits,
}

impl ServerConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, limits: Limits::default() }
    }

    /// Listens on every IPv4 interface.
    pub fn port(port: u16) -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Limits applied when decoding requests
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }
}
