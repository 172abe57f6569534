//! Accept loop of the server side.
//!
//! Every accepted connection is served on its own task by a
//! [`ServerConnection`]; connections share nothing but the handler and the
//! observer.

use std::fmt;
use std::future::{Future, pending};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::codec::{Limits, RequestDecoder};
use crate::config::ServerConfig;
use crate::connection::{Connection, ConnectionInfo, Observer, Role, ServerConnection, TracingObserver};
use crate::handler::Handler;
use crate::protocol::{ConnectionError, Error};

pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    limits: Limits,
    observer: Arc<dyn Observer>,
}

impl Server {
    /// Binds the configured address; port 0 picks a free port.
    pub async fn bind(config: &ServerConfig) -> Result<Self, Error> {
        let addr = config.addr();
        let listener = TcpListener::bind(addr).await.map_err(|source| ConnectionError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(ConnectionError::io)?;

        info!(%local_addr, "start listening");
        Ok(Self { listener, local_addr, limits: config.limits(), observer: Arc::new(TracingObserver) })
    }

    /// Replaces the [`TracingObserver`] used for every accepted connection.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until the task is dropped.
    pub async fn serve<H>(self, handler: H)
    where
        H: Handler + Sync + 'static,
    {
        self.serve_with_shutdown(handler, pending()).await;
    }

    /// Accepts connections until `signal` completes.
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn serve_with_shutdown<H, F>(self, handler: H, signal: F)
    where
        H: Handler + Sync + 'static,
        F: Future<Output = ()>,
    {
        let handler = Arc::new(handler);
        tokio::pin!(signal);

        loop {
            let (tcp_stream, remote_addr) = tokio::select! {
                () = &mut signal => {
                    info!(local_addr = %self.local_addr, "shutdown signal received, stop accepting");
                    return;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            let handler = Arc::clone(&handler);
            let observer = Arc::clone(&self.observer);
            let limits = self.limits;

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let info = ConnectionInfo::new(Role::Server, Some(remote_addr));
                let connection = Connection::new(reader, writer, RequestDecoder::with_limits(limits), info, observer);

                match ServerConnection::new(connection).process(handler).await {
                    Ok(()) => {
                        info!(peer = %remote_addr, "finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!(peer = %remote_addr, "service has error, cause {}, connection shutdown", e);
                    }
                }
            });
        }
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server").field("local_addr", &self.local_addr).field("limits", &self.limits).finish_non_exhaustive()
    }
}
