use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::codec::ResponseDecoder;
use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionInfo, Observer, Role, TcpConnection};
use crate::protocol::ConnectionError;

/// Resolves the configured host and connects to it as a client.
///
/// Each resolved address is tried in order and the last failure is reported.
/// The whole attempt, resolution included, is bounded by
/// [`ClientConfig::connect_timeout`].
pub async fn open(config: &ClientConfig, observer: Arc<dyn Observer>) -> Result<TcpConnection<ResponseDecoder>, ConnectionError> {
    let (host, port) = (config.host(), config.port());
    debug!(host, port, "connecting");

    let stream = bounded(host, port, config.connect_timeout(), connect(host, port)).await?;

    let peer = stream.peer_addr().ok();
    info!(host, port, peer = ?peer, "connected");

    let (reader, writer) = stream.into_split();
    let decoder = ResponseDecoder::with_limits(config.limits());
    Ok(Connection::new(reader, writer, decoder, ConnectionInfo::new(Role::Client, peer), observer))
}

/// Runs `connecting` under `limit`, running out of time is a [`ConnectionError::Timeout`].
async fn bounded<T, F>(host: &str, port: u16, limit: Duration, connecting: F) -> Result<T, ConnectionError>
where
    F: Future<Output = Result<T, ConnectionError>>,
{
    match timeout(limit, connecting).await {
        Ok(result) => result,
        Err(_elapsed) => {
            debug!(host, port, ?limit, "connect timed out");
            Err(ConnectionError::Timeout { host: host.to_string(), port, timeout: limit })
        }
    }
}

async fn connect(host: &str, port: u16) -> Result<TcpStream, ConnectionError> {
    let addrs = lookup_host((host, port)).await.map_err(|source| ConnectionError::Resolve { host: host.to_string(), source })?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                debug!(%addr, "connection refused");
                last_error = Some(ConnectionError::Refused { addr });
            }
            Err(e) => {
                debug!(%addr, cause = %e, "connect failed");
                last_error = Some(ConnectionError::io(e));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ConnectionError::NoAddress { host: host.to_string() }))
}
