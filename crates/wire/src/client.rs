//! Client side of a connection.
//!
//! Requests can be pipelined: [`Client::send`] writes a request without
//! waiting, and [`Client::recv`] pairs each response with the oldest request
//! still waiting for one.

use std::collections::VecDeque;
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::config::ClientConfig;
use crate::connection::{ConnectionInfo, ConnectionState, Observer, TcpConnection, TracingObserver, open};
use crate::protocol::{ConnectionError, Error, ProtocolError, Request, Response};

/// A request that was sent and is waiting for its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    id: u64,
    method: Method,
    target: String,
}

impl Exchange {
    /// Position of the request on its connection, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[derive(Debug)]
pub struct Client {
    connection: TcpConnection<ResponseDecoder>,
    encoder: RequestEncoder,
    in_flight: VecDeque<Exchange>,
    sent: u64,
}

impl Client {
    /// Connects with the [`TracingObserver`].
    pub async fn connect(config: &ClientConfig) -> Result<Self, Error> {
        Self::connect_with_observer(config, Arc::new(TracingObserver)).await
    }

    pub async fn connect_with_observer(config: &ClientConfig, observer: Arc<dyn Observer>) -> Result<Self, Error> {
        let connection = open(config, observer).await?;
        Ok(Self { connection, encoder: RequestEncoder::new(), in_flight: VecDeque::new(), sent: 0 })
    }

    /// Writes `request` without waiting for earlier responses.
    ///
    /// A request that can't be encoded is rejected before anything is written
    /// and does not count as in flight.
    pub async fn send(&mut self, request: &Request) -> Result<Exchange, Error> {
        self.connection.send_message(&mut self.encoder, request).await?;

        self.sent += 1;
        let exchange = Exchange { id: self.sent, method: request.method().clone(), target: request.target().to_string() };
        debug!(conn_id = self.connection.info().id(), exchange = exchange.id, method = %exchange.method, path = %exchange.target, "request sent");
        self.in_flight.push_back(exchange.clone());
        Ok(exchange)
    }

    /// Waits for the next response and the request it answers.
    ///
    /// Returns `Ok(None)` once the server finished sending with nothing in
    /// flight. A response nobody asked for is a protocol error that closes
    /// the connection, and so is the server finishing while requests are still
    /// waiting. After any error nothing is left in flight.
    pub async fn recv(&mut self) -> Result<Option<(Exchange, Response)>, Error> {
        let received = match self.connection.recv().await {
            Ok(received) => received,
            Err(e) => {
                // a failed connection answers none of the outstanding requests
                self.in_flight.clear();
                return Err(e);
            }
        };

        match received {
            Some(response) => match self.in_flight.pop_front() {
                Some(exchange) => {
                    debug!(exchange = exchange.id, status = %response.status(), "response received");
                    Ok(Some((exchange, response)))
                }
                None => {
                    warn!(conn_id = self.connection.info().id(), status = %response.status(), "unsolicited response");
                    Err(self.connection.abort(ProtocolError::UnsolicitedResponse.into()))
                }
            },
            None if self.in_flight.is_empty() => Ok(None),
            None => {
                let pending = self.in_flight.len();
                self.in_flight.clear();
                self.connection.close().await;
                Err(ConnectionError::PeerClosed { pending }.into())
            }
        }
    }

    /// Sends `request` and waits for its response.
    ///
    /// Only valid with nothing else in flight, otherwise the next response
    /// would belong to an earlier request.
    pub async fn exchange(&mut self, request: &Request) -> Result<Response, Error> {
        if !self.in_flight.is_empty() {
            return Err(ProtocolError::PendingExchanges { pending: self.in_flight.len() }.into());
        }

        self.send(request).await?;
        match self.recv().await? {
            Some((_exchange, response)) => Ok(response),
            None => Err(ConnectionError::PeerClosed { pending: 1 }.into()),
        }
    }

    /// Tells the server no more requests follow, responses can still be read.
    pub async fn shutdown_write(&mut self) -> Result<(), Error> {
        self.connection.shutdown_write().await
    }

    pub async fn close(&mut self) {
        self.in_flight.clear();
        self.connection.close().await;
    }

    /// Requests sent and not yet answered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn info(&self) -> &ConnectionInfo {
        self.connection.info()
    }
}
