use std::sync::Arc;

use http::{HeaderValue, StatusCode};
use http::header::CONTENT_TYPE;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::connection::Connection;
use crate::handler::Handler;
use crate::protocol::{Error, HeaderField, Request, Response};

/// Serves the requests arriving on one accepted connection.
///
/// Requests are handled one at a time in arrival order, so pipelined requests
/// get their responses in the order they were sent.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct ServerConnection<R, W> {
    connection: Connection<R, W, RequestDecoder>,
    encoder: ResponseEncoder,
}

impl<R, W> ServerConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(connection: Connection<R, W, RequestDecoder>) -> Self {
        Self { connection, encoder: ResponseEncoder::new() }
    }

    /// Runs until the peer finishes sending or the connection fails.
    ///
    /// A clean half-close by the peer closes the connection and returns
    /// `Ok(())`. A request that fails to decode closes the connection without
    /// a response and the error is returned.
    pub async fn process<H: Handler>(mut self, handler: Arc<H>) -> Result<(), Error> {
        loop {
            match self.connection.recv().await {
                Ok(Some(request)) => {
                    if let Err(e) = self.do_process(request, &handler).await {
                        self.connection.close().await;
                        return Err(e);
                    }
                }

                Ok(None) => {
                    info!(conn_id = self.connection.info().id(), "cant read more request, break this connection down");
                    self.connection.close().await;
                    return Ok(());
                }

                Err(e) if e.is_decode_error() => {
                    warn!(conn_id = self.connection.info().id(), cause = %e, "peer sent a malformed request, dropping connection");
                    self.connection.close().await;
                    return Err(e);
                }

                Err(e) => {
                    error!(conn_id = self.connection.info().id(), cause = %e, "can't receive next request");
                    self.connection.close().await;
                    return Err(e);
                }
            }
        }
    }

    async fn do_process<H: Handler>(&mut self, request: Request, handler: &Arc<H>) -> Result<(), Error> {
        debug!(method = %request.method(), path = request.target(), "receive request");

        let response = match handler.call(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("handle response error, cause: {}", e);
                build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        match self.connection.send_message(&mut self.encoder, &response).await {
            Err(Error::MalformedHeader { source }) => {
                error!(cause = %source, "handler built a response that can't be encoded");
                let error_response = build_error_response(StatusCode::INTERNAL_SERVER_ERROR);
                self.connection.send_message(&mut self.encoder, &error_response).await
            }
            result => result,
        }
    }
}

fn build_error_response(status_code: StatusCode) -> Response {
    let body = status_code.canonical_reason().unwrap_or("error");
    let mut response = Response::with_status(status_code).with_body(body);
    response.headers_mut().push(HeaderField::from((CONTENT_TYPE, HeaderValue::from_static("text/plain"))));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionInfo, Role, TracingObserver};
    use crate::handler::{HandlerError, make_handler};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex, split};

    async fn serve(input: &[u8], handler: impl Handler) -> (Result<(), Error>, String) {
        let (local, mut remote) = duplex(4096);
        let (reader, writer) = split(local);
        let info = ConnectionInfo::new(Role::Server, None);
        let connection = Connection::new(reader, writer, RequestDecoder::new(), info, Arc::new(TracingObserver));

        remote.write_all(input).await.unwrap();
        remote.shutdown().await.unwrap();

        let result = ServerConnection::new(connection).process(Arc::new(handler)).await;
        let mut output = String::new();
        remote.read_to_string(&mut output).await.unwrap();
        (result, output)
    }

    async fn hello(_request: Request) -> Result<Response, HandlerError> {
        Ok(Response::with_status(StatusCode::OK).header("Content-Type", "text/plain")?.with_body("Hello World!"))
    }

    async fn fail(_request: Request) -> Result<Response, HandlerError> {
        Err("no way".into())
    }

    async fn echo_target(request: Request) -> Result<Response, HandlerError> {
        Ok(Response::with_status(StatusCode::OK).with_body(request.target().to_string()))
    }

    #[tokio::test]
    async fn hello_world() {
        let (result, output) = serve(b"GET / HTTP/1.1\r\nHost: localhost:8124\r\n\r\n", make_handler(hello)).await;

        assert!(result.is_ok());
        assert_eq!(output, "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 12\r\n\r\nHello World!");
    }

    #[tokio::test]
    async fn pipelined_requests_answered_in_order() {
        let input = b"GET /a HTTP/1.1\r\n\r\nGET /bb HTTP/1.1\r\n\r\nGET /ccc HTTP/1.1\r\n\r\n";
        let (result, output) = serve(input, make_handler(echo_target)).await;

        assert!(result.is_ok());
        let a = output.find("/a").unwrap();
        let bb = output.find("/bb").unwrap();
        let ccc = output.find("/ccc").unwrap();
        assert!(a < bb && bb < ccc);
        assert_eq!(output.matches("HTTP/1.1 200 OK").count(), 3);
    }

    #[tokio::test]
    async fn handler_error_becomes_500() {
        let (result, output) = serve(b"GET / HTTP/1.1\r\n\r\n", make_handler(fail)).await;

        assert!(result.is_ok());
        assert!(output.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(output.ends_with("\r\n\r\nInternal Server Error"));
    }

    #[tokio::test]
    async fn malformed_request_gets_no_response() {
        let (result, output) = serve(b"GET / HTTP/1.1\r\nBad Header\r\n\r\n", make_handler(hello)).await;

        assert!(matches!(result, Err(Error::Protocol { .. })));
        assert!(result.is_err_and(|e| e.is_decode_error()));
        assert!(output.is_empty());
    }
}
