use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::{SinkExt, StreamExt};
use http::StatusCode;
use micro_wire::client::Client;
use micro_wire::codec::{RequestEncoder, ResponseDecoder};
use micro_wire::config::{ClientConfig, ServerConfig};
use micro_wire::connection::{ConnectionInfo, ConnectionState, Observer};
use micro_wire::handler::{Handler, HandlerError, make_handler};
use micro_wire::protocol::{ConnectionError, DecodeStage, Error, ProtocolError, Request, Response};
use micro_wire::server::Server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

#[derive(Debug, Default)]
struct CountingObserver {
    opens: AtomicUsize,
    messages: AtomicUsize,
    ends: AtomicUsize,
    errors: AtomicUsize,
    closes: AtomicUsize,
}

impl CountingObserver {
    fn counts(&self) -> [usize; 5] {
        [&self.opens, &self.messages, &self.ends, &self.errors, &self.closes].map(|count| count.load(Ordering::SeqCst))
    }
}

impl Observer for CountingObserver {
    fn on_open(&self, _info: &ConnectionInfo) {
        self.opens.fetch_add(1, Ordering::SeqCst);
    }

    fn on_message(&self, _info: &ConnectionInfo) {
        self.messages.fetch_add(1, Ordering::SeqCst);
    }

    fn on_end(&self, _info: &ConnectionInfo) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, _info: &ConnectionInfo, _error: &Error) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_close(&self, _info: &ConnectionInfo) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct TestServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start<H>(handler: H, observer: Arc<dyn Observer>) -> Self
    where
        H: Handler + Sync + 'static,
    {
        let config = ServerConfig::new(SocketAddr::from(([127, 0, 0, 1], 0)));
        let server = Server::bind(&config).await.unwrap().with_observer(observer);
        let addr = server.local_addr();

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(server.serve_with_shutdown(handler, async {
            let _ = signal.await;
        }));
        Self { addr, shutdown, task }
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::new("127.0.0.1", self.addr.port())
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.task.await.unwrap();
    }
}

async fn hello_world(_request: Request) -> Result<Response, HandlerError> {
    Ok(Response::with_status(StatusCode::OK).header("Content-Type", "text/plain")?.with_body("Hello World!"))
}

async fn echo(request: Request) -> Result<Response, HandlerError> {
    let body = match request.body() {
        Some(body) => body.clone(),
        None => request.target().to_string().into(),
    };
    Ok(Response::with_status(StatusCode::OK).with_body(body))
}

async fn broken(_request: Request) -> Result<Response, HandlerError> {
    Err("handler failed".into())
}

fn body_text(response: &Response) -> &str {
    std::str::from_utf8(response.body().unwrap()).unwrap()
}

/// Accepts one connection and hands it to `script`.
async fn raw_server<F, Fut>(script: F) -> (ClientConfig, JoinHandle<()>)
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let task = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        script(stream).await;
    });
    (ClientConfig::new("127.0.0.1", port), task)
}

#[tokio::test]
async fn hello_world_exchange() {
    let server = TestServer::start(make_handler(hello_world), Arc::new(CountingObserver::default())).await;
    let mut client = Client::connect(&server.client_config()).await.unwrap();

    let request = Request::get("/").unwrap().header("Host", "localhost:8124").unwrap();
    let response = client.exchange(&request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.line().reason(), "OK");
    assert_eq!(response.headers().get("content-type").unwrap().to_str().unwrap(), "text/plain");
    assert_eq!(response.headers().get("Content-Length").unwrap().to_str().unwrap(), "12");
    assert_eq!(body_text(&response), "Hello World!");

    client.close().await;
    server.stop().await;
}

#[tokio::test]
async fn pipelined_responses_arrive_in_request_order() {
    let server = TestServer::start(make_handler(echo), Arc::new(CountingObserver::default())).await;
    let mut client = Client::connect(&server.client_config()).await.unwrap();

    let get = Request::get("/first").unwrap();
    let post = Request::post("/").unwrap().with_body("Hello");
    let last = Request::get("/third").unwrap();
    for request in [&get, &post, &last] {
        client.send(request).await.unwrap();
    }
    assert_eq!(client.in_flight(), 3);

    let mut received = vec![];
    while client.in_flight() > 0 {
        let (exchange, response) = client.recv().await.unwrap().unwrap();
        received.push((exchange.id(), exchange.target().to_string(), body_text(&response).to_string()));
    }

    assert_eq!(
        received,
        vec![
            (1, "/first".to_string(), "/first".to_string()),
            (2, "/".to_string(), "Hello".to_string()),
            (3, "/third".to_string(), "/third".to_string()),
        ]
    );

    client.close().await;
    server.stop().await;
}

#[tokio::test]
async fn exchange_refuses_to_interleave() {
    let server = TestServer::start(make_handler(echo), Arc::new(CountingObserver::default())).await;
    let mut client = Client::connect(&server.client_config()).await.unwrap();

    client.send(&Request::get("/a").unwrap()).await.unwrap();
    let error = client.exchange(&Request::get("/b").unwrap()).await.unwrap_err();
    assert!(matches!(error, Error::Protocol { source: ProtocolError::PendingExchanges { pending: 1 } }));

    let (exchange, _response) = client.recv().await.unwrap().unwrap();
    assert_eq!(exchange.target(), "/a");

    client.close().await;
    server.stop().await;
}

#[tokio::test]
async fn handler_error_is_answered_with_500() {
    let server = TestServer::start(make_handler(broken), Arc::new(CountingObserver::default())).await;
    let mut client = Client::connect(&server.client_config()).await.unwrap();

    let response = client.exchange(&Request::get("/").unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // the connection survives a failing handler
    let response = client.exchange(&Request::get("/").unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    client.close().await;
    server.stop().await;
}

#[tokio::test]
async fn client_half_close_ends_server_side() {
    let observer = Arc::new(CountingObserver::default());
    let server = TestServer::start(make_handler(hello_world), observer.clone()).await;
    let mut client = Client::connect(&server.client_config()).await.unwrap();

    client.send(&Request::get("/").unwrap()).await.unwrap();
    client.shutdown_write().await.unwrap();

    let (_exchange, response) = client.recv().await.unwrap().unwrap();
    assert_eq!(body_text(&response), "Hello World!");
    assert!(client.recv().await.unwrap().is_none());
    assert_eq!(client.state(), ConnectionState::Closed);

    // open, message, end, no error, close
    assert_eq!(observer.counts(), [1, 1, 1, 0, 1]);
    server.stop().await;
}

#[tokio::test]
async fn close_is_idempotent_and_silent() {
    let server = TestServer::start(make_handler(hello_world), Arc::new(CountingObserver::default())).await;
    let observer = Arc::new(CountingObserver::default());
    let mut client = Client::connect_with_observer(&server.client_config(), observer.clone()).await.unwrap();

    client.close().await;
    client.close().await;

    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(observer.counts(), [1, 0, 0, 0, 1]);
    assert!(matches!(
        client.send(&Request::get("/").unwrap()).await,
        Err(Error::Connection { source: ConnectionError::Closed })
    ));
    server.stop().await;
}

#[tokio::test]
async fn refused_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let error = Client::connect(&ClientConfig::new("127.0.0.1", port)).await.unwrap_err();
    assert!(matches!(error, Error::Connection { source: ConnectionError::Refused { .. } }));
}

#[tokio::test]
async fn truncated_response_is_an_error() {
    let (config, task) = raw_server(|mut stream| async move {
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf).await.unwrap();
        stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\nHello").await.unwrap();
        stream.shutdown().await.unwrap();
    })
    .await;

    let observer = Arc::new(CountingObserver::default());
    let mut client = Client::connect_with_observer(&config, observer.clone()).await.unwrap();
    client.send(&Request::get("/").unwrap()).await.unwrap();

    match client.recv().await {
        Err(Error::Truncated { source }) => {
            assert_eq!(source.stage(), DecodeStage::Body);
            assert_eq!(source.buffered(), 5);
        }
        other => panic!("expected truncation, got {other:?}"),
    }
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(client.in_flight(), 0);
    // open, no message, no end, error, no close
    assert_eq!(observer.counts(), [1, 0, 0, 1, 0]);
    task.await.unwrap();
}

#[tokio::test]
async fn unsolicited_response_is_a_protocol_error() {
    let (config, task) = raw_server(|mut stream| async move {
        stream.write_all(b"HTTP/1.1 204 No Content\r\n\r\n").await.unwrap();
        let mut rest = vec![];
        let _ = stream.read_to_end(&mut rest).await;
    })
    .await;

    let mut client = Client::connect(&config).await.unwrap();
    let error = client.recv().await.unwrap_err();
    assert!(matches!(error, Error::Protocol { source: ProtocolError::UnsolicitedResponse }));
    assert_eq!(client.state(), ConnectionState::Closed);
    task.await.unwrap();
}

#[tokio::test]
async fn peer_closing_with_pending_exchanges() {
    let (config, task) = raw_server(|mut stream| async move {
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf).await.unwrap();
        stream.shutdown().await.unwrap();
    })
    .await;

    let mut client = Client::connect(&config).await.unwrap();
    client.send(&Request::get("/").unwrap()).await.unwrap();

    let error = client.recv().await.unwrap_err();
    assert!(matches!(error, Error::Connection { source: ConnectionError::PeerClosed { pending: 1 } }));
    assert_eq!(client.in_flight(), 0);
    task.await.unwrap();
}

#[tokio::test]
async fn malformed_request_closes_server_connection_without_response() {
    let observer = Arc::new(CountingObserver::default());
    let server = TestServer::start(make_handler(hello_world), observer.clone()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\n").await.unwrap();

    let mut response = vec![];
    stream.read_to_end(&mut response).await.unwrap();
    assert!(response.is_empty());
    assert_eq!(observer.counts()[3], 1);
    server.stop().await;
}

#[tokio::test]
async fn codecs_drive_framed_adapters() {
    let server = TestServer::start(make_handler(echo), Arc::new(CountingObserver::default())).await;

    let stream = TcpStream::connect(server.addr).await.unwrap();
    let (reader, writer) = stream.into_split();
    let mut requests = FramedWrite::new(writer, RequestEncoder::new());
    let mut responses = FramedRead::new(reader, ResponseDecoder::new());

    requests.send(Request::post("/").unwrap().with_body("ping")).await.unwrap();
    requests.send(Request::get("/pong").unwrap()).await.unwrap();

    let first = responses.next().await.unwrap().unwrap();
    let second = responses.next().await.unwrap().unwrap();
    assert_eq!(body_text(&first), "ping");
    assert_eq!(body_text(&second), "/pong");

    drop(requests);
    assert!(responses.next().await.is_none());
    server.stop().await;
}
