//! Answers every request with `Hello World!`.
//!
//! ```text
//! cargo run --example server -- [port]
//! ```

use http::StatusCode;
use micro_wire::config::ServerConfig;
use micro_wire::handler::{HandlerError, make_handler};
use micro_wire::protocol::{Request, Response};
use micro_wire::server::Server;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_PORT: u16 = 8124;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let port = match std::env::args().nth(1).map(|arg| arg.parse::<u16>()) {
        None => DEFAULT_PORT,
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            error!(cause = %e, "invalid port argument");
            return;
        }
    };

    let server = match Server::bind(&ServerConfig::port(port)).await {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(cause = %e, "failed to listen for ctrl-c");
        }
    };
    server.serve_with_shutdown(make_handler(hello_world), shutdown).await;
}

async fn hello_world(request: Request) -> Result<Response, HandlerError> {
    info!(method = %request.method(), path = request.target(), "receiving request");
    if let Some(body) = request.body() {
        info!(body = %String::from_utf8_lossy(body), "receiving request body");
    }

    let response = Response::with_status(StatusCode::OK).header("Content-Type", "text/plain")?.with_body("Hello World!");
    Ok(response)
}
