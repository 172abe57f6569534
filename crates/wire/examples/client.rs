//! Pipelines a `GET` and a `POST` to the hello world server.
//!
//! ```text
//! cargo run --example client -- [host] [port]
//! ```

use micro_wire::client::Client;
use micro_wire::config::ClientConfig;
use micro_wire::protocol::{Error, Request};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "localhost".to_string());
    let port = match args.next().map(|arg| arg.parse::<u16>()) {
        None => 8124,
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            error!(cause = %e, "invalid port argument");
            return;
        }
    };

    if let Err(e) = run(ClientConfig::new(host, port)).await {
        error!(cause = %e, "client failed");
    }
}

async fn run(config: ClientConfig) -> Result<(), Error> {
    let mut client = Client::connect(&config).await?;
    let authority = format!("{}:{}", config.host(), config.port());

    let get = Request::get("/")?
        .header("Host", authority.as_str())?
        .header("User-Agent", "micro-wire")?
        .header("Accept", "*/*")?;
    let post = Request::post("/")?.header("Host", authority.as_str())?.with_body("Hello");

    client.send(&get).await?;
    client.send(&post).await?;

    while client.in_flight() > 0 {
        let Some((exchange, response)) = client.recv().await? else {
            break;
        };
        let body = response.body().map(|body| String::from_utf8_lossy(body).into_owned()).unwrap_or_default();
        info!(
            exchange = exchange.id(),
            method = %exchange.method(),
            status = %response.status(),
            body = %body,
            "response received"
        );
    }

    client.close().await;
    Ok(())
}
