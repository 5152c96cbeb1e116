use clap::Parser;
use mockd::server::{App, MockServer};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "mockd", about = "HTTP test double server")]
struct Args {
    /// Interface to listen on
    #[arg(short, long, default_value = "0.0.0.0")]
    ip: IpAddr,
    /// Port to listen on
    #[arg(short, long, default_value = "8086", env = "MOCKD_PORT")]
    port: u16,
    /// Timeout for proxied upstream calls, in milliseconds
    #[arg(long, default_value = "30000")]
    proxy_timeout_ms: u64,
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let default_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    let app = Arc::new(App::build(Duration::from_millis(args.proxy_timeout_ms)));
    let server = MockServer::new(SocketAddr::new(args.ip, args.port), app);
    server.run().await
}
