use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use nearby::protocol::{DEFAULT_PORT, WS_PATH};
use nearby::server::{RelayConfig, RelayServer};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nearby", version, about = "Proximity video presence relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay and serve the static client
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "NEARBY_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, env = "NEARBY_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,

    /// Directory served over HTTP; must contain index.html
    #[arg(long, env = "NEARBY_STATIC_DIR", default_value = "public")]
    static_dir: PathBuf,
}

impl ServeArgs {
    fn into_config(self) -> RelayConfig {
        RelayConfig {
            listen_addr: SocketAddr::new(self.host, self.port),
            static_dir: self.static_dir,
            ..RelayConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Commands::Serve(args) => serve(args.into_config()).await,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nearby=info,nearby_server=info".into()),
        )
        .init();
}

async fn serve(config: RelayConfig) -> Result<()> {
    let index = config.static_dir.join("index.html");
    if !index.is_file() {
        warn!("{} not found; GET / will return 404", index.display());
    }
    let static_dir = config.static_dir.clone();

    let server = RelayServer::start(config);
    let listener = server
        .bind()
        .await
        .context("Failed to bind relay listener")?;
    let addr = listener.local_addr()?;

    println!("{}", "📡 nearby relay is up".green().bold());
    println!("   🌐 Page:      http://{}", addr);
    println!("   🔌 WebSocket: ws://{}{}", addr, WS_PATH);
    println!("   📂 Static:    {}", static_dir.display());

    server
        .serve(listener, shutdown_signal())
        .await
        .context("Relay server failed")?;

    println!("{}", "👋 Relay stopped".yellow());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
