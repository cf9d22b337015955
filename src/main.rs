//! rpc-gateway
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!   REST client   │  relay (relay.bind_address)                  │
//!   ─────────────▶│  transform → dispatch → write (always 200)   │
//!                 └──────────────────────┬───────────────────────┘
//!                                        │ http://gateway.host:gateway.port
//!                                        ▼
//!                 ┌──────────────────────────────────────────────┐
//!                 │  gateway (mux of registered handlers)        │──▶ gRPC backends
//!                 └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use rpc_gateway::config::{load_config, GatewayConfig};
use rpc_gateway::gateway::{BoxError, GatewayServer, HandlerRegistry};
use rpc_gateway::lifecycle::signals::shutdown_on_ctrl_c;
use rpc_gateway::observability::logging;
use rpc_gateway::{Relay, Shutdown};

#[derive(Parser)]
#[command(name = "rpc-gateway")]
#[command(about = "Relay REST requests to a gRPC gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the forwarding controller
    Relay,
    /// Serve the gateway multiplexer
    Gateway,
    /// Serve both
    All,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability.log_level);
    tracing::info!(
        config = %cli.config.display(),
        gateway = %config.gateway.socket_address(),
        clients = config.grpc.clients.len(),
        "rpc-gateway v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Arc::new(Shutdown::new());
    let relay_shutdown = shutdown.subscribe();
    let gateway_shutdown = shutdown.subscribe();

    let serve = async {
        match cli.command {
            Commands::Relay => run_relay(&config, relay_shutdown).await,
            Commands::Gateway => run_gateway(&config, gateway_shutdown).await,
            Commands::All => {
                tokio::try_join!(
                    run_relay(&config, relay_shutdown),
                    run_gateway(&config, gateway_shutdown),
                )?;
                Ok::<(), BoxError>(())
            }
        }
    };

    let signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_on_ctrl_c(&signal).await;
    });

    serve.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_relay(
    config: &GatewayConfig,
    shutdown: tokio::sync::broadcast::Receiver<()>,
) -> Result<(), BoxError> {
    let relay = Relay::from_config(config);
    let listener = TcpListener::bind(&config.relay.bind_address).await?;
    relay.serve(listener, shutdown).await?;
    Ok(())
}

async fn run_gateway(
    config: &GatewayConfig,
    shutdown: tokio::sync::broadcast::Receiver<()>,
) -> Result<(), BoxError> {
    GatewayServer::new(config.clone(), HandlerRegistry::new())
        .run(shutdown)
        .await?;
    Ok(())
}
