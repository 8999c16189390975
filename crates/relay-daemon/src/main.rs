//! Standalone relay server.
//!
//! Serves the relay WebSocket endpoint and wires it to a built-in backend.

mod echo;

use clap::{Parser, ValueEnum};
use relay_core::backend::outbound_channel;
use relay_core::{ChannelBackend, Relay};
use relay_http::{SharedState, DEFAULT_QUEUE_SIZE};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Echo each message back to its sender; `/broadcast <text>` fans out.
    Echo,
    /// Log and drop inbound messages.
    Discard,
}

#[derive(Debug, Parser)]
#[command(name = "relay-daemon", version, about = "Bidirectional WebSocket relay")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "RELAY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(long, env = "RELAY_PORT", default_value_t = 8080)]
    port: u16,

    /// Backend that consumes inbound messages.
    #[arg(long, value_enum, default_value_t = BackendKind::Echo)]
    backend: BackendKind,

    /// Per-connection outbound queue capacity.
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE)]
    queue_size: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (backend, inbound) = ChannelBackend::new();
    let relay = Arc::new(Relay::new(Arc::new(backend)));
    let (outbound_tx, outbound_rx) = outbound_channel();

    let outbound_task = tokio::spawn({
        let relay = Arc::clone(&relay);
        async move { relay.run_outbound(outbound_rx).await }
    });
    let backend_task = match args.backend {
        BackendKind::Echo => tokio::spawn(echo::run_echo(inbound, outbound_tx)),
        BackendKind::Discard => {
            drop(outbound_tx);
            tokio::spawn(echo::run_discard(inbound))
        }
    };

    let state = Arc::new(SharedState::new(Arc::clone(&relay)).with_queue_size(args.queue_size));
    let mut server = match relay_http::start(state, &args.host, args.port) {
        Ok(server) => server,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Using {:?} backend", args.backend);

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {}", e);
    }
    log::info!("Shutting down");

    let _ = tokio::task::spawn_blocking(move || server.stop()).await;
    backend_task.abort();
    outbound_task.abort();
    ExitCode::SUCCESS
}
