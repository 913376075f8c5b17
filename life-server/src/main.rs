//! Life server - JSON HTTP front end over the board service.

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use clap::Parser;
use life::io::config::{DEFAULT_CONFIG_PATH, load_config};
use life::io::store::{Backend, open_store};
use life::service::BoardService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "life-server")]
#[command(about = "HTTP API for Game of Life boards")]
struct Args {
    /// Configuration file (missing file means defaults)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Address to bind the server to; overrides `server.bind`
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on; overrides `server.port`
    #[arg(long)]
    port: Option<u16>,

    /// Data directory; overrides the configured storage and selects the file backend
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("life_server=info".parse()?)
                .add_directive("life=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut cfg = load_config(&args.config)?;
    if let Some(dir) = args.data_dir {
        cfg.storage.backend = Backend::File;
        cfg.storage.dir = dir.display().to_string();
    }
    info!(backend = ?cfg.storage.backend, dir = %cfg.storage.dir, "opening store");
    let store = open_store(&cfg.storage).context("open store")?;
    let state = AppState::new(BoardService::new(store, cfg.convergence));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", routes::api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind = args.bind.unwrap_or(cfg.server.bind);
    let port = args.port.unwrap_or(cfg.server.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", bind, port))?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
