use anyhow::Context;
use clap::Parser;
use protmap_core::config::Config;
use protmap_core::loader::Dataset;
use protmap_server::structure::Passthrough;
use protmap_server::AppState;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "protmap", about = "Protein embedding map server")]
struct Cli {
    /// TOML config file layered over the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overriding `server.bind`.
    #[arg(long)]
    bind: Option<String>,

    /// Write logs to this file instead of stderr (tail -f to inspect).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    // Table construction is the one blocking step; nothing is served until it succeeds.
    let dataset = tokio::task::spawn_blocking({
        let data = config.data.clone();
        let table = config.table.clone();
        move || Dataset::load(&data, &table)
    })
    .await?
    .context("building point table")?;

    let state = AppState::new(&dataset, &config, Arc::new(Passthrough));
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(%bind, rows = dataset.table.len(), "protmap listening");

    axum::serve(listener, protmap_server::router(state)).await?;
    Ok(())
}
