use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{error, info, warn};

use amity_api::Handler;
use amity_graph::{EdgeStore, GraphEngine, MemoryEdgeStore, SqliteEdgeStore};

mod config;
mod paths;

use config::{ServerConfig, StoreKind};
use paths::AmityPaths;

#[derive(Parser)]
#[command(name = "amity")]
#[command(about = "Relationship graph server over a local socket")]
#[command(version)]
struct Cli {
    /// Config file (default: <data-dir>/amity.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory for the database, socket and config
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Socket path override
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Keep relationships in memory only
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => AmityPaths::from_base(dir),
        None => AmityPaths::from_env(),
    };
    let config_path = cli.config.unwrap_or_else(|| paths.config_path.clone());
    let config = ServerConfig::load(&config_path)?;

    // stdout stays clean; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .init();

    paths.ensure_dirs()?;

    let store: Arc<dyn EdgeStore> = if cli.memory || config.store == StoreKind::Memory {
        warn!("Using in-memory store; relationships are lost on exit");
        Arc::new(MemoryEdgeStore::new())
    } else {
        Arc::new(open_sqlite(&config.db_path(&paths), config.max_connections).await?)
    };

    let engine = GraphEngine::with_config(store, config.engine_config());
    let handler = Arc::new(Handler::new(engine));

    let socket_path = cli.socket.unwrap_or_else(|| config.socket_path(&paths));
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)
            .with_context(|| format!("Failed to remove stale socket: {}", socket_path.display()))?;
    }
    let listener = UnixListener::bind(&socket_path)
        .with_context(|| format!("Failed to bind {}", socket_path.display()))?;
    info!("Amity listening on {}", socket_path.display());

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_client(stream, handler).await {
                        error!("Client error: {}", err);
                    }
                });
            }
            Err(err) => {
                error!("Accept error: {}", err);
            }
        }
    }
}

async fn open_sqlite(db_path: &Path, max_connections: u32) -> Result<SqliteEdgeStore> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    SqliteEdgeStore::init_schema(&pool).await?;
    let store = SqliteEdgeStore::new(pool);
    info!("Relationship store ready at {}", db_path.display());
    Ok(store)
}

async fn handle_client(stream: tokio::net::UnixStream, handler: Arc<Handler>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let response = handler.handle_line(trimmed).await;
        let payload = serde_json::to_string(&response)?;
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}
