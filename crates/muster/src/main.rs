use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use muster::{http, Config};
use muster_db::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "muster")]
#[command(about = "Event management service", version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "muster.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override the configured listen address
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Override the configured database path
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Apply the schema to the configured database
    Migrate {
        /// Override the configured database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Apply a schema file instead of the built-in one
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muster=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    match cli.command {
        Command::Migrate { db, schema } => {
            let path = db.unwrap_or(config.database.path);
            let store = Store::open(&path)?;
            let sql = match &schema {
                Some(file) => fs::read_to_string(file)
                    .with_context(|| format!("read schema file {}", file.display()))?,
                None => muster::SCHEMA.to_owned(),
            };
            store.migrate(&sql)?;
            info!(path = %path.display(), "migration complete");
        }
        Command::Serve { listen, db } => {
            let path = db.unwrap_or(config.database.path);
            let db = Store::open(&path)?;
            db.migrate(muster::SCHEMA)?;

            let addr = listen.unwrap_or(config.listen);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("bind {addr}"))?;
            info!(%addr, "listening");

            let app = http::app(Arc::new(db));
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;
        }
    }

    Ok(())
}
