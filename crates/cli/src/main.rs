//! CLI for loading Art Institute of Chicago exhibitions into Postgres.

use anyhow::Context;
use artic_etl_db::{DbOptions, DbPool};
use artic_etl_ingestion::{ExhibitionsClient, Loader, TableWriter};
use artic_etl_telemetry::{init_logging, Metrics};
use clap::Parser;
use tracing::{error, info};

/// Environment variable consulted when --password is not given.
const PASSWORD_ENV: &str = "ARTIC_ETL_PASSWORD";

#[derive(Parser)]
#[command(name = "artic-etl")]
#[command(about = "Load Art Institute of Chicago exhibitions into a Postgres table")]
struct Cli {
    /// Database username
    #[arg(long, default_value = "myuser")]
    user: String,

    /// Database password; falls back to the ARTIC_ETL_PASSWORD environment
    /// variable when omitted
    #[arg(long)]
    password: Option<String>,

    /// Database host
    #[arg(long, default_value = "db-postgres")]
    host: String,

    /// Database port
    #[arg(long, default_value_t = 5432)]
    port: u16,

    /// Database name to connect to
    #[arg(long, default_value = "artdb")]
    db: String,

    /// Table name to store data
    #[arg(long = "table_name", default_value = "exhibitions")]
    table_name: String,

    /// Exhibitions API root
    #[arg(long, default_value = "https://api.artic.edu/api/v1")]
    api_url: String,

    /// Page size per API request (the API caps this at 100)
    #[arg(long, default_value_t = 100)]
    limit: u32,

    /// Stop once this many rows have been written
    #[arg(long, default_value_t = 100_000)]
    threshold: u64,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Optional bind address for a Prometheus /metrics endpoint
    #[arg(long)]
    metrics_bind_address: Option<String>,

    /// Optional path for per-iteration JSONL audit samples
    #[arg(long)]
    sample_output_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let password = match cli.password {
        Some(password) => password,
        None => std::env::var(PASSWORD_ENV).with_context(|| {
            format!("no database password: pass --password or set {PASSWORD_ENV}")
        })?,
    };

    info!("Starting exhibitions ingestion");

    let db = DbPool::connect(&DbOptions {
        user: cli.user,
        password,
        host: cli.host,
        port: cli.port,
        database: cli.db,
    })
    .await?;

    let metrics = Metrics::new()?;
    if let Some(addr) = cli.metrics_bind_address.as_deref() {
        start_metrics_server(addr, metrics.clone()).await?;
    }

    let client = ExhibitionsClient::new(&cli.api_url, cli.limit, metrics.clone());
    let writer = TableWriter::new(db, &cli.table_name);
    let loader = Loader::new(
        client,
        writer,
        cli.threshold,
        metrics,
        cli.sample_output_path,
    );

    let total = loader.run().await?;
    info!(total, table = %cli.table_name, "Ingestion complete");

    Ok(())
}

async fn start_metrics_server(addr: &str, metrics: Metrics) -> anyhow::Result<()> {
    use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
    use std::sync::Arc;

    let metrics = Arc::new(metrics);

    async fn metrics_handler(
        State(metrics): State<Arc<Metrics>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match metrics.gather() {
            Ok(body) => Ok((StatusCode::OK, body)),
            Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Metrics server listening on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}
