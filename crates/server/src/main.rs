// crates/server/src/main.rs
//! Wavescribe server binary.
//!
//! Opens the database, spawns the job workers, and serves the HTTP API.
//! Jobs submitted over the API are queued and picked up by the workers;
//! everything else is request/response.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wavescribe_core::{OllamaProvider, OpenAiProvider, ProviderRouter, Transcriber};
use wavescribe_db::Database;
use wavescribe_server::jobs::{spawn_workers, JobService, WorkerContext};
use wavescribe_server::{create_app, init_metrics, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (quiet by default, startup UX uses eprintln)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wavescribe=info,tower_http=warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Install the Prometheus recorder before anything records a sample
    init_metrics();

    // Print banner
    eprintln!("\n\u{1f399} wavescribe v{}\n", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env()?;

    // Step 1: Open database and prepare the per-job scratch root
    let db = Database::new(&config.db_path).await?;
    tokio::fs::create_dir_all(&config.work_dir).await?;

    // Step 2: Wire up the summarization backends
    let local = OllamaProvider::new(&config.ollama_base_url);
    let hosted = OpenAiProvider::new(&config.openai_base_url, config.openai_api_key.clone());
    let router = Arc::new(ProviderRouter::new(Arc::new(local), Arc::new(hosted)));

    // Step 3: Start the job service and its workers
    let (jobs, job_rx) = JobService::new(config.queue_capacity);
    spawn_workers(
        config.worker_count,
        WorkerContext {
            service: jobs.clone(),
            db: db.clone(),
            backend: Arc::new(Transcriber::new(config.transcriber_bin.clone())),
            router,
            work_dir: config.work_dir.clone(),
        },
        job_rx,
    );

    // Step 4: Build the Axum app
    let state = AppState::new(db, jobs);
    let app = create_app(state);

    // Step 5: Bind and serve
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    eprintln!(
        "  \u{2713} Ready \u{2014} {} worker(s), queue capacity {}",
        config.worker_count, config.queue_capacity,
    );
    eprintln!("  \u{2192} http://localhost:{}\n", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
