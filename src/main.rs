use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use minutes_live::{
    build_http_client, create_router, AppState, Collaborators, Config, HttpGenerationEngine,
    HttpTranscriptionEngine, MemoryStore, NatsEventMirror, SymphoniaTranscoder,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "minutes-live", about = "Live meeting transcription and minutes service")]
struct Args {
    /// Path to the configuration file (extension optional)
    #[arg(long, default_value = "config/minutes-live")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);

    let client = build_http_client(cfg.engine.timeout_secs);
    let collaborators = Collaborators {
        transcoder: Arc::new(SymphoniaTranscoder::default()),
        transcription: Arc::new(HttpTranscriptionEngine::new(
            client.clone(),
            cfg.engine.clone(),
        )),
        generation: Arc::new(HttpGenerationEngine::new(client, cfg.engine.clone())),
        store: Arc::new(MemoryStore::new()),
    };

    let nats = match &cfg.nats.url {
        Some(url) => Some(Arc::new(
            NatsEventMirror::connect(url)
                .await
                .context("Failed to connect to NATS")?,
        )),
        None => None,
    };

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(Arc::new(cfg), collaborators, nats);
    let app = create_router(state);

    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
