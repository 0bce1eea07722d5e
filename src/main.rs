use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use escriba::api::{serve, AppState};
use escriba::config::{default_log_filter, Config, APP_NAME, APP_VERSION};
use escriba::glossary::Glossary;
use escriba::history::HistoryStore;
use escriba::pipeline::{build_providers, DocumentPipeline, PipelineOptions};

/// Providers use a blocking HTTP client, so the pipeline is assembled
/// before the async runtime starts and only the server loop runs on it.
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    tracing::info!(app = APP_NAME, version = APP_VERSION, "Starting");

    let glossary = match &config.glossary_file {
        Some(path) => Glossary::load(path),
        None => Glossary::builtin(),
    };
    tracing::info!(entries = glossary.len(), "Glossary loaded");

    let providers = build_providers(&config);
    let pipeline = DocumentPipeline::new(
        providers,
        glossary,
        PipelineOptions::from_config(&config),
    );

    let history = HistoryStore::new(&config.history_dir)?;
    let session_file = history.new_session_file()?;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        history: Arc::new(history),
        session_file,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(state, &config.bind_addr))?;
    Ok(())
}
