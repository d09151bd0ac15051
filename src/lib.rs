pub mod api;
pub mod config;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::pipeline::skills::LlmSkills;
use crate::pipeline::{InvoiceOrchestrator, PipelineError, ReferenceStore, ReferenceStoreError, WorkflowDefinition};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Reference store error: {0}")]
    ReferenceStore(#[from] ReferenceStoreError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] PipelineError),

    #[error("Server error: {0}")]
    Server(#[from] api::ServerError),

    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Build the shared orchestrator from configuration.
///
/// Loads the reference records and builds the workflow definition once.
pub fn build_orchestrator(config: &AppConfig) -> Result<InvoiceOrchestrator, StartupError> {
    let store = match &config.reference_file {
        Some(path) => ReferenceStore::from_json_file(path)?,
        None => {
            tracing::info!("No reference file configured, using built-in records");
            ReferenceStore::builtin()
        }
    };
    if store.is_empty() {
        tracing::warn!("Reference store is empty, every invoice will fail validation");
    }

    let workflow = WorkflowDefinition::invoice()?;
    let skills = LlmSkills::new(config.llm.clone());

    Ok(InvoiceOrchestrator::new(Arc::new(workflow), Arc::new(store), Arc::new(skills))
        .with_target_language(&config.target_language))
}

/// Run the invoice service until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        backend = %config.llm.backend,
        model = %config.llm.model,
        target_language = %config.target_language,
        "Configuration loaded"
    );

    let orchestrator = build_orchestrator(&config)?;
    let app = api::invoice_api_router(api::ApiContext::new(Arc::new(orchestrator)));
    let mut server = api::start_server_on(config.bind_addr, app).await?;

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    server.shutdown();
    server.stopped().await;

    Ok(())
}
