//! HTTP service: the chat UI, the chat endpoint and document downloads.

mod handlers;
mod request_tracing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

pub use handlers::{ChatRequest, ChatResponse, PDF_READY};

use crate::chat::{ChatModel, OpenAiChatModel};
use crate::config::Config;
use crate::document::Renderer;
use crate::error::{Error, Result};
use crate::janitor::Janitor;
use crate::storage::Storage;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<Storage>>,
    model: Arc<dyn ChatModel>,
    renderer: Renderer,
    output_dir: Arc<PathBuf>,
    max_body_bytes: usize,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("renderer", &self.renderer)
            .field("output_dir", &self.output_dir)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble state from its parts.
    #[must_use]
    pub fn new(
        storage: Arc<Mutex<Storage>>,
        model: Arc<dyn ChatModel>,
        renderer: Renderer,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            storage,
            model,
            renderer,
            output_dir: Arc::new(output_dir),
            max_body_bytes: crate::config::ServerConfig::default().max_body_bytes,
        }
    }

    /// Override the request body limit.
    #[must_use]
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Directory documents are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The file registry.
    #[must_use]
    pub fn storage(&self) -> &Arc<Mutex<Storage>> {
        &self.storage
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/chat", post(handlers::chat))
        .route("/download/:filename", get(handlers::download))
        .layer(from_fn(request_tracing::request_tracing_middleware))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .with_state(state)
}

/// Run the service until Ctrl-C or SIGTERM.
///
/// Opens the registry, creates the output directory, starts the janitor when
/// cleanup is enabled, and serves on the configured address.
///
/// # Errors
///
/// Returns an error if storage, the model client or the listener cannot be
/// set up, or if the server fails.
pub async fn serve(config: Config) -> Result<()> {
    let storage = Arc::new(Mutex::new(Storage::open(config.database_path())?));

    let output_dir = config.output_dir();
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|source| Error::DirectoryCreate {
            path: output_dir.clone(),
            source,
        })?;

    let model = OpenAiChatModel::from_config(&config)?;
    if config.llm.api_key.is_none() {
        tracing::warn!("No API key configured; requests to the model will be unauthenticated");
    }
    info!(model = model.model(), "Using chat model");

    let janitor = config.cleanup.enabled.then(|| {
        Janitor::spawn(
            Arc::clone(&storage),
            output_dir.clone(),
            config.cleanup_interval(),
            config.max_file_age(),
        )
    });

    let state = AppState::new(
        storage,
        Arc::new(model),
        Renderer::from_config(&config.document),
        output_dir,
    )
    .with_max_body_bytes(config.server.max_body_bytes);
    let app = build_router(state);

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("workorder listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    if let Some(janitor) = janitor {
        janitor.stop().await;
    }
    info!("Server stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received");
}
