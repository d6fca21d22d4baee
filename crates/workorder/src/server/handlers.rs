use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::chat::{build_transcript, inspect_reply, ChatMessage, Reply, LOGO_ATTACHED};
use crate::error::{Error, Result};
use crate::logo::order_logo;
use crate::order::{CollectedOrder, WorkOrder};
use crate::storage::is_plain_file_name;

use super::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Message shown next to the download link.
pub const PDF_READY: &str = "Ordem de Serviço gerada! Clique abaixo para baixar.";

const HISTORY_TOO_LONG: &str = "Erro: O histórico da conversa é muito longo.";

/// Body of `POST /chat`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Transcript so far, without the system prompt.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// New user message, if any.
    #[serde(default)]
    pub message: Option<String>,
    /// Logo picked in the browser, as a data URI.
    #[serde(default)]
    pub logo_data: Option<String>,
}

/// Body returned by `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatResponse {
    /// The assistant's next message.
    Chat {
        /// Message text.
        message: String,
    },
    /// A document was generated.
    Pdf {
        /// Confirmation text.
        message: String,
        /// Download path.
        url: String,
    },
    /// The turn failed.
    Error {
        /// User-facing description.
        message: String,
    },
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ChatResponse::Error {
            message: message.into(),
        }),
    )
        .into_response()
}

pub(crate) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub(crate) async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected chat request body");
            return error_response(
                rejection.status(),
                format!("Requisição inválida: {}", rejection.body_text()),
            );
        }
    };

    match respond(&state, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) if e.is_context_length_exceeded() => {
            warn!(error = %e, "Conversation exceeded the model context");
            error_response(StatusCode::BAD_REQUEST, HISTORY_TOO_LONG)
        }
        Err(e) => {
            error!(error = %e, "Chat turn failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Ocorreu um erro no servidor: {e}"),
            )
        }
    }
}

async fn respond(state: &AppState, request: ChatRequest) -> Result<ChatResponse> {
    if request.message.as_deref() == Some(LOGO_ATTACHED) {
        info!("User attached a logo");
    }

    let messages = build_transcript(&request.history, request.message.as_deref());
    let text = state.model.complete(&messages).await?;

    match inspect_reply(&text)? {
        Reply::Chat(message) => Ok(ChatResponse::Chat { message }),
        Reply::Generate(collected) => {
            let filename = generate(state, collected, request.logo_data.as_deref()).await?;
            Ok(ChatResponse::Pdf {
                message: PDF_READY.to_string(),
                url: format!("/download/{filename}"),
            })
        }
    }
}

/// Render, store and register the document. Returns its file name.
async fn generate(
    state: &AppState,
    mut collected: CollectedOrder,
    uploaded_logo: Option<&str>,
) -> Result<String> {
    collected.resolve_logo(uploaded_logo);

    let logo = order_logo(&collected.oficina.logo_data_base64);

    let order = WorkOrder::finalize(collected, Local::now().naive_local());
    let short_id = Uuid::new_v4().simple().to_string();
    let filename = order.file_name(&short_id[..4]);

    let renderer = state.renderer.clone();
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&order, logo.as_ref()))
        .await
        .map_err(|e| Error::internal(format!("render task failed: {e}")))??;

    // The row must exist before the file does.
    state.storage.lock().await.add_file(&filename)?;

    let path = state.output_dir.join(&filename);
    if let Err(e) = tokio::fs::write(&path, &bytes).await {
        if let Err(cleanup) = state.storage.lock().await.delete_file(&filename) {
            warn!(error = %cleanup, file = %filename, "Failed to unregister unwritten file");
        }
        if let Err(cleanup) = tokio::fs::remove_file(&path).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %cleanup, file = %filename, "Failed to remove partial file");
            }
        }
        return Err(e.into());
    }

    info!(file = %filename, bytes = bytes.len(), "Generated work order");
    Ok(filename)
}

pub(crate) async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match read_document(&state, &filename).await {
        Ok(bytes) => {
            let content_type = if filename.to_ascii_lowercase().ends_with(".pdf") {
                "application/pdf"
            } else {
                "application/octet-stream"
            };
            (
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e @ Error::InvalidFileName(_)) => {
            warn!(error = %e, "Rejected download");
            error_response(StatusCode::BAD_REQUEST, "Nome de arquivo inválido.")
        }
        Err(e) if e.is_not_found() => {
            error_response(StatusCode::NOT_FOUND, "Arquivo não encontrado.")
        }
        Err(e) => {
            error!(error = %e, filename = %filename, "Download failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Ocorreu um erro no servidor: {e}"),
            )
        }
    }
}

async fn read_document(state: &AppState, filename: &str) -> Result<Vec<u8>> {
    if !is_plain_file_name(filename) {
        return Err(Error::InvalidFileName(filename.to_string()));
    }
    Ok(tokio::fs::read(state.output_dir.join(filename)).await?)
}
