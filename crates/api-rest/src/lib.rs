//! # API REST
//!
//! REST API for the research report service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, bearer authentication, document streaming)
//!
//! Uses `api-shared` for wire types and identity resolution. CORS is applied by the server
//! binary.

#![warn(rust_2018_idioms)]

mod auth;
mod error;

pub use auth::Owner;
pub use error::ApiError;

use api_shared::{
    ErrorRes, HealthRes, HealthService, HistoryItem, HistoryRes, IdentityProvider, MessageRes,
    ReportRes, ResearchReq, ResearchRes, SectionDto, SourceDto, StatusRes,
};
use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::stream;
use research_core::{
    render::TempDocument, NonEmptyText, ResearchError, ResearchId, ResearchService,
    ResearchStatus, StoredReport,
};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const DOCUMENT_CHUNK_BYTES: usize = 64 * 1024;

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub research: ResearchService,
    pub identity: Arc<dyn IdentityProvider>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        health,
        submit_research,
        research_history,
        research_status,
        get_report,
        download_document,
        delete_research,
    ),
    components(schemas(
        HealthRes,
        MessageRes,
        ErrorRes,
        ResearchReq,
        ResearchRes,
        StatusRes,
        ReportRes,
        SectionDto,
        SourceDto,
        HistoryRes,
        HistoryItem,
    ))
)]
struct ApiDoc;

/// Builds the REST router with OpenAPI documentation mounted at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/research", post(submit_research))
        .route("/api/research/history", get(research_history))
        .route("/api/research/:id", get(get_report).delete(delete_research))
        .route("/api/research/:id/status", get(research_status))
        .route("/api/research/:id/pdf", get(download_document))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome message", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn root(State(_state): State<AppState>) -> Json<MessageRes> {
    Json(MessageRes {
        message: "Welcome to the LibreResearch API".into(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used for monitoring and load balancer checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/research",
    request_body = ResearchReq,
    responses(
        (status = 200, description = "Research accepted", body = ResearchRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 401, description = "Unauthorized", body = ErrorRes)
    )
)]
/// Accept a research topic and start the research in the background.
///
/// The response is returned immediately with status `in_progress`; poll the status endpoint
/// for completion.
#[axum::debug_handler]
async fn submit_research(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(req): Json<ResearchReq>,
) -> Result<Json<ResearchRes>, ApiError> {
    let topic = NonEmptyText::new(&req.topic)
        .map_err(|_| ResearchError::InvalidInput("topic cannot be empty".into()))?;
    let context = NonEmptyText::optional(req.additional_context.as_deref());

    let (submission, job) = state.research.submit(topic, context, &owner)?;
    job.spawn();

    Ok(Json(ResearchRes {
        research_id: submission.research_id.to_string(),
        status: submission.status.as_str().into(),
        estimated_time: submission.estimated_time_secs,
    }))
}

#[utoipa::path(
    get,
    path = "/api/research/history",
    responses(
        (status = 200, description = "Research history, newest first", body = HistoryRes),
        (status = 401, description = "Unauthorized", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn research_history(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<HistoryRes>, ApiError> {
    let items = state
        .research
        .history(&owner)?
        .into_iter()
        .map(|entry| HistoryItem {
            research_id: entry.id.to_string(),
            topic: entry.topic,
            created_at: entry.created_at.to_rfc3339(),
        })
        .collect();
    Ok(Json(HistoryRes { items }))
}

#[utoipa::path(
    get,
    path = "/api/research/{id}/status",
    params(("id" = String, Path, description = "Research identifier")),
    responses(
        (status = 200, description = "Research status", body = StatusRes),
        (status = 403, description = "Access denied", body = ErrorRes),
        (status = 404, description = "Research not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn research_status(
    State(state): State<AppState>,
    Owner(owner): Owner,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<StatusRes>, ApiError> {
    let id = parse_research_id(&id)?;
    let status = state.research.status(&id, &owner)?;
    Ok(Json(status_res(status)))
}

#[utoipa::path(
    get,
    path = "/api/research/{id}",
    params(("id" = String, Path, description = "Research identifier")),
    responses(
        (status = 200, description = "Completed research report", body = ReportRes),
        (status = 400, description = "Research still in progress", body = ErrorRes),
        (status = 404, description = "Research not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_report(
    State(state): State<AppState>,
    Owner(owner): Owner,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ReportRes>, ApiError> {
    let id = parse_research_id(&id)?;
    let report = state.research.report(&id, &owner)?;
    Ok(Json(report_res(report)))
}

#[utoipa::path(
    get,
    path = "/api/research/{id}/pdf",
    params(("id" = String, Path, description = "Research identifier")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Research still in progress", body = ErrorRes),
        (status = 404, description = "Research not found", body = ErrorRes),
        (status = 500, description = "Error generating document", body = ErrorRes)
    )
)]
/// Render the report as a PDF and stream it to the client.
///
/// The document is rendered to a temporary file which is removed once the body has been
/// sent or the client goes away.
#[axum::debug_handler]
async fn download_document(
    State(state): State<AppState>,
    Owner(owner): Owner,
    AxumPath(id): AxumPath<String>,
) -> Result<Response, ApiError> {
    let id = parse_research_id(&id)?;
    let research = state.research.clone();
    let document = tokio::task::spawn_blocking(move || research.document(&id, &owner))
        .await
        .map_err(|e| ApiError::Internal(format!("render task failed: {}", e)))??;

    let file = tokio::fs::File::open(document.file.path())
        .await
        .map_err(|e| ApiError::Internal(format!("failed to open rendered document: {}", e)))?;
    let disposition = format!("attachment; filename=\"{}\"", document.filename);

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        document_body(file, document.file),
    )
        .into_response())
}

#[utoipa::path(
    delete,
    path = "/api/research/{id}",
    params(("id" = String, Path, description = "Research identifier")),
    responses(
        (status = 200, description = "Research deleted", body = MessageRes),
        (status = 404, description = "Research not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn delete_research(
    State(state): State<AppState>,
    Owner(owner): Owner,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<MessageRes>, ApiError> {
    let id = parse_research_id(&id)?;
    state.research.delete(&id, &owner)?;
    Ok(Json(MessageRes {
        message: "Research deleted successfully".into(),
    }))
}

/// Identifiers that are not canonical cannot name any research.
fn parse_research_id(raw: &str) -> Result<ResearchId, ApiError> {
    ResearchId::parse(raw).map_err(|_| ApiError::Research(ResearchError::RecordNotFound))
}

/// Holds a rendered document for the lifetime of a response body. The file is removed on a
/// blocking thread so the removal never stalls the runtime.
struct DocumentLease(Option<TempDocument>);

impl Drop for DocumentLease {
    fn drop(&mut self) {
        let Some(guard) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || drop(guard));
            }
            Err(_) => drop(guard),
        }
    }
}

/// Streams `file` in chunks, holding the document until the stream finishes or is dropped.
fn document_body(file: tokio::fs::File, guard: TempDocument) -> Body {
    let lease = DocumentLease(Some(guard));
    let chunks = stream::unfold(Some((file, lease)), |state| async move {
        let (mut file, lease) = state?;
        let mut buf = vec![0u8; DOCUMENT_CHUNK_BYTES];
        match file.read(&mut buf).await {
            Ok(0) => {
                drop(file);
                drop(lease);
                None
            }
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(buf), Some((file, lease))))
            }
            Err(e) => {
                tracing::error!("failed to read rendered document: {}", e);
                Some((Err(e), None))
            }
        }
    });
    Body::from_stream(chunks)
}

fn status_res(status: ResearchStatus) -> StatusRes {
    StatusRes {
        research_id: status.research_id.to_string(),
        status: status.status.as_str().into(),
        topic: status.topic,
        error: status.error,
        start_time: status.started_at.map(|t| t.to_rfc3339()),
    }
}

fn report_res(report: StoredReport) -> ReportRes {
    ReportRes {
        research_id: report.id.to_string(),
        topic: report.topic,
        summary: report.summary,
        sections: report
            .sections
            .into_iter()
            .map(|s| SectionDto {
                title: s.title,
                content: s.content,
            })
            .collect(),
        sources: report
            .sources
            .into_iter()
            .map(|s| SourceDto {
                title: s.title,
                url: s.url,
                snippet: s.snippet,
            })
            .collect(),
        created_at: report.created_at.to_rfc3339(),
    }
}
