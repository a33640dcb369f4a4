use api_rest::AppState;
use api_shared::StaticTokenIdentity;
use axum::http::HeaderValue;
use research_core::{
    config::{footer_text_from_env_value, model_timeout_from_env_value},
    constants::{DEFAULT_MODEL_NAME, DEFAULT_RESEARCH_DATA_DIR},
    CoreConfig, FileReportStore, GeminiClient, ResearchService, TaskStatusStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the LibreResearch server
///
/// Resolves configuration from the environment once, then serves the REST API.
///
/// # Environment Variables
/// - `RESEARCH_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `RESEARCH_DATA_DIR`: Report store root (default: "research_data")
/// - `RESEARCH_TEMP_DIR`: Where documents are rendered (default: system temp dir)
/// - `GEMINI_API_KEY`: Model credential (required)
/// - `GEMINI_MODEL`: Model name (default: "gemini-2.0-flash")
/// - `RESEARCH_MODEL_TIMEOUT_SECS`: Model call timeout (default: 300)
/// - `RESEARCH_API_TOKENS`: Bearer tokens as `token:owner,token:owner`
/// - `RESEARCH_FOOTER_TEXT`: Document footer attribution
/// - `RESEARCH_CORS_ORIGINS`: Comma-separated allowed origins (default: any)
///
/// # Errors
/// Returns an error if configuration is invalid, the data directory cannot be created, or the
/// server fails to bind or run.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("research_run=info".parse()?)
                .add_directive("research_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("RESEARCH_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let data_dir = std::env::var("RESEARCH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_RESEARCH_DATA_DIR));
    let temp_dir = std::env::var("RESEARCH_TEMP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir());
    let cfg = Arc::new(CoreConfig::new(
        data_dir,
        temp_dir,
        model_timeout_from_env_value(std::env::var("RESEARCH_MODEL_TIMEOUT_SECS").ok())?,
        footer_text_from_env_value(std::env::var("RESEARCH_FOOTER_TEXT").ok()),
    )?);

    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY must be set"))?;
    let model_name = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_NAME.into());
    let model = GeminiClient::new(api_key, model_name)?;

    let store = FileReportStore::new(cfg.reports_dir());
    store.ensure_dir()?;
    std::fs::create_dir_all(cfg.temp_dir())?;

    let identity = StaticTokenIdentity::from_env_value(std::env::var("RESEARCH_API_TOKENS").ok())?;
    let cors = cors_layer_from_env_value(std::env::var("RESEARCH_CORS_ORIGINS").ok())?;

    tracing::info!(
        "++ Starting LibreResearch REST on {} (model {}, {} API tokens, reports in {})",
        rest_addr,
        model.model(),
        identity.len(),
        cfg.reports_dir().display()
    );

    let research = ResearchService::new(
        cfg,
        TaskStatusStore::new(),
        Arc::new(store),
        Arc::new(model),
    );
    let app = api_rest::router(AppState {
        research,
        identity: Arc::new(identity),
    })
    .layer(cors);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the CORS layer from a comma-separated origin list; unset or blank allows any origin.
fn cors_layer_from_env_value(value: Option<String>) -> anyhow::Result<CorsLayer> {
    let origins = value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(HeaderValue::from_str)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
