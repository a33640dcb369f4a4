//! # Research Core
//!
//! Core business logic for the research report service.
//!
//! This crate turns a research topic into a persisted, renderable report:
//! - Prompting a generative model and buffering its streamed reply
//! - Recovering a structured report from unreliable model output
//! - Tracking in-flight research tasks
//! - Owner-scoped report storage with sharded JSON files
//! - Rendering reports with lightweight markup to paginated PDF documents
//!
//! **No API concerns**: Authentication and HTTP servers belong in `api-rest` or `api-shared`.

pub mod blocks;
pub mod config;
pub mod constants;
pub mod error;
pub mod gemini;
pub mod markup;
pub mod model;
pub mod normalizer;
pub mod prompt;
pub mod render;
pub mod report;
pub mod research;
pub mod sanitize;
pub mod store;
pub mod tasks;

pub use config::CoreConfig;
pub use error::{ResearchError, ResearchResult};
pub use gemini::GeminiClient;
pub use model::{GenerationConfig, ModelClient, ModelError};
pub use normalizer::{normalize, Normalized};
pub use render::{render_report, RenderError, RenderOptions};
pub use report::{ReportDraft, ReportSummary, Section, Source, StoredReport};
pub use research::{GeneratedDocument, ResearchJob, ResearchService, ResearchStatus, Submission};
pub use store::{FileReportStore, MemoryReportStore, ReportStore, StoreError};
pub use tasks::{TaskState, TaskStatusStore};

pub use research_types::NonEmptyText;
pub use research_uuid::ResearchId;
