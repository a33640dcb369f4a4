//! Research orchestration.
//!
//! [`ResearchService`] is the core surface used by the transport layers. Submitting a topic
//! registers an `in_progress` task and hands back a [`ResearchJob`]; the caller decides when
//! the job starts (normally right after the submission response has been produced). The job
//! is the only writer of its task's status.

use crate::config::CoreConfig;
use crate::constants::{ESTIMATED_RESEARCH_SECS, RAW_PREVIEW_CHARS};
use crate::model::{collect_text, GenerationConfig, ModelClient, ModelError};
use crate::normalizer::normalize;
use crate::prompt::build_prompt;
use crate::render::{render_to_file, RenderOptions, TempDocument};
use crate::report::{ReportSummary, StoredReport};
use crate::sanitize::document_filename;
use crate::store::ReportStore;
use crate::tasks::{TaskState, TaskStatusStore};
use crate::{ResearchError, ResearchResult};
use chrono::{DateTime, Utc};
use research_types::NonEmptyText;
use research_uuid::ResearchId;
use std::sync::Arc;
use std::time::Duration;

/// Acknowledgement of an accepted research request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub research_id: ResearchId,
    pub status: TaskState,
    pub estimated_time_secs: u32,
}

/// Status of a research task as seen by its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchStatus {
    pub research_id: ResearchId,
    pub status: TaskState,
    pub topic: String,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// A rendered document ready to be sent. The file is removed when this value is dropped.
#[derive(Debug)]
pub struct GeneratedDocument {
    pub file: TempDocument,
    pub filename: String,
    pub page_count: usize,
}

#[derive(Clone)]
pub struct ResearchService {
    cfg: Arc<CoreConfig>,
    tasks: TaskStatusStore,
    store: Arc<dyn ReportStore>,
    model: Arc<dyn ModelClient>,
    generation: GenerationConfig,
}

impl ResearchService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        tasks: TaskStatusStore,
        store: Arc<dyn ReportStore>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            cfg,
            tasks,
            store,
            model,
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn tasks(&self) -> &TaskStatusStore {
        &self.tasks
    }

    /// Accepts a research request for `owner_id` and returns the job that will carry it out.
    ///
    /// The job has not started; call [`ResearchJob::spawn`] once the submission has been
    /// acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `ResearchError::InvalidInput` if the owner identity is blank.
    pub fn submit(
        &self,
        topic: NonEmptyText,
        context: Option<NonEmptyText>,
        owner_id: &str,
    ) -> ResearchResult<(Submission, ResearchJob)> {
        if owner_id.trim().is_empty() {
            return Err(ResearchError::InvalidInput("owner identity is required".into()));
        }

        let id = ResearchId::new();
        self.tasks
            .register(id, owner_id, topic.as_str())
            .map_err(|e| ResearchError::InvalidInput(e.to_string()))?;
        tracing::info!("accepted research task {} for owner {}", id, owner_id);

        let job = ResearchJob {
            id,
            owner_id: owner_id.to_string(),
            prompt: build_prompt(topic.as_str(), context.as_ref().map(NonEmptyText::as_str)),
            topic: topic.into_inner(),
            tasks: self.tasks.clone(),
            store: Arc::clone(&self.store),
            model: Arc::clone(&self.model),
            generation: self.generation.clone(),
            timeout: self.cfg.model_timeout(),
        };
        let submission = Submission {
            research_id: id,
            status: TaskState::InProgress,
            estimated_time_secs: ESTIMATED_RESEARCH_SECS,
        };
        Ok((submission, job))
    }

    /// Current status of a task.
    ///
    /// Tasks no longer tracked in memory (for example after a restart) report `completed`
    /// when their report is in the store.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if the task belongs to someone else
    /// - `RecordNotFound` if the task is unknown both in memory and in the store
    pub fn status(&self, id: &ResearchId, owner_id: &str) -> ResearchResult<ResearchStatus> {
        if let Some(task) = self.tasks.get(id) {
            if task.owner_id != owner_id {
                return Err(ResearchError::AccessDenied);
            }
            return Ok(ResearchStatus {
                research_id: *id,
                status: task.state,
                topic: task.topic,
                error: task.error,
                started_at: Some(task.submitted_at),
            });
        }

        match self.store.find(id, owner_id)? {
            Some(report) => Ok(ResearchStatus {
                research_id: *id,
                status: TaskState::Completed,
                topic: report.topic,
                error: None,
                started_at: None,
            }),
            None => Err(ResearchError::RecordNotFound),
        }
    }

    /// The stored report for a task.
    ///
    /// # Errors
    ///
    /// - `StillInProgress` if the owner's task has not reached a terminal state
    /// - `RecordNotFound` if there is no visible report (including failed tasks)
    pub fn report(&self, id: &ResearchId, owner_id: &str) -> ResearchResult<StoredReport> {
        if let Some(task) = self.tasks.get(id) {
            if task.owner_id == owner_id && !task.state.is_terminal() {
                return Err(ResearchError::StillInProgress);
            }
        }
        self.store
            .find(id, owner_id)?
            .ok_or(ResearchError::RecordNotFound)
    }

    /// Renders the task's report to a temporary document.
    ///
    /// Rendering is CPU-bound; async callers should invoke this on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ResearchService::report`], or `RenderFailure` if the
    /// document cannot be produced. No file is left behind on failure.
    pub fn document(&self, id: &ResearchId, owner_id: &str) -> ResearchResult<GeneratedDocument> {
        let report = self.report(id, owner_id)?;

        let file = TempDocument::reserve(self.cfg.temp_dir(), id);
        let options = RenderOptions::today(self.cfg.footer_text());
        let page_count = render_to_file(&report.topic, &report.draft(), &options, file.path())
            .map_err(|e| {
                tracing::error!("failed to render document for {}: {}", id, e);
                ResearchError::RenderFailure(e)
            })?;

        tracing::info!("rendered {} page document for {}", page_count, id);
        Ok(GeneratedDocument {
            file,
            filename: document_filename(&report.topic),
            page_count,
        })
    }

    /// Soft-deletes the task's report.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if there is no visible report to delete.
    pub fn delete(&self, id: &ResearchId, owner_id: &str) -> ResearchResult<()> {
        if self.store.soft_delete(id, owner_id)? {
            tracing::info!("deleted research report {}", id);
            Ok(())
        } else {
            Err(ResearchError::RecordNotFound)
        }
    }

    /// The owner's reports, newest first.
    pub fn history(&self, owner_id: &str) -> ResearchResult<Vec<ReportSummary>> {
        Ok(self.store.list(owner_id)?)
    }
}

/// One research run. Consumed when started, so it can only run once.
pub struct ResearchJob {
    id: ResearchId,
    owner_id: String,
    topic: String,
    prompt: String,
    tasks: TaskStatusStore,
    store: Arc<dyn ReportStore>,
    model: Arc<dyn ModelClient>,
    generation: GenerationConfig,
    timeout: Duration,
}

impl ResearchJob {
    pub fn id(&self) -> ResearchId {
        self.id
    }

    /// Runs the job on the tokio runtime without waiting for it.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs the job to completion, recording the outcome in the task status store.
    pub async fn run(self) {
        let id = self.id;
        if let Err(e) = self.tasks.mark_processing(&id) {
            tracing::error!("research task {} could not start: {}", id, e);
            return;
        }
        tracing::info!("research task {} processing", id);

        let outcome = match self.execute().await {
            Ok(()) => self.tasks.mark_completed(&id),
            Err(e) => {
                tracing::error!("research task {} failed: {:?}", id, e);
                self.tasks.mark_failed(&id, e.to_string())
            }
        };
        match outcome {
            Ok(()) => tracing::info!("research task {} finished", id),
            Err(e) => tracing::error!("research task {} status update failed: {}", id, e),
        }
    }

    async fn execute(&self) -> ResearchResult<()> {
        let raw = tokio::time::timeout(self.timeout, self.generate())
            .await
            .map_err(|_| ResearchError::ModelTimeout(self.timeout.as_secs()))??;

        let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
        tracing::debug!("research task {} raw response preview: {}", self.id, preview);

        let normalized = normalize(&raw);
        if normalized.success {
            tracing::debug!(
                "research task {} parsed with strategy {:?}",
                self.id,
                normalized.strategy
            );
        }

        let report = StoredReport::new(
            self.id,
            self.owner_id.as_str(),
            self.topic.as_str(),
            normalized.draft,
            Utc::now(),
        )?;
        self.store.upsert(&report)?;
        Ok(())
    }

    async fn generate(&self) -> Result<String, ModelError> {
        let stream = self
            .model
            .generate_stream(&self.prompt, &self.generation)
            .await?;
        collect_text(stream).await
    }
}
