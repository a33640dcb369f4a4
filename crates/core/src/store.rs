//! Persistence of completed research reports.
//!
//! Reports are keyed by research identifier and scoped to their owner: every read filters on
//! the owner and hides soft-deleted reports, so a caller can never observe another owner's
//! report.
//!
//! Two backends are provided. [`FileReportStore`] keeps one JSON file per report in a sharded
//! directory tree:
//!
//! ```text
//! <research_data_dir>/reports/<s1>/<s2>/<id>/report.json
//! ```
//!
//! where `s1`/`s2` are the first four hex characters of the identifier.
//! [`MemoryReportStore`] keeps reports in process memory and is used by tests and one-off
//! tools.

use crate::constants::REPORT_JSON_FILENAME;
use crate::report::{ReportSummary, StoredReport};
use dashmap::DashMap;
use research_uuid::ResearchId;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create report directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write report file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read report file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize report: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize report {path}: {source}")]
    Deserialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Owner-scoped report persistence.
pub trait ReportStore: Send + Sync {
    /// Inserts or replaces the report with `report.id`.
    fn upsert(&self, report: &StoredReport) -> StoreResult<()>;

    /// Returns the report if it exists, belongs to `owner_id` and is not deleted.
    fn find(&self, id: &ResearchId, owner_id: &str) -> StoreResult<Option<StoredReport>>;

    /// Lists `owner_id`'s visible reports, newest first.
    fn list(&self, owner_id: &str) -> StoreResult<Vec<ReportSummary>>;

    /// Marks the report deleted. Returns `false` if no visible report matched.
    fn soft_delete(&self, id: &ResearchId, owner_id: &str) -> StoreResult<bool>;
}

fn newest_first(mut entries: Vec<ReportSummary>) -> Vec<ReportSummary> {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
}

/// File-backed report store.
#[derive(Debug, Clone)]
pub struct FileReportStore {
    reports_dir: PathBuf,
}

impl FileReportStore {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Creates the reports directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DirCreation` if the directory cannot be created.
    pub fn ensure_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.reports_dir).map_err(StoreError::DirCreation)
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    fn report_path(&self, id: &ResearchId) -> PathBuf {
        id.sharded_dir(&self.reports_dir).join(REPORT_JSON_FILENAME)
    }

    fn read(&self, path: &Path) -> StoreResult<Option<StoredReport>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::FileRead(e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Deserialization {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Writes through a sibling temporary file so readers never see a partial report.
    fn write(&self, report: &StoredReport) -> StoreResult<()> {
        let report_dir = report.id.sharded_dir(&self.reports_dir);
        fs::create_dir_all(&report_dir).map_err(StoreError::DirCreation)?;

        let json = serde_json::to_string_pretty(report).map_err(StoreError::Serialization)?;
        let final_path = report_dir.join(REPORT_JSON_FILENAME);
        let staging_path = report_dir.join(format!("{}.tmp", REPORT_JSON_FILENAME));
        fs::write(&staging_path, json).map_err(StoreError::FileWrite)?;
        fs::rename(&staging_path, &final_path).map_err(StoreError::FileWrite)
    }

    /// Walks every report file in the sharded tree.
    fn report_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let s1_iter = match fs::read_dir(&self.reports_dir) {
            Ok(it) => it,
            Err(_) => return files,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let report_path = id_ent.path().join(REPORT_JSON_FILENAME);
                    if report_path.is_file() {
                        files.push(report_path);
                    }
                }
            }
        }

        files
    }
}

impl ReportStore for FileReportStore {
    fn upsert(&self, report: &StoredReport) -> StoreResult<()> {
        self.write(report)?;
        tracing::debug!("stored report {} for owner {}", report.id, report.owner_id);
        Ok(())
    }

    fn find(&self, id: &ResearchId, owner_id: &str) -> StoreResult<Option<StoredReport>> {
        Ok(self
            .read(&self.report_path(id))?
            .filter(|report| report.is_visible_to(owner_id)))
    }

    fn list(&self, owner_id: &str) -> StoreResult<Vec<ReportSummary>> {
        let mut entries = Vec::new();
        for path in self.report_files() {
            match self.read(&path) {
                Ok(Some(report)) if report.is_visible_to(owner_id) => {
                    entries.push(report.summary_entry())
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping unreadable report: {}", e),
            }
        }
        Ok(newest_first(entries))
    }

    fn soft_delete(&self, id: &ResearchId, owner_id: &str) -> StoreResult<bool> {
        let Some(mut report) = self.find(id, owner_id)? else {
            return Ok(false);
        };
        report.deleted = true;
        self.write(&report)?;
        tracing::info!("soft-deleted report {}", id);
        Ok(true)
    }
}

/// In-memory report store.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: DashMap<ResearchId, StoredReport>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn upsert(&self, report: &StoredReport) -> StoreResult<()> {
        self.reports.insert(report.id, report.clone());
        Ok(())
    }

    fn find(&self, id: &ResearchId, owner_id: &str) -> StoreResult<Option<StoredReport>> {
        Ok(self
            .reports
            .get(id)
            .filter(|report| report.is_visible_to(owner_id))
            .map(|report| report.value().clone()))
    }

    fn list(&self, owner_id: &str) -> StoreResult<Vec<ReportSummary>> {
        let entries = self
            .reports
            .iter()
            .filter(|report| report.is_visible_to(owner_id))
            .map(|report| report.summary_entry())
            .collect();
        Ok(newest_first(entries))
    }

    fn soft_delete(&self, id: &ResearchId, owner_id: &str) -> StoreResult<bool> {
        match self.reports.get_mut(id) {
            Some(mut report) if report.is_visible_to(owner_id) => {
                report.deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
