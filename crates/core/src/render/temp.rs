use research_uuid::ResearchId;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A document file that is deleted when this guard is dropped.
///
/// The guard is created before anything is written, so a failed render cleans up a partial
/// file as well as a completed one. Hold it for as long as the file is being read or sent.
#[derive(Debug)]
pub struct TempDocument {
    path: PathBuf,
}

impl TempDocument {
    /// Reserves a collision-resistant path for a document about `id` inside `dir`.
    ///
    /// Nothing is created on disk until the caller writes to [`TempDocument::path`].
    pub fn reserve(dir: &Path, id: &ResearchId) -> Self {
        let nonce = Uuid::new_v4().simple().to_string();
        let path = dir.join(format!("research-{}-{}.pdf", id, &nonce[..8]));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDocument {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("removed temporary document {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "failed to remove temporary document {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
