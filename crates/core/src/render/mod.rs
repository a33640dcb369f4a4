//! Document rendering.
//!
//! A report is rendered in four stages: text is sanitized and classified into blocks,
//! blocks become flowables, flowables are laid out onto pages, and the footer is drawn on
//! every page once layout has settled. The pages are then written as PDF.
//!
//! Rendering is synchronous and CPU-bound; async callers should run it on a blocking thread.

mod document;
pub mod fonts;
pub mod layout;
mod pdf;
mod temp;

pub use temp::TempDocument;

use crate::report::ReportDraft;
use crate::sanitize::sanitize_text;
use chrono::{NaiveDate, Utc};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to encode page content: {0}")]
    Encode(String),
    #[error("failed to serialize document: {0}")]
    Write(String),
    #[error("failed to write document file: {0}")]
    FileWrite(std::io::Error),
}

/// Per-render settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Attribution drawn in every page footer.
    pub footer_text: String,
    /// Date shown on the title page.
    pub generated_on: NaiveDate,
}

impl RenderOptions {
    /// Options dated today (UTC).
    pub fn today(footer_text: impl Into<String>) -> Self {
        Self {
            footer_text: footer_text.into(),
            generated_on: Utc::now().date_naive(),
        }
    }
}

/// A rendered document held in memory.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Renders a report on `topic` to PDF bytes.
///
/// # Errors
///
/// Returns a `RenderError` if the document cannot be encoded.
pub fn render_report(
    topic: &str,
    draft: &ReportDraft,
    options: &RenderOptions,
) -> Result<RenderedDocument, RenderError> {
    let flowables = document::report_flowables(topic, draft, options.generated_on);
    let mut pages = layout::layout(&flowables);
    layout::apply_footer(&mut pages, &sanitize_text(&options.footer_text));

    let bytes = pdf::write_pdf(&pages, &sanitize_text(topic))?;
    tracing::debug!(
        "rendered document with {} pages ({} bytes)",
        pages.len(),
        bytes.len()
    );

    Ok(RenderedDocument {
        page_count: pages.len(),
        bytes,
    })
}

/// Renders a report and writes it to `path`, returning the page count.
///
/// The caller owns cleanup of `path` on failure; see [`TempDocument`].
///
/// # Errors
///
/// Returns a `RenderError` if rendering or writing fails.
pub fn render_to_file(
    topic: &str,
    draft: &ReportDraft,
    options: &RenderOptions,
    path: &Path,
) -> Result<usize, RenderError> {
    let rendered = render_report(topic, draft, options)?;
    std::fs::write(path, &rendered.bytes).map_err(RenderError::FileWrite)?;
    Ok(rendered.page_count)
}
