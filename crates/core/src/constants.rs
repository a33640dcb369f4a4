//! Constants used throughout the research core crate.

/// Default directory for persisted reports when none is configured.
pub const DEFAULT_RESEARCH_DATA_DIR: &str = "research_data";

/// Directory name for report records under the data directory.
pub const REPORTS_DIR_NAME: &str = "reports";

/// Filename for a persisted report record.
pub const REPORT_JSON_FILENAME: &str = "report.json";

/// Default generative model.
pub const DEFAULT_MODEL_NAME: &str = "gemini-2.0-flash";

/// Default ceiling on a single model call, in seconds.
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 300;

/// Default attribution line drawn in every document footer.
pub const DEFAULT_FOOTER_TEXT: &str = "Generated by LibreResearch";

/// Prefix of downloaded document filenames.
pub const DOCUMENT_FILENAME_PREFIX: &str = "LibreResearch";

/// Estimated seconds until a submitted task completes, reported to clients.
pub const ESTIMATED_RESEARCH_SECS: u32 = 60;

/// Characters of raw model output kept in the fallback report.
pub const FALLBACK_RAW_PREFIX_CHARS: usize = 1000;

/// Characters of raw model output written to the debug log.
pub const RAW_PREVIEW_CHARS: usize = 200;

/// Source URLs longer than this are truncated in documents.
pub const MAX_SOURCE_URL_CHARS: usize = 80;

/// Source descriptions longer than this are truncated in documents.
pub const MAX_SOURCE_SNIPPET_CHARS: usize = 300;

/// Marker appended to any truncated text.
pub const TRUNCATION_MARKER: &str = "...";
