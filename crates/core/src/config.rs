//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as
//! an `Arc<CoreConfig>`. Nothing in the core reads environment variables while handling a
//! request.

use crate::constants::{
    DEFAULT_FOOTER_TEXT, DEFAULT_MODEL_TIMEOUT_SECS, REPORTS_DIR_NAME,
};
use crate::{ResearchError, ResearchResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    research_data_dir: PathBuf,
    temp_dir: PathBuf,
    model_timeout: Duration,
    footer_text: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ResearchError::InvalidInput` if the timeout is zero or the footer text is
    /// blank.
    pub fn new(
        research_data_dir: PathBuf,
        temp_dir: PathBuf,
        model_timeout: Duration,
        footer_text: String,
    ) -> ResearchResult<Self> {
        if model_timeout.is_zero() {
            return Err(ResearchError::InvalidInput(
                "model timeout must be greater than zero".into(),
            ));
        }
        if footer_text.trim().is_empty() {
            return Err(ResearchError::InvalidInput(
                "footer text cannot be empty".into(),
            ));
        }

        Ok(Self {
            research_data_dir,
            temp_dir,
            model_timeout,
            footer_text,
        })
    }

    pub fn research_data_dir(&self) -> &Path {
        &self.research_data_dir
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.research_data_dir.join(REPORTS_DIR_NAME)
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn model_timeout(&self) -> Duration {
        self.model_timeout
    }

    pub fn footer_text(&self) -> &str {
        &self.footer_text
    }
}

/// Parse the model timeout from an optional string value (whole seconds).
///
/// If `value` is `None` or blank, returns the default timeout.
///
/// # Errors
///
/// Returns `ResearchError::InvalidInput` if the value is not a positive integer.
pub fn model_timeout_from_env_value(value: Option<String>) -> ResearchResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let secs = match value {
        Some(v) => v.parse::<u64>().map_err(|e| {
            ResearchError::InvalidInput(format!("invalid model timeout '{}': {}", v, e))
        })?,
        None => DEFAULT_MODEL_TIMEOUT_SECS,
    };

    if secs == 0 {
        return Err(ResearchError::InvalidInput(
            "model timeout must be greater than zero".into(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Resolve the footer attribution text, falling back to the default when unset or blank.
pub fn footer_text_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_FOOTER_TEXT.to_string())
}
