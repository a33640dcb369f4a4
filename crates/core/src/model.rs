//! Generative model boundary.
//!
//! The research service only needs one capability from a model: turn a prompt into a stream
//! of text chunks. [`ModelClient`] captures that, so the production Gemini client and the
//! in-process [`ScriptedModel`] are interchangeable.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed model stream: {0}")]
    Stream(String),
    #[error("model client not configured: {0}")]
    NotConfigured(String),
}

/// Stream of text chunks produced by a model.
pub type TextStream = BoxStream<'static, Result<String, ModelError>>;

/// Sampling and tooling settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Enables the provider's web-search grounding tool.
    pub web_search: bool,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            web_search: true,
            response_mime_type: "text/plain".into(),
        }
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Starts a generation for `prompt` and returns its text chunks in arrival order.
    async fn generate_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<TextStream, ModelError>;
}

/// Buffers a whole stream into one string, stopping at the first failed chunk.
pub async fn collect_text(mut stream: TextStream) -> Result<String, ModelError> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}

/// Behaviour of a [`ScriptedModel`].
#[derive(Debug, Clone)]
pub enum Script {
    /// Yield these chunks, then end.
    Chunks(Vec<String>),
    /// Refuse the call before streaming anything.
    Unavailable(String),
    /// Yield these chunks, then fail mid-stream.
    BrokenStream(Vec<String>, String),
    /// Never produce anything.
    Hang,
}

/// In-process model that replays a fixed script. Used by tests and offline tooling.
#[derive(Debug)]
pub struct ScriptedModel {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replies with `text` split into a few chunks.
    pub fn replying(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let chunks = chars
            .chunks(64)
            .map(|chunk| chunk.iter().collect())
            .collect();
        Self::new(Script::Chunks(chunks))
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate_stream(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<TextStream, ModelError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match &self.script {
            Script::Chunks(chunks) => Ok(stream::iter(chunks.clone().into_iter().map(Ok)).boxed()),
            Script::Unavailable(message) => Err(ModelError::Api {
                status: 503,
                message: message.clone(),
            }),
            Script::BrokenStream(chunks, message) => {
                let failure = ModelError::Stream(message.clone());
                Ok(stream::iter(chunks.clone().into_iter().map(Ok))
                    .chain(stream::once(async move { Err(failure) }))
                    .boxed())
            }
            Script::Hang => Ok(stream::pending::<Result<String, ModelError>>().boxed()),
        }
    }
}
