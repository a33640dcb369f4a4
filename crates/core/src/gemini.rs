//! Streaming client for the Gemini `streamGenerateContent` endpoint.
//!
//! Responses arrive as server-sent events; each `data:` line holds one JSON chunk whose text
//! lives under `candidates[0].content.parts[*].text`.

use crate::model::{GenerationConfig, ModelClient, ModelError, TextStream};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client for `model`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotConfigured` if the API key or model name is blank.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ModelError> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(ModelError::NotConfigured("API key is empty".into()));
        }
        if model.trim().is_empty() {
            return Err(ModelError::NotConfigured("model name is empty".into()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: DEFAULT_GEMINI_BASE_URL.into(),
        })
    }

    /// Points the client at a different API host, e.g. a regional endpoint or a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<TextStream, ModelError> {
        tracing::debug!("requesting generation from model {}", self.model);
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt, config))
            .send()
            .await?;
        let resp = check_response(resp).await?;

        let pending: VecDeque<Result<String, ModelError>> = VecDeque::new();
        let state = (resp.bytes_stream().boxed(), SseDecoder::default(), pending, false);
        let chunks = stream::unfold(state, |(mut body, mut decoder, mut pending, mut done)| async move {
            loop {
                if let Some(item) = pending.pop_front() {
                    return Some((item, (body, decoder, pending, done)));
                }
                if done {
                    return None;
                }
                match body.next().await {
                    Some(Ok(bytes)) => pending.extend(decoder.push(&bytes)),
                    Some(Err(e)) => {
                        pending.push_back(Err(ModelError::Http(e)));
                        done = true;
                    }
                    None => {
                        pending.extend(decoder.finish());
                        done = true;
                    }
                }
            }
        });
        Ok(chunks.boxed())
    }
}

fn request_body(prompt: &str, config: &GenerationConfig) -> Value {
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }],
        }],
        "generationConfig": {
            "temperature": config.temperature,
            "topP": config.top_p,
            "topK": config.top_k,
            "maxOutputTokens": config.max_output_tokens,
            "responseMimeType": config.response_mime_type,
        },
    });
    if config.web_search {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }
    body
}

/// Maps a non-success response to `ModelError::Api` carrying the response body.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ModelError> {
    if !resp.status().is_success() {
        return Err(ModelError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Incremental server-sent-events decoder.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feeds raw bytes and returns the text of every complete event line.
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, ModelError>> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            out.extend(decode_line(&line));
        }
        out
    }

    /// Decodes whatever remains once the body has ended.
    fn finish(&mut self) -> Vec<Result<String, ModelError>> {
        let line = std::mem::take(&mut self.buffer);
        decode_line(&line).into_iter().collect()
    }
}

fn decode_line(line: &[u8]) -> Option<Result<String, ModelError>> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim(),
        Err(e) => {
            return Some(Err(ModelError::Stream(format!(
                "invalid UTF-8 in event stream: {}",
                e
            ))))
        }
    };
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let chunk: Value = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(ModelError::Stream(format!(
                "malformed event payload: {}",
                e
            ))))
        }
    };
    if let Some(error) = chunk.get("error") {
        return Some(Err(ModelError::Api {
            status: error.get("code").and_then(Value::as_u64).unwrap_or(500) as u16,
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        }));
    }

    let text = chunk_text(&chunk);
    if text.is_empty() {
        None
    } else {
        Some(Ok(text))
    }
}

fn chunk_text(chunk: &Value) -> String {
    chunk
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}
