use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::llm::{LlmError, VisionLlm};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(
        api_key: SecretString,
        base_url: Option<String>,
        model: String,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            max_retries,
        })
    }

    async fn generate(&self, parts: serde_json::Value) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key.expose_secret(),
        );
        let body = json!({ "contents": [{ "parts": parts }] });

        let mut attempt = 0u32;
        loop {
            match self.generate_once(&url, &body).await {
                Ok(reply) => return Ok(reply),
                Err(error) if attempt < self.max_retries && is_retryable(&error) => {
                    attempt += 1;
                    tracing::warn!(
                        event_name = "llm.retry",
                        model = %self.model,
                        attempt,
                        error = %error,
                        "retrying gemini request"
                    );
                    tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn generate_once(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<String, LlmError> {
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| String::new());
            return Err(LlmError::Api { status: status.as_u16(), message });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let reply = payload
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(LlmError::EmptyReply);
        }

        Ok(reply)
    }
}

#[async_trait]
impl VisionLlm for GeminiClient {
    async fn analyze_image(
        &self,
        image_base64: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let parts = json!([
            { "text": prompt },
            { "inline_data": { "mime_type": mime_type, "data": image_base64 } },
        ]);
        self.generate(parts).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate(json!([{ "text": prompt }])).await
    }
}

fn is_retryable(error: &LlmError) -> bool {
    match error {
        LlmError::Transport(source) => source.is_timeout() || source.is_connect(),
        LlmError::Api { status, .. } => *status == 429 || *status >= 500,
        LlmError::EmptyReply | LlmError::NotConfigured(_) => false,
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{is_retryable, GenerateContentResponse};
    use crate::llm::LlmError;

    #[test]
    fn response_parsing_joins_text_parts() {
        let payload: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
                ]
            }"#,
        )
        .expect("parse response");

        let candidate = payload.candidates.into_iter().next().expect("candidate");
        let text = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn response_without_candidates_parses_as_empty() {
        let payload: GenerateContentResponse =
            serde_json::from_str("{}").expect("parse empty response");
        assert!(payload.candidates.is_empty());
    }

    #[test]
    fn server_errors_are_retryable_but_client_errors_are_not() {
        assert!(is_retryable(&LlmError::Api { status: 500, message: String::new() }));
        assert!(is_retryable(&LlmError::Api { status: 429, message: String::new() }));
        assert!(!is_retryable(&LlmError::Api { status: 400, message: String::new() }));
        assert!(!is_retryable(&LlmError::EmptyReply));
    }
}
