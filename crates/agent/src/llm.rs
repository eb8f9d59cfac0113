use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("llm api error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("llm returned an empty reply")]
    EmptyReply,
    #[error("llm client is not configured: {0}")]
    NotConfigured(String),
}

/// A hosted multimodal model that can look at one image and answer in text.
#[async_trait]
pub trait VisionLlm: Send + Sync {
    /// Sends `prompt` together with one inline image and returns the raw
    /// text reply.
    async fn analyze_image(
        &self,
        image_base64: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, LlmError>;

    /// Text-only completion, used by the chat assistant.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
