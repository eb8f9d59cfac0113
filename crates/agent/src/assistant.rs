use std::sync::Arc;

use crate::llm::VisionLlm;
use crate::prompt::build_chat_prompt;

pub const DEFAULT_ASSISTANT_PROMPT: &str = "You are a helpful AI assistant for RefineAI, a \
bathroom refinishing company. Answer questions about bathtub, shower, tile and countertop \
refinishing, pricing, and scheduling. Encourage visitors to upload a photo for an instant \
AI-generated quote.";

/// Produces assistant replies for the website chat widget.
///
/// When no model is configured, or the model call fails, the assistant
/// degrades to a canned reply so the widget never goes silent.
pub struct ChatAssistant {
    llm: Option<Arc<dyn VisionLlm>>,
    system_prompt: String,
}

impl ChatAssistant {
    pub fn new(llm: Option<Arc<dyn VisionLlm>>, system_prompt: Option<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt
                .filter(|prompt| !prompt.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ASSISTANT_PROMPT.to_string()),
        }
    }

    pub async fn reply(&self, user_message: &str) -> String {
        let Some(llm) = &self.llm else {
            return fallback_reply(user_message);
        };

        let prompt = build_chat_prompt(&self.system_prompt, user_message);
        match llm.complete(&prompt).await {
            Ok(reply) => reply.trim().to_string(),
            Err(error) => {
                tracing::warn!(
                    event_name = "chat.fallback",
                    error = %error,
                    "assistant model call failed, using canned reply"
                );
                fallback_reply(user_message)
            }
        }
    }
}

fn fallback_reply(user_message: &str) -> String {
    format!(
        "Thanks for reaching out! I couldn't reach our assistant just now, but we'd love to \
         help with \"{}\". Upload a photo of your bathtub, shower, tile or countertop on the \
         quote page for an instant estimate, or try the chat again in a moment.",
        user_message.trim()
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ChatAssistant, DEFAULT_ASSISTANT_PROMPT};
    use crate::estimator::testing::MockVisionLlm;

    #[tokio::test]
    async fn reply_uses_configured_persona() {
        let llm = Arc::new(MockVisionLlm::replying("We refinish bathtubs starting at $450."));
        let assistant =
            ChatAssistant::new(Some(llm.clone()), Some("You are a pricing expert.".to_string()));

        let reply = assistant.reply("How much is a bathtub?").await;
        assert_eq!(reply, "We refinish bathtubs starting at $450.");

        let prompt = llm.last_prompt.lock().expect("prompt lock").clone().expect("prompt recorded");
        assert!(prompt.starts_with("You are a pricing expert."));
        assert!(prompt.contains("How much is a bathtub?"));
    }

    #[tokio::test]
    async fn blank_persona_falls_back_to_default_prompt() {
        let llm = Arc::new(MockVisionLlm::replying("ok"));
        let assistant = ChatAssistant::new(Some(llm.clone()), Some("   ".to_string()));

        assistant.reply("hello").await;
        let prompt = llm.last_prompt.lock().expect("prompt lock").clone().expect("prompt recorded");
        assert!(prompt.starts_with(DEFAULT_ASSISTANT_PROMPT));
    }

    #[tokio::test]
    async fn model_failure_degrades_to_canned_reply() {
        let assistant = ChatAssistant::new(Some(Arc::new(MockVisionLlm::failing(500))), None);
        let reply = assistant.reply("Do you do tile?").await;
        assert!(reply.contains("Do you do tile?"));
        assert!(reply.contains("Upload a photo"));
    }

    #[tokio::test]
    async fn missing_model_uses_canned_reply() {
        let assistant = ChatAssistant::new(None, None);
        let reply = assistant.reply("weekend availability?").await;
        assert!(reply.contains("weekend availability?"));
    }
}
