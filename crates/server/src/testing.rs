//! Shared fixtures for handler-level tests: an in-memory database with
//! the default catalog, plus a scripted stand-in for the vision model.

use std::sync::Mutex;

use async_trait::async_trait;
use refineai_agent::{LlmError, VisionLlm};
use refineai_core::config::AppConfig;
use refineai_db::{connect_with_settings, migrations, SeedDataset};
use uuid::Uuid;

use crate::state::AppState;

/// A reply that passes pricing-analysis validation, wrapped in the kind
/// of prose a real model produces.
pub const GOOD_ANALYSIS_REPLY: &str = r#"Here is my assessment of the photo.
{
  "totalPrice": 725,
  "breakdown": {"basePrice": 480, "complexityMultiplier": 1.3, "additionalFees": 75, "laborHours": 8},
  "complexity": 4,
  "surfaceArea": 45,
  "conditionAssessment": {"damage": ["three small chips"], "cleanability": "fair", "existingFinish": "worn fiberglass"},
  "recommendations": ["repair chips before coating"]
}"#;

pub fn new_correlation() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Builds an [`AppState`] over a fresh in-memory database with the
/// default catalog loaded and no model credential configured.
pub async fn setup_state() -> AppState {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    SeedDataset::load(&pool).await.expect("seed");

    let mut config = AppConfig::default();
    config.admin.username = "owner".to_string();
    config.admin.password = "hunter2".to_string().into();
    config.uploads.dir = tempfile::TempDir::new().expect("tempdir").into_path();

    AppState::new(config, pool)
}

/// Scripted vision model: replays one canned reply (or failure) and
/// records the last prompt it was given.
pub struct MockVisionLlm {
    reply: Result<String, u16>,
    pub last_prompt: Mutex<Option<String>>,
}

impl MockVisionLlm {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Ok(reply.to_string()), last_prompt: Mutex::new(None) }
    }

    pub fn failing(status: u16) -> Self {
        Self { reply: Err(status), last_prompt: Mutex::new(None) }
    }

    fn respond(&self, prompt: &str) -> Result<String, LlmError> {
        *self.last_prompt.lock().expect("prompt lock") = Some(prompt.to_string());
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(status) => {
                Err(LlmError::Api { status: *status, message: "scripted failure".to_string() })
            }
        }
    }
}

#[async_trait]
impl VisionLlm for MockVisionLlm {
    async fn analyze_image(
        &self,
        _image_base64: &str,
        _mime_type: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        self.respond(prompt)
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.respond(prompt)
    }
}
