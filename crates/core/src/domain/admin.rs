use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Runtime-editable settings stored as a single database row.
///
/// `llm_api_key`, when set, takes precedence over the key from the
/// process configuration so operators can rotate credentials without a
/// restart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    pub id: String,
    pub webhook_url: Option<String>,
    pub llm_provider: String,
    pub llm_api_key: Option<String>,
    pub assistant_prompt: Option<String>,
    pub updated_at: DateTime<Utc>,
}
