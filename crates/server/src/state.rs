use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use refineai_agent::{GeminiClient, VisionLlm};
use refineai_core::config::{AppConfig, LlmProvider};
use refineai_core::domain::admin::AdminSettings;
use refineai_db::repositories::{
    AdminConfigRepository, ChatMessageRepository, QuoteRepository, RepositoryError,
    ServiceTypeRepository, SqlAdminConfigRepository, SqlChatMessageRepository, SqlQuoteRepository,
    SqlServiceTypeRepository,
};
use refineai_db::DbPool;
use secrecy::ExposeSecret;
use uuid::Uuid;

/// Shared state for the public API, the admin API, and the chat relay.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub service_types: Arc<dyn ServiceTypeRepository>,
    pub chat_messages: Arc<dyn ChatMessageRepository>,
    pub admin_config: Arc<dyn AdminConfigRepository>,
    pub sessions: SessionStore,
    pub connections: ConnectionRegistry,
    pub http: reqwest::Client,
    /// Model client built from process configuration at startup. A key
    /// stored through the admin API takes precedence at call time.
    llm: Option<Arc<dyn VisionLlm>>,
}

impl AppState {
    pub fn new(config: AppConfig, db_pool: DbPool) -> Self {
        let llm = build_config_llm(&config);
        Self {
            config: Arc::new(config),
            quotes: Arc::new(SqlQuoteRepository::new(db_pool.clone())),
            service_types: Arc::new(SqlServiceTypeRepository::new(db_pool.clone())),
            chat_messages: Arc::new(SqlChatMessageRepository::new(db_pool.clone())),
            admin_config: Arc::new(SqlAdminConfigRepository::new(db_pool)),
            sessions: SessionStore::default(),
            connections: ConnectionRegistry::default(),
            http: reqwest::Client::new(),
            llm,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn VisionLlm>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Resolves the vision model for the current call.
    ///
    /// A key saved in `admin_config` wins over the configured key so
    /// operators can rotate credentials without a restart. `None` means
    /// no usable credential is available anywhere.
    pub async fn vision_llm(&self) -> Result<Option<Arc<dyn VisionLlm>>, RepositoryError> {
        let settings = self.admin_config.get().await?;

        if let Some(db_key) = settings
            .as_ref()
            .and_then(|settings| settings.llm_api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
        {
            let provider = settings
                .as_ref()
                .map(|settings| settings.llm_provider.as_str())
                .unwrap_or("gemini");
            if provider != LlmProvider::Gemini.as_str() {
                tracing::warn!(
                    event_name = "llm.provider_unsupported",
                    provider = %provider,
                    "stored provider has no shipped client, falling back to process config"
                );
            } else {
                let client = GeminiClient::new(
                    db_key.to_string().into(),
                    self.config.llm.base_url.clone(),
                    self.config.llm.model.clone(),
                    self.config.llm.timeout_secs,
                    self.config.llm.max_retries,
                );
                match client {
                    Ok(client) => return Ok(Some(Arc::new(client))),
                    Err(error) => tracing::warn!(
                        event_name = "llm.client_build_failed",
                        error = %error,
                        "could not build client from stored key, falling back to process config"
                    ),
                }
            }
        }

        Ok(self.llm.clone())
    }

    pub async fn admin_settings(&self) -> Result<Option<AdminSettings>, RepositoryError> {
        self.admin_config.get().await
    }
}

fn build_config_llm(config: &AppConfig) -> Option<Arc<dyn VisionLlm>> {
    let api_key = config.llm.api_key.as_ref()?;
    if config.llm.provider != LlmProvider::Gemini {
        tracing::warn!(
            event_name = "llm.provider_unsupported",
            provider = config.llm.provider.as_str(),
            "configured provider has no shipped client; analysis will be unavailable"
        );
        return None;
    }

    match GeminiClient::new(
        api_key.expose_secret().to_string().into(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.timeout_secs,
        config.llm.max_retries,
    ) {
        Ok(client) => Some(Arc::new(client)),
        Err(error) => {
            tracing::warn!(
                event_name = "llm.client_build_failed",
                error = %error,
                "could not build model client from configuration"
            );
            None
        }
    }
}

/// In-process store of issued admin bearer tokens.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl SessionStore {
    /// Issues a fresh random token valid for `ttl_secs`.
    pub fn issue(&self, ttl_secs: u64) -> (String, DateTime<Utc>) {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + Duration::seconds(ttl_secs.min(i64::MAX as u64) as i64);
        self.lock().insert(token.clone(), expires_at);
        (token, expires_at)
    }

    /// True when `token` exists and has not expired. Expired entries are
    /// pruned as a side effect.
    pub fn is_valid(&self, token: &str) -> bool {
        let now = Utc::now();
        let mut sessions = self.lock();
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.contains_key(token)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub fn expire(&self, token: &str) {
        self.lock().insert(token.to_string(), Utc::now() - Duration::seconds(1));
    }
}

/// Live WebSocket connections keyed by connection id.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ConnectionRegistry {
    pub fn register(&self) -> String {
        let connection_id = Uuid::new_v4().simple().to_string();
        self.lock().insert(connection_id.clone());
        connection_id
    }

    pub fn unregister(&self, connection_id: &str) {
        self.lock().remove(connection_id);
    }

    pub fn active(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
