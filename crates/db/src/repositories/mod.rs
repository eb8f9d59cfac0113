use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use refineai_core::domain::admin::AdminSettings;
use refineai_core::domain::chat::ChatMessage;
use refineai_core::domain::quote::{Quote, QuoteId, QuoteStatus};
use refineai_core::domain::service::{ServiceType, ServiceTypeId};

pub mod admin_config;
pub mod chat;
pub mod memory;
pub mod quote;
pub mod service_type;

pub use admin_config::SqlAdminConfigRepository;
pub use chat::SqlChatMessageRepository;
pub use memory::{
    InMemoryAdminConfigRepository, InMemoryChatMessageRepository, InMemoryQuoteRepository,
    InMemoryServiceTypeRepository,
};
pub use quote::SqlQuoteRepository;
pub use service_type::SqlServiceTypeRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Partial update for an admin quote edit. `None` leaves the column alone.
#[derive(Clone, Debug, Default)]
pub struct QuoteUpdate {
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub status: Option<QuoteStatus>,
    pub total_price: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct ServiceTypeUpdate {
    pub name: Option<String>,
    pub base_price: Option<i64>,
    pub price_per_sqft: Option<i64>,
    pub complexity_multiplier: Option<i64>,
    pub active: Option<bool>,
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Quote>, RepositoryError>;
    async fn create(&self, quote: Quote) -> Result<(), RepositoryError>;
    async fn update(&self, id: &QuoteId, update: QuoteUpdate)
        -> Result<Option<Quote>, RepositoryError>;
    async fn search(
        &self,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Quote>, RepositoryError>;
}

#[async_trait]
pub trait ServiceTypeRepository: Send + Sync {
    async fn find_by_id(&self, id: &ServiceTypeId)
        -> Result<Option<ServiceType>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<ServiceType>, RepositoryError>;
    async fn list_active(&self) -> Result<Vec<ServiceType>, RepositoryError>;
    async fn create(&self, service_type: ServiceType) -> Result<(), RepositoryError>;
    async fn update(
        &self,
        id: &ServiceTypeId,
        update: ServiceTypeUpdate,
    ) -> Result<Option<ServiceType>, RepositoryError>;
}

#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError>;
    async fn list_for_session(&self, session_id: &str)
        -> Result<Vec<ChatMessage>, RepositoryError>;
}

#[async_trait]
pub trait AdminConfigRepository: Send + Sync {
    async fn get(&self) -> Result<Option<AdminSettings>, RepositoryError>;
    async fn upsert(&self, settings: AdminSettings) -> Result<AdminSettings, RepositoryError>;
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|parsed| parsed.with_timezone(&Utc)).map_err(|_| {
        RepositoryError::Decode(format!("invalid RFC3339 timestamp in `{column}`: {value}"))
    })
}
