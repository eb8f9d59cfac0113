//! In-memory repositories for tests and wiring that does not need SQLite.

use std::collections::HashMap;
use std::sync::Mutex;

use refineai_core::domain::admin::AdminSettings;
use refineai_core::domain::chat::ChatMessage;
use refineai_core::domain::quote::{Quote, QuoteId};
use refineai_core::domain::service::{ServiceType, ServiceTypeId};

use super::{
    AdminConfigRepository, ChatMessageRepository, QuoteRepository, QuoteUpdate, RepositoryError,
    ServiceTypeRepository, ServiceTypeUpdate,
};

#[derive(Default)]
pub struct InMemoryQuoteRepository {
    quotes: Mutex<HashMap<String, Quote>>,
}

impl InMemoryQuoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned() -> RepositoryError {
    RepositoryError::Decode("in-memory repository lock is poisoned".to_string())
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let quotes = self.quotes.lock().map_err(|_| lock_poisoned())?;
        Ok(quotes.get(&id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Quote>, RepositoryError> {
        let quotes = self.quotes.lock().map_err(|_| lock_poisoned())?;
        let mut all: Vec<Quote> = quotes.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(all)
    }

    async fn create(&self, quote: Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.lock().map_err(|_| lock_poisoned())?;
        quotes.insert(quote.id.0.clone(), quote);
        Ok(())
    }

    async fn update(
        &self,
        id: &QuoteId,
        update: QuoteUpdate,
    ) -> Result<Option<Quote>, RepositoryError> {
        let mut quotes = self.quotes.lock().map_err(|_| lock_poisoned())?;
        let Some(quote) = quotes.get_mut(&id.0) else {
            return Ok(None);
        };

        if let Some(customer_email) = update.customer_email {
            quote.customer_email = Some(customer_email);
        }
        if let Some(customer_name) = update.customer_name {
            quote.customer_name = Some(customer_name);
        }
        if let Some(status) = update.status {
            quote.status = status;
        }
        if let Some(total_price) = update.total_price {
            quote.total_price = Some(total_price);
        }

        Ok(Some(quote.clone()))
    }

    async fn search(
        &self,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Quote>, RepositoryError> {
        let email = email.map(str::to_lowercase);
        let name = name.map(str::to_lowercase);

        let mut matched: Vec<Quote> = self
            .quotes
            .lock()
            .map_err(|_| lock_poisoned())?
            .values()
            .filter(|quote| {
                let email_matches = email.as_deref().map_or(true, |needle| {
                    quote
                        .customer_email
                        .as_deref()
                        .is_some_and(|value| value.to_lowercase().contains(needle))
                });
                let name_matches = name.as_deref().map_or(true, |needle| {
                    quote
                        .customer_name
                        .as_deref()
                        .is_some_and(|value| value.to_lowercase().contains(needle))
                });
                email_matches && name_matches
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(matched)
    }
}

#[derive(Default)]
pub struct InMemoryServiceTypeRepository {
    services: Mutex<HashMap<String, ServiceType>>,
}

impl InMemoryServiceTypeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ServiceTypeRepository for InMemoryServiceTypeRepository {
    async fn find_by_id(
        &self,
        id: &ServiceTypeId,
    ) -> Result<Option<ServiceType>, RepositoryError> {
        let services = self.services.lock().map_err(|_| lock_poisoned())?;
        Ok(services.get(&id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ServiceType>, RepositoryError> {
        let services = self.services.lock().map_err(|_| lock_poisoned())?;
        let mut all: Vec<ServiceType> = services.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn list_active(&self) -> Result<Vec<ServiceType>, RepositoryError> {
        let mut active: Vec<ServiceType> = self
            .services
            .lock()
            .map_err(|_| lock_poisoned())?
            .values()
            .filter(|service| service.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }

    async fn create(&self, service_type: ServiceType) -> Result<(), RepositoryError> {
        let mut services = self.services.lock().map_err(|_| lock_poisoned())?;
        services.insert(service_type.id.0.clone(), service_type);
        Ok(())
    }

    async fn update(
        &self,
        id: &ServiceTypeId,
        update: ServiceTypeUpdate,
    ) -> Result<Option<ServiceType>, RepositoryError> {
        let mut services = self.services.lock().map_err(|_| lock_poisoned())?;
        let Some(service) = services.get_mut(&id.0) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            service.name = name;
        }
        if let Some(base_price) = update.base_price {
            service.base_price = base_price;
        }
        if let Some(price_per_sqft) = update.price_per_sqft {
            service.price_per_sqft = price_per_sqft;
        }
        if let Some(complexity_multiplier) = update.complexity_multiplier {
            service.complexity_multiplier = complexity_multiplier;
        }
        if let Some(active) = update.active {
            service.active = active;
        }

        Ok(Some(service.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryChatMessageRepository {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ChatMessageRepository for InMemoryChatMessageRepository {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().map_err(|_| lock_poisoned())?;
        messages.push(message);
        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().map_err(|_| lock_poisoned())?;
        let mut history: Vec<ChatMessage> =
            messages.iter().filter(|message| message.session_id == session_id).cloned().collect();
        history.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(history)
    }
}

#[derive(Default)]
pub struct InMemoryAdminConfigRepository {
    settings: Mutex<Option<AdminSettings>>,
}

impl InMemoryAdminConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AdminConfigRepository for InMemoryAdminConfigRepository {
    async fn get(&self) -> Result<Option<AdminSettings>, RepositoryError> {
        let settings = self.settings.lock().map_err(|_| lock_poisoned())?;
        Ok(settings.clone())
    }

    async fn upsert(&self, settings: AdminSettings) -> Result<AdminSettings, RepositoryError> {
        let mut current = self.settings.lock().map_err(|_| lock_poisoned())?;
        let id = current.as_ref().map(|existing| existing.id.clone()).unwrap_or_else(|| {
            settings.id.clone()
        });
        let stored = AdminSettings { id, ..settings };
        *current = Some(stored.clone());
        Ok(stored)
    }
}
