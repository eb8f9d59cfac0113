use sqlx::{sqlite::SqliteRow, Row};

use refineai_core::domain::admin::AdminSettings;

use super::{parse_timestamp, AdminConfigRepository, RepositoryError};
use crate::DbPool;

/// Settings live in a single row. Upserts keep the id of the first row
/// ever written so callers never have to track it.
pub struct SqlAdminConfigRepository {
    pool: DbPool,
}

impl SqlAdminConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AdminConfigRepository for SqlAdminConfigRepository {
    async fn get(&self) -> Result<Option<AdminSettings>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, webhook_url, llm_provider, llm_api_key, assistant_prompt, updated_at
             FROM admin_config
             ORDER BY updated_at ASC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(settings_from_row).transpose()
    }

    async fn upsert(&self, settings: AdminSettings) -> Result<AdminSettings, RepositoryError> {
        let existing = self.get().await?;
        let id = existing.map(|current| current.id).unwrap_or_else(|| settings.id.clone());

        sqlx::query(
            "INSERT INTO admin_config (
                id,
                webhook_url,
                llm_provider,
                llm_api_key,
                assistant_prompt,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                webhook_url = excluded.webhook_url,
                llm_provider = excluded.llm_provider,
                llm_api_key = excluded.llm_api_key,
                assistant_prompt = excluded.assistant_prompt,
                updated_at = excluded.updated_at",
        )
        .bind(&id)
        .bind(settings.webhook_url.as_deref())
        .bind(&settings.llm_provider)
        .bind(settings.llm_api_key.as_deref())
        .bind(settings.assistant_prompt.as_deref())
        .bind(settings.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AdminSettings { id, ..settings })
    }
}

fn settings_from_row(row: SqliteRow) -> Result<AdminSettings, RepositoryError> {
    Ok(AdminSettings {
        id: row.try_get("id")?,
        webhook_url: row.try_get("webhook_url")?,
        llm_provider: row.try_get("llm_provider")?,
        llm_api_key: row.try_get("llm_api_key")?,
        assistant_prompt: row.try_get("assistant_prompt")?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}
