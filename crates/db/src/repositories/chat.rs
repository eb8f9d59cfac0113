use sqlx::{sqlite::SqliteRow, Row};

use refineai_core::domain::chat::{ChatMessage, ChatMessageId, ChatRole};

use super::{parse_timestamp, ChatMessageRepository, RepositoryError};
use crate::DbPool;

pub struct SqlChatMessageRepository {
    pool: DbPool,
}

impl SqlChatMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ChatMessageRepository for SqlChatMessageRepository {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_message (id, session_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id.0)
        .bind(&message.session_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, session_id, role, content, created_at
             FROM chat_message
             WHERE session_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(message_from_row).collect()
    }
}

fn message_from_row(row: SqliteRow) -> Result<ChatMessage, RepositoryError> {
    let role_raw = row.try_get::<String, _>("role")?;
    let role = ChatRole::parse(&role_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown chat role `{role_raw}`")))?;

    Ok(ChatMessage {
        id: ChatMessageId(row.try_get("id")?),
        session_id: row.try_get("session_id")?,
        role,
        content: row.try_get("content")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}
