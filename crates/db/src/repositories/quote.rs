use sqlx::{sqlite::SqliteRow, Row};

use refineai_core::domain::quote::{Quote, QuoteId, QuoteStatus};
use refineai_core::domain::service::ServiceTypeId;

use super::{parse_timestamp, QuoteRepository, QuoteUpdate, RepositoryError};
use crate::DbPool;

const QUOTE_COLUMNS: &str = "id,
                customer_email,
                customer_name,
                service_type_id,
                photo_path,
                ai_analysis,
                total_price,
                status,
                created_at";

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl QuoteRepository for SqlQuoteRepository {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS}
             FROM quote
             WHERE id = ?",
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(quote_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Quote>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS}
             FROM quote
             ORDER BY created_at DESC, id DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(quote_from_row).collect()
    }

    async fn create(&self, quote: Quote) -> Result<(), RepositoryError> {
        let analysis_json = quote
            .ai_analysis
            .as_ref()
            .map(|value| serde_json::to_string(value))
            .transpose()
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        sqlx::query(
            "INSERT INTO quote (
                id,
                customer_email,
                customer_name,
                service_type_id,
                photo_path,
                ai_analysis,
                total_price,
                status,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&quote.id.0)
        .bind(quote.customer_email.as_deref())
        .bind(quote.customer_name.as_deref())
        .bind(quote.service_type_id.as_ref().map(|id| id.0.as_str()))
        .bind(quote.photo_path.as_deref())
        .bind(analysis_json.as_deref())
        .bind(quote.total_price)
        .bind(quote.status.as_str())
        .bind(quote.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(
        &self,
        id: &QuoteId,
        update: QuoteUpdate,
    ) -> Result<Option<Quote>, RepositoryError> {
        sqlx::query(
            "UPDATE quote SET
                customer_email = COALESCE(?, customer_email),
                customer_name = COALESCE(?, customer_name),
                status = COALESCE(?, status),
                total_price = COALESCE(?, total_price)
             WHERE id = ?",
        )
        .bind(update.customer_email.as_deref())
        .bind(update.customer_name.as_deref())
        .bind(update.status.map(|status| status.as_str()))
        .bind(update.total_price)
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await
    }

    async fn search(
        &self,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Quote>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS}
             FROM quote
             WHERE (?1 IS NULL
                    OR LOWER(IFNULL(customer_email, '')) LIKE '%' || LOWER(?1) || '%' ESCAPE '\\')
               AND (?2 IS NULL
                    OR LOWER(IFNULL(customer_name, '')) LIKE '%' || LOWER(?2) || '%' ESCAPE '\\')
             ORDER BY created_at DESC, id DESC",
        ))
        .bind(email.map(escape_like))
        .bind(name.map(escape_like))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(quote_from_row).collect()
    }
}

/// Escapes LIKE metacharacters so user input matches literally.
fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn quote_from_row(row: SqliteRow) -> Result<Quote, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = QuoteStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown quote status `{status_raw}`")))?;

    let ai_analysis = row
        .try_get::<Option<String>, _>("ai_analysis")?
        .map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|error| RepositoryError::Decode(format!("invalid ai_analysis: {error}")))
        })
        .transpose()?;

    Ok(Quote {
        id: QuoteId(row.try_get("id")?),
        customer_email: row.try_get("customer_email")?,
        customer_name: row.try_get("customer_name")?,
        service_type_id: row.try_get::<Option<String>, _>("service_type_id")?.map(ServiceTypeId),
        photo_path: row.try_get("photo_path")?,
        ai_analysis,
        total_price: row.try_get("total_price")?,
        status,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use refineai_core::domain::quote::{Quote, QuoteId, QuoteStatus};
    use refineai_core::domain::service::ServiceTypeId;

    use super::SqlQuoteRepository;
    use crate::repositories::{QuoteRepository, QuoteUpdate};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlQuoteRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        sqlx::query(
            "INSERT INTO service_type (id, name, base_price, price_per_sqft, complexity_multiplier, active)
             VALUES ('svc-bathtub', 'Bathtub Refinishing', 450, 0, 100, 1)",
        )
        .execute(&pool)
        .await
        .expect("seed service type");
        SqlQuoteRepository::new(pool)
    }

    fn quote(id: &str, email: &str, name: &str) -> Quote {
        Quote {
            id: QuoteId(id.to_string()),
            customer_email: Some(email.to_string()),
            customer_name: Some(name.to_string()),
            service_type_id: Some(ServiceTypeId("svc-bathtub".to_string())),
            photo_path: Some(format!("uploads/{id}.jpg")),
            ai_analysis: Some(serde_json::json!({"totalPrice": 485})),
            total_price: Some(485),
            status: QuoteStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_and_find_round_trip() {
        let repo = repository().await;
        let original = quote("q-1", "sam@example.com", "Sam Carter");

        repo.create(original.clone()).await.expect("create quote");
        let loaded = repo
            .find_by_id(&QuoteId("q-1".to_string()))
            .await
            .expect("find quote")
            .expect("quote exists");

        assert_eq!(loaded.customer_email, original.customer_email);
        assert_eq!(loaded.total_price, Some(485));
        assert_eq!(loaded.ai_analysis, original.ai_analysis);
        assert_eq!(loaded.status, QuoteStatus::Pending);
    }

    #[tokio::test]
    async fn list_all_returns_newest_first() {
        let repo = repository().await;

        let mut older = quote("q-old", "a@example.com", "Ann");
        older.created_at = Utc::now() - Duration::hours(2);
        repo.create(older).await.expect("create older quote");
        repo.create(quote("q-new", "b@example.com", "Bea")).await.expect("create newer quote");

        let all = repo.list_all().await.expect("list quotes");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id.0, "q-new");
        assert_eq!(all[1].id.0, "q-old");
    }

    #[tokio::test]
    async fn update_patches_only_provided_fields() {
        let repo = repository().await;
        repo.create(quote("q-1", "sam@example.com", "Sam Carter")).await.expect("create quote");

        let updated = repo
            .update(
                &QuoteId("q-1".to_string()),
                QuoteUpdate { status: Some(QuoteStatus::Approved), ..QuoteUpdate::default() },
            )
            .await
            .expect("update quote")
            .expect("quote exists");

        assert_eq!(updated.status, QuoteStatus::Approved);
        assert_eq!(updated.customer_email.as_deref(), Some("sam@example.com"));
        assert_eq!(updated.total_price, Some(485));
    }

    #[tokio::test]
    async fn update_missing_quote_returns_none() {
        let repo = repository().await;
        let updated = repo
            .update(&QuoteId("q-missing".to_string()), QuoteUpdate::default())
            .await
            .expect("update quote");
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn search_matches_substrings_case_insensitively() {
        let repo = repository().await;
        repo.create(quote("q-1", "Sam.Carter@Example.com", "Sam Carter"))
            .await
            .expect("create first quote");
        repo.create(quote("q-2", "pat@other.net", "Pat Doyle")).await.expect("create second quote");

        let by_email = repo.search(Some("sam.carter"), None).await.expect("search by email");
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].id.0, "q-1");

        let by_name = repo.search(None, Some("doyle")).await.expect("search by name");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id.0, "q-2");

        let both = repo.search(Some("example"), Some("doyle")).await.expect("search by both");
        assert!(both.is_empty());
    }

    #[tokio::test]
    async fn search_treats_like_metacharacters_as_literals() {
        let repo = repository().await;
        repo.create(quote("q-1", "a_b@example.com", "Underscore Ann"))
            .await
            .expect("create underscore quote");
        repo.create(quote("q-2", "axb@example.com", "Plain Pat"))
            .await
            .expect("create plain quote");

        let matched = repo.search(Some("a_b"), None).await.expect("search underscore");
        assert_eq!(matched.len(), 1, "`_` must not act as a single-character wildcard");
        assert_eq!(matched[0].id.0, "q-1");

        let percent = repo.search(Some("%"), None).await.expect("search percent");
        assert!(percent.is_empty(), "`%` must not match everything");
    }
}
