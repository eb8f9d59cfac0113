use sqlx::{sqlite::SqliteRow, Row};

use refineai_core::domain::service::{ServiceType, ServiceTypeId};

use super::{RepositoryError, ServiceTypeRepository, ServiceTypeUpdate};
use crate::DbPool;

pub struct SqlServiceTypeRepository {
    pool: DbPool,
}

impl SqlServiceTypeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ServiceTypeRepository for SqlServiceTypeRepository {
    async fn find_by_id(
        &self,
        id: &ServiceTypeId,
    ) -> Result<Option<ServiceType>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, base_price, price_per_sqft, complexity_multiplier, active
             FROM service_type
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(service_type_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<ServiceType>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, base_price, price_per_sqft, complexity_multiplier, active
             FROM service_type
             ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(service_type_from_row).collect()
    }

    async fn list_active(&self) -> Result<Vec<ServiceType>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, base_price, price_per_sqft, complexity_multiplier, active
             FROM service_type
             WHERE active = 1
             ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(service_type_from_row).collect()
    }

    async fn create(&self, service_type: ServiceType) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO service_type (
                id,
                name,
                base_price,
                price_per_sqft,
                complexity_multiplier,
                active
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&service_type.id.0)
        .bind(&service_type.name)
        .bind(service_type.base_price)
        .bind(service_type.price_per_sqft)
        .bind(service_type.complexity_multiplier)
        .bind(i64::from(service_type.active))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(
        &self,
        id: &ServiceTypeId,
        update: ServiceTypeUpdate,
    ) -> Result<Option<ServiceType>, RepositoryError> {
        sqlx::query(
            "UPDATE service_type SET
                name = COALESCE(?, name),
                base_price = COALESCE(?, base_price),
                price_per_sqft = COALESCE(?, price_per_sqft),
                complexity_multiplier = COALESCE(?, complexity_multiplier),
                active = COALESCE(?, active)
             WHERE id = ?",
        )
        .bind(update.name.as_deref())
        .bind(update.base_price)
        .bind(update.price_per_sqft)
        .bind(update.complexity_multiplier)
        .bind(update.active.map(i64::from))
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await
    }
}

fn service_type_from_row(row: SqliteRow) -> Result<ServiceType, RepositoryError> {
    Ok(ServiceType {
        id: ServiceTypeId(row.try_get("id")?),
        name: row.try_get("name")?,
        base_price: row.try_get("base_price")?,
        price_per_sqft: row.try_get("price_per_sqft")?,
        complexity_multiplier: row.try_get("complexity_multiplier")?,
        active: row.try_get::<i64, _>("active")? != 0,
    })
}
