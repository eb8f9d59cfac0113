use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Default catalog entries shipped with a fresh install.
const SEED_SERVICE_TYPES: &[SeedServiceType] = &[
    SeedServiceType { id: "svc-bathtub", name: "Bathtub Refinishing", base_price: 450 },
    SeedServiceType { id: "svc-shower", name: "Shower Refinishing", base_price: 300 },
    SeedServiceType { id: "svc-tile", name: "Tile Refinishing", base_price: 700 },
    SeedServiceType { id: "svc-countertop", name: "Countertop Refinishing", base_price: 500 },
];

// Must match the id used in seed_defaults.sql.
const SEED_ADMIN_CONFIG_ID: &str = "admin-config";

/// Deterministic default dataset: the four-service catalog plus the
/// admin settings singleton. Loading is idempotent, so it is safe to
/// run on every startup.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_defaults.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult { service_types_seeded: SEED_SERVICE_TYPES.len() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for seed in SEED_SERVICE_TYPES {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM service_type WHERE id = ?1 AND name = ?2 AND base_price = ?3 AND active = 1)",
            )
            .bind(seed.id)
            .bind(seed.name)
            .bind(seed.base_price)
            .fetch_one(pool)
            .await?;
            checks.push((seed.id, exists == 1));
        }

        let config_exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM admin_config WHERE id = ?1 AND llm_provider = 'gemini')",
        )
        .bind(SEED_ADMIN_CONFIG_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("admin-config", config_exists == 1));

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    /// True when the catalog already has at least one service type.
    pub async fn is_seeded(pool: &DbPool) -> Result<bool, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM service_type").fetch_one(pool).await?;
        Ok(count > 0)
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedServiceType {
    id: &'static str,
    name: &'static str,
    base_price: i64,
}

#[derive(Debug)]
pub struct SeedResult {
    pub service_types_seeded: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!SeedDataset::SQL.is_empty());
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        assert!(!SeedDataset::is_seeded(&pool).await.expect("check empty catalog"));

        let first = SeedDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification = SeedDataset::verify(&pool).await.expect("verify seed fixtures");
        let failed: Vec<_> =
            first_verification.checks.iter().filter(|(_, passed)| !passed).collect();
        assert!(
            first_verification.all_present,
            "verification should pass right after loading the shipped fixture; failing checks: {failed:?}"
        );
        assert!(first_verification
            .checks
            .iter()
            .any(|(name, passed)| *name == "admin-config" && *passed));
        assert_eq!(first.service_types_seeded, 4);
        assert!(SeedDataset::is_seeded(&pool).await.expect("check seeded catalog"));

        let second = SeedDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            SeedDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.service_types_seeded, 4);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn reseeding_preserves_admin_edits() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");
        SeedDataset::load(&pool).await.expect("load seed fixtures");

        sqlx::query("UPDATE service_type SET base_price = 999 WHERE id = 'svc-bathtub'")
            .execute(&pool)
            .await
            .expect("edit seeded price");

        SeedDataset::load(&pool).await.expect("reload seed fixtures");

        let price: i64 =
            sqlx::query_scalar("SELECT base_price FROM service_type WHERE id = 'svc-bathtub'")
                .fetch_one(&pool)
                .await
                .expect("read edited price");
        assert_eq!(price, 999, "INSERT OR IGNORE seeding must not overwrite edits");
    }
}
