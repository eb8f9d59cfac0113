use refineai_core::config::{AppConfig, ConfigError, LoadOptions};
use refineai_db::{connect_with_settings, migrations, DbPool, SeedDataset};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("seed fixture load failed: {0}")]
    Seed(#[source] refineai_db::repositories::RepositoryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    // First boot gets the default catalog; an already-populated catalog is
    // left alone so admin edits survive restarts.
    if !SeedDataset::is_seeded(&db_pool).await.map_err(BootstrapError::Seed)? {
        let seeded = SeedDataset::load(&db_pool).await.map_err(BootstrapError::Seed)?;
        info!(
            event_name = "system.bootstrap.seeded",
            correlation_id = "bootstrap",
            service_types = seeded.service_types_seeded,
            "default catalog seeded"
        );
    }

    Ok(Application { config, db_pool })
}
