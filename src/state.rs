use crate::config::AppConfig;
use crate::db;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url, config.max_connections).await?;
        Ok(Self { db, config })
    }

    /// Fresh in-memory database with migrations applied and test JWT settings.
    pub async fn ephemeral() -> anyhow::Result<Self> {
        let db = db::connect_in_memory().await?;
        Ok(Self {
            db,
            config: Arc::new(AppConfig::for_tests()),
        })
    }
}
