use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::Config;

/// Shared by every request: the pool and the loaded config.
#[derive(Clone)]
pub struct State {
    pub pool: Pool<Postgres>,
    pub config: Arc<Config>,
    pub secret: Arc<String>,
}

impl State {
    pub fn new(pool: Pool<Postgres>, config: Config) -> Self {
        Self {
            pool,
            secret: Arc::new(config.secret.clone()),
            config: Arc::new(config),
        }
    }

    pub async fn connect(config: Config) -> Result<Self, sqlx::Error> {
        log::info!("Connecting to the database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self::new(pool, config))
    }

    pub fn media_url(&self) -> &str {
        &self.config.media_url
    }
}
