use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::blob::{BlobStore, DiskBlobStore};
use crate::db::Stores;
use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub services: Services,
    pub blob_store: Arc<dyn BlobStore>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads/bloc".to_string());

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("database connection established");

        let stores = Stores::postgres(db_pool.clone());
        Ok(Self {
            db_pool,
            jwt_secret,
            services: Services::new(stores),
            blob_store: Arc::new(DiskBlobStore::new(upload_dir, "/uploads/bloc")),
        })
    }
}
