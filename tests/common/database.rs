//! Test database setup and management
#![allow(dead_code)]

use actix_web::body::BoxBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::web::Data;
use actix_web::{App, Error};
use foodgram::app_config::AppConfig;
use foodgram::storage::{LocalStorage, StorageBackend};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tempfile::TempDir;

/// Everything a test needs: a fresh database, config and image storage.
///
/// Each context owns its own in-memory SQLite database, so tests can run in
/// parallel without cleanup.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub storage: Arc<dyn StorageBackend>,
    /// Keeps the image directory alive for the lifetime of the test.
    pub media: TempDir,
}

/// Opens an in-memory SQLite database with the schema applied.
///
/// The pool holds exactly one connection; every connection to `:memory:`
/// would otherwise see a different, empty database.
pub async fn setup_test_database() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    foodgram::db::create_schema(&db)
        .await
        .expect("Failed to create schema");
    db
}

impl TestContext {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().expect("Failed to create media directory");
        let storage: Arc<dyn StorageBackend> = Arc::new(
            LocalStorage::new(media.path().to_path_buf()).expect("Failed to create storage"),
        );

        let mut config = AppConfig::default();
        config.site.base_url = "http://testserver".to_owned();
        config.storage.local_path = media.path().display().to_string();

        Self {
            db: setup_test_database().await,
            config,
            storage,
            media,
        }
    }

    /// The application as `bin/foodgram` builds it, minus the middleware.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<BoxBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        let storage: Data<dyn StorageBackend> = Data::from(self.storage.clone());
        App::new()
            .app_data(Data::new(self.db.clone()))
            .app_data(Data::new(self.config.clone()))
            .app_data(storage)
            .configure(foodgram::web::configure)
    }
}
