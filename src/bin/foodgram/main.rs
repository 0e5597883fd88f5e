use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use foodgram::app_config::AppConfig;
use foodgram::storage::{LocalStorage, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let config = AppConfig::load().context("Failed to load configuration")?;
    log::info!("Starting {} at {}", config.site.name, config.site.base_url);

    let db = foodgram::db::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to the database")?;
    foodgram::db::create_schema(&db)
        .await
        .context("Failed to create the database schema")?;

    let storage: Arc<dyn StorageBackend> = Arc::new(
        LocalStorage::new(PathBuf::from(&config.storage.local_path))
            .map_err(|e| anyhow::anyhow!("Failed to initialize image storage: {}", e))?,
    );

    let bind = config.server.bind.clone();
    let db = Data::new(db);
    let config = Data::new(config);
    let storage: Data<dyn StorageBackend> = Data::from(storage);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(storage.clone())
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(Logger::new("%a \"%r\" %s %b %Dms \"%{User-Agent}i\""))
            .configure(foodgram::web::configure)
    })
    .bind(&bind)
    .with_context(|| format!("Failed to bind {}", bind))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env file is fine; the environment may already be set.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
