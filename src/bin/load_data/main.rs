//! Loads ingredients (and optionally tags) from JSON files.
//!
//! Usage: `load_data <ingredients.json> [tags.json]`

use anyhow::{bail, Context};
use env_logger::Env;
use foodgram::app_config::AppConfig;
use foodgram::seed::{load_ingredients, load_tags, IngredientRecord, TagRecord};
use serde::de::DeserializeOwned;
use std::path::Path;

fn read_records<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (ingredients_path, tags_path) = match args.as_slice() {
        [ingredients] => (ingredients, None),
        [ingredients, tags] => (ingredients, Some(tags)),
        _ => bail!("usage: load_data <ingredients.json> [tags.json]"),
    };

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = foodgram::db::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to the database")?;
    foodgram::db::create_schema(&db)
        .await
        .context("Failed to create the database schema")?;

    let ingredients: Vec<IngredientRecord> = read_records(Path::new(ingredients_path))?;
    let report = load_ingredients(&db, ingredients)
        .await
        .map_err(|e| anyhow::anyhow!("Loading ingredients failed: {}", e))?;
    println!(
        "ingredients: {} inserted, {} skipped, {} invalid",
        report.inserted, report.skipped, report.invalid
    );

    if let Some(tags_path) = tags_path {
        let tags: Vec<TagRecord> = read_records(Path::new(tags_path))?;
        let report = load_tags(&db, tags)
            .await
            .map_err(|e| anyhow::anyhow!("Loading tags failed: {}", e))?;
        println!(
            "tags: {} inserted, {} skipped, {} invalid",
            report.inserted, report.skipped, report.invalid
        );
    }

    Ok(())
}
