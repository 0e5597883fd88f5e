//! Bulk loading of ingredients and tags from JSON fixtures.

use crate::constants::{COLOR_RE, DEFAULT_TAG_COLOR, SLUG_RE};
use crate::error::ApiError;
use crate::orm::{ingredients, tags};
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::*, ConnectionTrait};
use serde::Deserialize;
use validator::Validate;

/// Rows per INSERT statement.
const BATCH_SIZE: usize = 500;

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct IngredientRecord {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub measurement_unit: String,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct TagRecord {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(regex = "COLOR_RE")]
    pub color: Option<String>,
    #[validate(length(min = 1, max = 50), regex = "SLUG_RE")]
    pub slug: String,
}

/// Counts of one load run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: u64,
    pub skipped: u64,
    pub invalid: u64,
}

/// Drops records that fail validation, logging each one.
fn valid_records<T>(records: Vec<T>, report: &mut LoadReport) -> Vec<T>
where
    T: Validate + std::fmt::Debug,
{
    records
        .into_iter()
        .filter(|record| match record.validate() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Skipping invalid record {:?}: {}", record, e);
                report.invalid += 1;
                false
            }
        })
        .collect()
}

/// Inserts ingredients, skipping (name, unit) pairs that already exist.
pub async fn load_ingredients<C: ConnectionTrait>(
    db: &C,
    records: Vec<IngredientRecord>,
) -> Result<LoadReport, ApiError> {
    let mut report = LoadReport::default();
    let records = valid_records(records, &mut report);
    let total = records.len() as u64;

    for chunk in records.chunks(BATCH_SIZE) {
        let models = chunk.iter().map(|r| ingredients::ActiveModel {
            name: Set(r.name.trim().to_owned()),
            measurement_unit: Set(r.measurement_unit.trim().to_owned()),
            ..Default::default()
        });
        report.inserted += ingredients::Entity::insert_many(models)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;
    }

    report.skipped = total - report.inserted;
    log::info!(
        "Loaded ingredients: {} inserted, {} already present, {} invalid",
        report.inserted,
        report.skipped,
        report.invalid
    );
    Ok(report)
}

/// Inserts tags, skipping any whose slug or color is already taken.
pub async fn load_tags<C: ConnectionTrait>(
    db: &C,
    records: Vec<TagRecord>,
) -> Result<LoadReport, ApiError> {
    let mut report = LoadReport::default();
    let records = valid_records(records, &mut report);
    let total = records.len() as u64;

    for chunk in records.chunks(BATCH_SIZE) {
        let models = chunk.iter().map(|r| tags::ActiveModel {
            name: Set(r.name.trim().to_owned()),
            color: Set(r
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_owned())),
            slug: Set(r.slug.to_owned()),
            ..Default::default()
        });
        report.inserted += tags::Entity::insert_many(models)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;
    }

    report.skipped = total - report.inserted;
    log::info!(
        "Loaded tags: {} inserted, {} already present, {} invalid",
        report.inserted,
        report.skipped,
        report.invalid
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_from_json() {
        let records: Vec<IngredientRecord> = serde_json::from_str(
            r#"[{"name": "абрикосовое варенье", "measurement_unit": "г"},
                {"name": "", "measurement_unit": "г"}]"#,
        )
        .unwrap();
        let mut report = LoadReport::default();
        let valid = valid_records(records, &mut report);
        assert_eq!(valid.len(), 1);
        assert_eq!(report.invalid, 1);
    }

    #[test]
    fn test_tag_record_rules() {
        let ok = TagRecord {
            name: "Завтрак".to_owned(),
            color: Some("#E26C2D".to_owned()),
            slug: "breakfast".to_owned(),
        };
        assert!(ok.validate().is_ok());

        let no_color = TagRecord { color: None, ..ok.clone() };
        assert!(no_color.validate().is_ok());

        let bad_slug = TagRecord {
            slug: "зав трак".to_owned(),
            ..ok.clone()
        };
        assert!(bad_slug.validate().is_err());

        let bad_color = TagRecord {
            color: Some("orange".to_owned()),
            ..ok
        };
        assert!(bad_color.validate().is_err());
    }
}
