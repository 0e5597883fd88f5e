//! Read-only lookups for tags and ingredients.

use crate::error::ApiError;
use crate::orm::{ingredients, tags};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{entity::*, query::*, ConnectionTrait};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagView {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<tags::Model> for TagView {
    fn from(tag: tags::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredients::Model> for IngredientView {
    fn from(ingredient: ingredients::Model) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

pub async fn list_tags<C: ConnectionTrait>(db: &C) -> Result<Vec<TagView>, ApiError> {
    Ok(tags::Entity::find()
        .order_by_asc(tags::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(TagView::from)
        .collect())
}

pub async fn get_tag<C: ConnectionTrait>(db: &C, id: i32) -> Result<TagView, ApiError> {
    tags::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(TagView::from)
        .ok_or_else(ApiError::not_found)
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Ingredients whose name starts with `prefix`, ignoring case, by name.
pub async fn search_ingredients<C: ConnectionTrait>(
    db: &C,
    prefix: Option<&str>,
) -> Result<Vec<IngredientView>, ApiError> {
    let mut select = ingredients::Entity::find();

    if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(ingredients::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    Ok(select
        .order_by_asc(ingredients::Column::Name)
        .order_by_asc(ingredients::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(IngredientView::from)
        .collect())
}

pub async fn get_ingredient<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<IngredientView, ApiError> {
    ingredients::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(IngredientView::from)
        .ok_or_else(ApiError::not_found)
}
