//! Per-user recipe lists: favorites and the shopping cart.
//!
//! Both are a (user, recipe) join table with the same add/remove rules, so
//! the rules are written once against [`MembershipList`].

use crate::app_config::AppConfig;
use crate::error::ApiError;
use crate::orm::{carts, favorites, recipes};
use crate::recipes::RecipeSummary;
use chrono::Utc;
use sea_orm::sea_query::{Query, SelectStatement};
use sea_orm::{entity::*, query::*, ConnectionTrait};
use std::collections::HashSet;

pub trait MembershipList {
    type Entity: EntityTrait<Model = Self::Model>;
    type Model: ModelTrait<Entity = Self::Entity>
        + IntoActiveModel<Self::ActiveModel>
        + FromQueryResult
        + Send
        + Sync;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;

    /// Human readable list name used in error messages.
    const NAME: &'static str;

    fn user_column() -> <Self::Entity as EntityTrait>::Column;
    fn recipe_column() -> <Self::Entity as EntityTrait>::Column;
    fn new_row(user_id: i32, recipe_id: i32) -> Self::ActiveModel;
}

pub struct Favorites;

impl MembershipList for Favorites {
    type Entity = favorites::Entity;
    type Model = favorites::Model;
    type ActiveModel = favorites::ActiveModel;

    const NAME: &'static str = "favorites";

    fn user_column() -> favorites::Column {
        favorites::Column::UserId
    }

    fn recipe_column() -> favorites::Column {
        favorites::Column::RecipeId
    }

    fn new_row(user_id: i32, recipe_id: i32) -> favorites::ActiveModel {
        favorites::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
    }
}

pub struct ShoppingCart;

impl MembershipList for ShoppingCart {
    type Entity = carts::Entity;
    type Model = carts::Model;
    type ActiveModel = carts::ActiveModel;

    const NAME: &'static str = "shopping cart";

    fn user_column() -> carts::Column {
        carts::Column::UserId
    }

    fn recipe_column() -> carts::Column {
        carts::Column::RecipeId
    }

    fn new_row(user_id: i32, recipe_id: i32) -> carts::ActiveModel {
        carts::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
    }
}

async fn contains<L: MembershipList, C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
) -> Result<bool, ApiError> {
    Ok(L::Entity::find()
        .filter(L::user_column().eq(user_id))
        .filter(L::recipe_column().eq(recipe_id))
        .one(db)
        .await?
        .is_some())
}

/// Puts a recipe on the user's list and returns its summary.
pub async fn add<L: MembershipList, C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
    config: &AppConfig,
) -> Result<RecipeSummary, ApiError> {
    let recipe = recipes::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found.".to_owned()))?;

    if contains::<L, C>(db, user_id, recipe_id).await? {
        return Err(ApiError::Conflict(format!(
            "Recipe is already in {}.",
            L::NAME
        )));
    }

    L::Entity::insert(L::new_row(user_id, recipe_id))
        .exec_without_returning(db)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict(format!("Recipe is already in {}.", L::NAME))
            }
            other => other,
        })?;

    log::debug!(
        "user_id={} added recipe_id={} to {}",
        user_id,
        recipe_id,
        L::NAME
    );
    Ok(RecipeSummary::from_model(&recipe, config))
}

/// Takes a recipe off the user's list. Absent entries are NotFound.
pub async fn remove<L: MembershipList, C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), ApiError> {
    recipes::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found.".to_owned()))?;

    let result = L::Entity::delete_many()
        .filter(L::user_column().eq(user_id))
        .filter(L::recipe_column().eq(recipe_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("Recipe is not in {}.", L::NAME)));
    }
    Ok(())
}

/// `SELECT recipe_id FROM <list> WHERE user_id = ?`, for `IN (...)` filters.
pub fn recipe_ids_of<L: MembershipList>(user_id: i32) -> SelectStatement {
    Query::select()
        .column(L::recipe_column())
        .from(L::Entity::default())
        .and_where(L::user_column().eq(user_id))
        .to_owned()
}

/// Which of `recipe_ids` are on the user's list.
pub async fn members_among<L: MembershipList, C: ConnectionTrait>(
    db: &C,
    user_id: Option<i32>,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, ApiError> {
    let user_id = match user_id {
        Some(id) if !recipe_ids.is_empty() => id,
        _ => return Ok(HashSet::new()),
    };

    let ids: Vec<i32> = L::Entity::find()
        .select_only()
        .column(L::recipe_column())
        .filter(L::user_column().eq(user_id))
        .filter(L::recipe_column().is_in(recipe_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}
