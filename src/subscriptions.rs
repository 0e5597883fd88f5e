//! Follow edges between users.

use crate::app_config::AppConfig;
use crate::error::ApiError;
use crate::orm::{recipes, subscriptions, users};
use crate::pagination::PageRequest;
use crate::recipes::RecipeSummary;
use crate::user::Profile;
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait};
use serde::Serialize;
use std::collections::HashMap;

/// A followed author together with what they have published.
#[derive(Clone, Debug, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub profile: Profile,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: u64,
}

/// Builds views for `authors`, keeping their order. Recipes are newest first.
async fn views_for<C: ConnectionTrait>(
    db: &C,
    authors: &[users::Model],
    viewer: i32,
    config: &AppConfig,
) -> Result<Vec<SubscriptionView>, ApiError> {
    if authors.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = authors.iter().map(|u| u.id).collect();

    let mut by_author: HashMap<i32, Vec<RecipeSummary>> = HashMap::new();
    for recipe in recipes::Entity::find()
        .filter(recipes::Column::AuthorId.is_in(ids))
        .order_by_desc(recipes::Column::CreatedAt)
        .order_by_desc(recipes::Column::Id)
        .all(db)
        .await?
    {
        by_author
            .entry(recipe.author_id)
            .or_default()
            .push(RecipeSummary::from_model(&recipe, config));
    }

    Ok(Profile::from_models(db, authors, Some(viewer))
        .await?
        .into_iter()
        .map(|profile| {
            let recipes = by_author.remove(&profile.id).unwrap_or_default();
            SubscriptionView {
                recipes_count: recipes.len() as u64,
                profile,
                recipes,
            }
        })
        .collect())
}

/// Makes `follower` follow `target` and returns the target's view.
pub async fn subscribe<C: ConnectionTrait>(
    db: &C,
    follower: i32,
    target: i32,
    config: &AppConfig,
) -> Result<SubscriptionView, ApiError> {
    let author = users::Entity::find_by_id(target)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_owned()))?;

    if follower == target {
        return Err(ApiError::Conflict(
            "You cannot subscribe to yourself.".to_owned(),
        ));
    }

    let existing = subscriptions::Entity::find()
        .filter(subscriptions::Column::FollowerId.eq(follower))
        .filter(subscriptions::Column::FollowingId.eq(target))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "You are already subscribed to this user.".to_owned(),
        ));
    }

    subscriptions::ActiveModel {
        follower_id: Set(follower),
        following_id: Set(target),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => {
            ApiError::Conflict("You are already subscribed to this user.".to_owned())
        }
        other => other,
    })?;

    log::info!("user_id={} subscribed to user_id={}", follower, target);
    views_for(db, &[author], follower, config)
        .await?
        .pop()
        .ok_or_else(ApiError::not_found)
}

pub async fn unsubscribe<C: ConnectionTrait>(
    db: &C,
    follower: i32,
    target: i32,
) -> Result<(), ApiError> {
    users::Entity::find_by_id(target)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_owned()))?;

    if follower == target {
        return Err(ApiError::Conflict(
            "You cannot unsubscribe from yourself.".to_owned(),
        ));
    }

    let result = subscriptions::Entity::delete_many()
        .filter(subscriptions::Column::FollowerId.eq(follower))
        .filter(subscriptions::Column::FollowingId.eq(target))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(
            "You are not subscribed to this user.".to_owned(),
        ));
    }

    log::info!("user_id={} unsubscribed from user_id={}", follower, target);
    Ok(())
}

/// Authors `follower` follows, most recently followed first.
pub async fn list_subscriptions<C: ConnectionTrait>(
    db: &C,
    follower: i32,
    page: PageRequest,
    config: &AppConfig,
) -> Result<(Vec<SubscriptionView>, u64), ApiError> {
    let select = subscriptions::Entity::find()
        .filter(subscriptions::Column::FollowerId.eq(follower))
        .order_by_desc(subscriptions::Column::CreatedAt)
        .order_by_desc(subscriptions::Column::Id);
    let (edges, count) = crate::pagination::fetch_page(select, db, page).await?;

    let following: Vec<i32> = edges.iter().map(|s| s.following_id).collect();
    let mut authors: HashMap<i32, users::Model> = users::Entity::find()
        .filter(users::Column::Id.is_in(following.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let ordered: Vec<users::Model> = following
        .iter()
        .filter_map(|id| authors.remove(id))
        .collect();

    let views = views_for(db, &ordered, follower, config).await?;
    Ok((views, count))
}
