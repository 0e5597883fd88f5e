use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::ApiError;
use crate::orm::{subscriptions, users};
use crate::pagination::{fetch_page, PageRequest};
use crate::session::{hash_password, verify_password};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use serde::Serialize;
use std::collections::HashSet;

/// Public representation of a user, relative to whoever is asking.
#[derive(Clone, Debug, Serialize)]
pub struct Profile {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl Profile {
    pub fn from_model(user: &users::Model, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email.to_owned(),
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            is_subscribed,
        }
    }

    /// Returns a profile by id, as seen by `viewer`.
    pub async fn get_by_id<C: ConnectionTrait>(
        db: &C,
        id: i32,
        viewer: Option<i32>,
    ) -> Result<Self, ApiError> {
        let user = users::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found.".to_owned()))?;
        let subscribed = subscribed_among(db, viewer, &[id]).await?;
        Ok(Self::from_model(&user, subscribed.contains(&id)))
    }

    /// Builds profiles for many users with one subscription lookup.
    pub async fn from_models<C: ConnectionTrait>(
        db: &C,
        users: &[users::Model],
        viewer: Option<i32>,
    ) -> Result<Vec<Self>, DbErr> {
        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let subscribed = subscribed_among(db, viewer, &ids).await?;
        Ok(users
            .iter()
            .map(|u| Self::from_model(u, subscribed.contains(&u.id)))
            .collect())
    }
}

/// One page of users in registration order.
pub async fn list_users<C: ConnectionTrait>(
    db: &C,
    viewer: Option<i32>,
    page: PageRequest,
) -> Result<(Vec<Profile>, u64), ApiError> {
    let select = users::Entity::find().order_by_asc(users::Column::Id);
    let (rows, count) = fetch_page(select, db, page).await?;
    Ok((Profile::from_models(db, &rows, viewer).await?, count))
}

/// Which of `candidates` the viewer follows. Anonymous viewers follow nobody.
pub async fn subscribed_among<C: ConnectionTrait>(
    db: &C,
    viewer: Option<i32>,
    candidates: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    let viewer = match viewer {
        Some(id) if !candidates.is_empty() => id,
        _ => return Ok(HashSet::new()),
    };

    Ok(subscriptions::Entity::find()
        .filter(subscriptions::Column::FollowerId.eq(viewer))
        .filter(subscriptions::Column::FollowingId.is_in(candidates.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.following_id)
        .collect())
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
}

fn check_current_password(user: &users::Model, current_password: &str) -> Result<(), ApiError> {
    if verify_password(current_password, &user.password) {
        Ok(())
    } else {
        Err(ApiError::field("current_password", "Invalid password."))
    }
}

/// Replaces the user's password after checking the current one.
pub async fn change_password<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
    current_password: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    check_current_password(user, current_password)?;
    if (new_password.chars().count() as u64) < MIN_PASSWORD_LENGTH {
        return Err(ApiError::field(
            "new_password",
            format!(
                "Password must be at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }

    let password_hash = hash_password(new_password).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        ApiError::Internal("Failed to change password".to_owned())
    })?;

    let mut active: users::ActiveModel = user.clone().into();
    active.password = Set(password_hash);
    active.update(db).await?;

    log::info!("user_id={} changed their password", user.id);
    Ok(())
}

/// Deletes the account and, through foreign keys, everything it owns.
pub async fn delete_account<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
    current_password: &str,
) -> Result<(), ApiError> {
    check_current_password(user, current_password)?;
    users::Entity::delete_by_id(user.id).exec(db).await?;
    log::info!("user_id={} deleted their account", user.id);
    Ok(())
}
