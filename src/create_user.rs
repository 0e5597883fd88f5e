use crate::constants::USERNAME_RE;
use crate::error::{merge_validation_errors, ApiError, FieldErrors};
use crate::orm::users;
use crate::session::hash_password;
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait};
use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/users/`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserCreate {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Email must be at most 254 characters.")
    )]
    pub email: String,
    #[validate(
        length(
            min = 1,
            max = 150,
            message = "Username must be between 1 and 150 characters."
        ),
        regex(
            path = "USERNAME_RE",
            message = "Username may contain only letters, digits and @/./+/-/_ characters."
        )
    )]
    pub username: String,
    #[validate(length(
        min = 1,
        max = 150,
        message = "First name must be between 1 and 150 characters."
    ))]
    pub first_name: String,
    #[validate(length(
        min = 1,
        max = 150,
        message = "Last name must be between 1 and 150 characters."
    ))]
    pub last_name: String,
    #[validate(length(
        min = 8,
        max = 1000,
        message = "Password must be at least 8 characters."
    ))]
    pub password: String,
}

/// Registers a user. Emails are stored lowercased.
pub async fn insert_new_user<C: ConnectionTrait>(
    db: &C,
    form: &UserCreate,
) -> Result<users::Model, ApiError> {
    let mut errors = FieldErrors::new();
    if let Err(e) = form.validate() {
        merge_validation_errors(&mut errors, &e);
    }

    let email = form.email.trim().to_lowercase();
    let username = form.username.trim();

    let email_taken = users::Entity::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(db)
        .await?
        .is_some();
    if email_taken {
        errors
            .entry("email".to_owned())
            .or_default()
            .push("A user with that email already exists.".to_owned());
    }

    let username_taken = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?
        .is_some();
    if username_taken {
        errors
            .entry("username".to_owned())
            .or_default()
            .push("A user with that username already exists.".to_owned());
    }

    if !errors.is_empty() {
        log::debug!("User registration validation failed: {:?}", errors);
        return Err(ApiError::Validation(errors));
    }

    let password_hash = hash_password(&form.password).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        ApiError::Internal("Failed to create user".to_owned())
    })?;

    let user = users::ActiveModel {
        email: Set(email),
        username: Set(username.to_owned()),
        first_name: Set(form.first_name.trim().to_owned()),
        last_name: Set(form.last_name.trim().to_owned()),
        password: Set(password_hash),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default() // id is assigned by the database
    }
    .insert(db)
    .await?;

    log::info!("New user registered: {} (user_id: {})", user.username, user.id);
    Ok(user)
}
