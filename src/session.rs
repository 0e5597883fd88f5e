//! Password hashing and API token issuance.

use crate::error::ApiError;
use crate::orm::{auth_tokens, users};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// Length of an issued token key.
pub const TOKEN_LENGTH: usize = 40;

/// Returns the hasher used for every password.
pub fn get_argon2() -> Argon2<'static> {
    Argon2::default()
}

/// Hashes a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

fn generate_token_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Returns the user's token, creating one on first login.
pub async fn get_or_create_token<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<String, DbErr> {
    if let Some(token) = auth_tokens::Entity::find()
        .filter(auth_tokens::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        return Ok(token.key);
    }

    let token = auth_tokens::ActiveModel {
        key: Set(generate_token_key()),
        user_id: Set(user_id),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await?;

    log::info!("Issued API token for user_id={}", user_id);
    Ok(token.key)
}

/// Deletes the user's token. Returns whether one existed.
pub async fn revoke_token<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<bool, DbErr> {
    let result = auth_tokens::Entity::delete_many()
        .filter(auth_tokens::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Resolves a token key to its user.
pub async fn authenticate_by_token<C: ConnectionTrait>(
    db: &C,
    key: &str,
) -> Result<Option<users::Model>, DbErr> {
    let found = auth_tokens::Entity::find_by_id(key.to_owned())
        .find_also_related(users::Entity)
        .one(db)
        .await?;
    Ok(found.and_then(|(_, user)| user))
}

/// Checks credentials and returns the user's token.
///
/// Unknown emails and wrong passwords get the same answer.
pub async fn login<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
) -> Result<String, ApiError> {
    let user = crate::user::find_by_email(db, email).await?;
    match user {
        Some(user) if verify_password(password, &user.password) => {
            Ok(get_or_create_token(db, user.id).await?)
        }
        _ => {
            log::debug!("Failed login attempt for email {:?}", email);
            Err(ApiError::field(
                "non_field_errors",
                "Unable to log in with provided credentials.",
            ))
        }
    }
}

/// Extracts the key from an `Authorization: Token <key>` header value.
///
/// Returns `None` when the scheme is not `Token`, or the key is missing.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    let key = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(key)
}
