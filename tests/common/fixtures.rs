//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use foodgram::orm::{ingredients, recipe_ingredients, recipe_tags, recipes, tags, users};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Password every fixture user is created with.
pub const TEST_PASSWORD: &str = "password123";

/// 1x1 transparent PNG.
pub const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Create a test user with known credentials. The email is `<username>@test.com`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, DbErr> {
    let password_hash = foodgram::session::hash_password(TEST_PASSWORD)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    users::ActiveModel {
        email: Set(format!("{}@test.com", username)),
        username: Set(username.to_owned()),
        first_name: Set("Test".to_owned()),
        last_name: Set(username.to_owned()),
        password: Set(password_hash),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Issue an API token for a user.
pub async fn create_test_token(db: &DatabaseConnection, user_id: i32) -> Result<String, DbErr> {
    foodgram::session::get_or_create_token(db, user_id).await
}

/// Value of the `Authorization` header for a token.
pub fn auth_header(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Token {}", token))
}

pub async fn create_test_ingredient(
    db: &DatabaseConnection,
    name: &str,
    unit: &str,
) -> Result<ingredients::Model, DbErr> {
    ingredients::ActiveModel {
        name: Set(name.to_owned()),
        measurement_unit: Set(unit.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_tag(
    db: &DatabaseConnection,
    name: &str,
    color: &str,
    slug: &str,
) -> Result<tags::Model, DbErr> {
    tags::ActiveModel {
        name: Set(name.to_owned()),
        color: Set(color.to_owned()),
        slug: Set(slug.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a recipe directly in the database, bypassing validation and storage.
pub async fn create_test_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    name: &str,
    ingredients: &[(i32, i32)],
    tags: &[i32],
) -> Result<recipes::Model, DbErr> {
    let recipe = recipes::ActiveModel {
        author_id: Set(author_id),
        name: Set(name.to_owned()),
        image: Set(format!("{}.png", "0".repeat(64))),
        text: Set(format!("How to cook {}", name)),
        cooking_time: Set(15),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (ingredient_id, amount) in ingredients {
        recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe.id),
            ingredient_id: Set(*ingredient_id),
            amount: Set(*amount),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    for tag_id in tags {
        recipe_tags::ActiveModel {
            recipe_id: Set(recipe.id),
            tag_id: Set(*tag_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(recipe)
}
