//! Database connection and schema creation.
//!
//! The schema is derived from the entity definitions in `crate::orm`, so
//! foreign keys and their `ON DELETE CASCADE` rules come straight from the
//! `belongs_to` relations. Composite uniqueness is added as separate indexes.

use crate::orm::{
    auth_tokens, carts, favorites, ingredients, recipe_ingredients, recipe_tags, recipes,
    subscriptions, tags, users,
};
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::time::Duration;

/// Opens a connection pool.
pub async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    log::info!("Connected to database ({:?})", db.get_database_backend());
    Ok(db)
}

async fn create_table<E, C>(db: &C, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    let stmt = Schema::new(backend)
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

async fn create_index<C: ConnectionTrait>(db: &C, stmt: IndexCreateStatement) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

fn unique_pair<E, A, B>(name: &str, entity: E, a: A, b: B) -> IndexCreateStatement
where
    E: EntityTrait,
    A: sea_orm::ColumnTrait,
    B: sea_orm::ColumnTrait,
{
    Index::create()
        .name(name)
        .table(entity)
        .col(a)
        .col(b)
        .unique()
        .if_not_exists()
        .to_owned()
}

/// Creates every table and unique index that does not exist yet.
///
/// Parent tables are created before the tables referencing them.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, auth_tokens::Entity).await?;
    create_table(db, ingredients::Entity).await?;
    create_table(db, tags::Entity).await?;
    create_table(db, recipes::Entity).await?;
    create_table(db, recipe_ingredients::Entity).await?;
    create_table(db, recipe_tags::Entity).await?;
    create_table(db, favorites::Entity).await?;
    create_table(db, carts::Entity).await?;
    create_table(db, subscriptions::Entity).await?;

    create_index(
        db,
        unique_pair(
            "idx-ingredients-name-unit",
            ingredients::Entity,
            ingredients::Column::Name,
            ingredients::Column::MeasurementUnit,
        ),
    )
    .await?;
    create_index(
        db,
        unique_pair(
            "idx-recipe_ingredients-recipe-ingredient",
            recipe_ingredients::Entity,
            recipe_ingredients::Column::RecipeId,
            recipe_ingredients::Column::IngredientId,
        ),
    )
    .await?;
    create_index(
        db,
        unique_pair(
            "idx-recipe_tags-recipe-tag",
            recipe_tags::Entity,
            recipe_tags::Column::RecipeId,
            recipe_tags::Column::TagId,
        ),
    )
    .await?;
    create_index(
        db,
        unique_pair(
            "idx-favorites-user-recipe",
            favorites::Entity,
            favorites::Column::UserId,
            favorites::Column::RecipeId,
        ),
    )
    .await?;
    create_index(
        db,
        unique_pair(
            "idx-carts-user-recipe",
            carts::Entity,
            carts::Column::UserId,
            carts::Column::RecipeId,
        ),
    )
    .await?;
    create_index(
        db,
        unique_pair(
            "idx-subscriptions-follower-following",
            subscriptions::Entity,
            subscriptions::Column::FollowerId,
            subscriptions::Column::FollowingId,
        ),
    )
    .await?;

    log::debug!("Database schema is up to date");
    Ok(())
}
