//! Recipes: listing, detail views and author-only writes.

pub mod image;
pub mod validation;

use self::image::DecodedImage;
use self::validation::{Mode, RecipeWrite, ValidRecipe};
use crate::app_config::AppConfig;
use crate::catalog::TagView;
use crate::error::{ApiError, FieldErrors};
use crate::membership::{members_among, recipe_ids_of, Favorites, ShoppingCart};
use crate::orm::{ingredients, recipe_ingredients, recipe_tags, recipes, tags, users};
use crate::pagination::{fetch_page, PageRequest};
use crate::storage::StorageBackend;
use crate::user::Profile;
use chrono::Utc;
use sea_orm::sea_query::Query;
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Short form used by favorites, the cart and subscription listings.
#[derive(Clone, Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeSummary {
    pub fn from_model(recipe: &recipes::Model, config: &AppConfig) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.to_owned(),
            image: config.image_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RecipeIngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecipeView {
    pub id: i32,
    pub tags: Vec<TagView>,
    pub author: Profile,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Query filters of `GET /api/recipes/`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches if it carries any of them.
    pub tags: Vec<String>,
    pub author: Option<i32>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl RecipeFilter {
    /// Parses the raw query string. `tags` may repeat; unknown keys are ignored.
    pub fn from_query(query: &str) -> Result<Self, ApiError> {
        let mut filter = Self::default();
        let mut errors = FieldErrors::new();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "tags" if !value.is_empty() => filter.tags.push(value.into_owned()),
                "author" if !value.is_empty() => match value.parse::<i32>() {
                    Ok(id) => filter.author = Some(id),
                    Err(_) => {
                        errors
                            .entry("author".to_owned())
                            .or_default()
                            .push("Author must be a user id.".to_owned());
                    }
                },
                "is_favorited" => filter.is_favorited = parse_flag(&value),
                "is_in_shopping_cart" => filter.is_in_shopping_cart = parse_flag(&value),
                _ => {}
            }
        }

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }
        Ok(filter)
    }
}

/// Builds full views for `recipes`, keeping their order.
pub async fn assemble<C: ConnectionTrait>(
    db: &C,
    recipes: Vec<recipes::Model>,
    viewer: Option<i32>,
    config: &AppConfig,
) -> Result<Vec<RecipeView>, ApiError> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientView>> = HashMap::new();
    for (line, ingredient) in recipe_ingredients::Entity::find()
        .filter(recipe_ingredients::Column::RecipeId.is_in(ids.clone()))
        .order_by_asc(recipe_ingredients::Column::Id)
        .find_also_related(ingredients::Entity)
        .all(db)
        .await?
    {
        if let Some(ingredient) = ingredient {
            ingredients_by_recipe
                .entry(line.recipe_id)
                .or_default()
                .push(RecipeIngredientView {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: line.amount,
                });
        }
    }

    let mut tags_by_recipe: HashMap<i32, Vec<TagView>> = HashMap::new();
    for (link, tag) in recipe_tags::Entity::find()
        .filter(recipe_tags::Column::RecipeId.is_in(ids.clone()))
        .order_by_asc(recipe_tags::Column::TagId)
        .find_also_related(tags::Entity)
        .all(db)
        .await?
    {
        if let Some(tag) = tag {
            tags_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(TagView::from(tag));
        }
    }

    let author_ids: HashSet<i32> = recipes.iter().map(|r| r.author_id).collect();
    let authors = users::Entity::find()
        .filter(users::Column::Id.is_in(author_ids))
        .all(db)
        .await?;
    let profiles: HashMap<i32, Profile> = Profile::from_models(db, &authors, viewer)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let favorited = members_among::<Favorites, _>(db, viewer, &ids).await?;
    let in_cart = members_among::<ShoppingCart, _>(db, viewer, &ids).await?;

    recipes
        .into_iter()
        .map(|recipe| -> Result<RecipeView, ApiError> {
            let author = profiles.get(&recipe.author_id).cloned().ok_or_else(|| {
                ApiError::Internal(format!("Author of recipe {} is missing", recipe.id))
            })?;
            Ok(RecipeView {
                id: recipe.id,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author,
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                image: config.image_url(&recipe.image),
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

/// One page of recipes, newest first, and the total number matching.
pub async fn list_recipes<C: ConnectionTrait>(
    db: &C,
    filter: &RecipeFilter,
    viewer: Option<i32>,
    page: PageRequest,
    config: &AppConfig,
) -> Result<(Vec<RecipeView>, u64), ApiError> {
    let mut select = recipes::Entity::find();

    if !filter.tags.is_empty() {
        let tag_ids = Query::select()
            .column(tags::Column::Id)
            .from(tags::Entity)
            .and_where(tags::Column::Slug.is_in(filter.tags.clone()))
            .to_owned();
        let tagged = Query::select()
            .column(recipe_tags::Column::RecipeId)
            .from(recipe_tags::Entity)
            .and_where(recipe_tags::Column::TagId.in_subquery(tag_ids))
            .to_owned();
        select = select.filter(recipes::Column::Id.in_subquery(tagged));
    }

    if let Some(author) = filter.author {
        select = select.filter(recipes::Column::AuthorId.eq(author));
    }

    // Membership filters only mean something for a signed in viewer.
    if let Some(user_id) = viewer {
        if filter.is_favorited {
            select = select
                .filter(recipes::Column::Id.in_subquery(recipe_ids_of::<Favorites>(user_id)));
        }
        if filter.is_in_shopping_cart {
            select = select
                .filter(recipes::Column::Id.in_subquery(recipe_ids_of::<ShoppingCart>(user_id)));
        }
    }

    let select = select
        .order_by_desc(recipes::Column::CreatedAt)
        .order_by_desc(recipes::Column::Id);
    let (rows, count) = fetch_page(select, db, page).await?;
    let views = assemble(db, rows, viewer, config).await?;
    Ok((views, count))
}

async fn find_recipe<C: ConnectionTrait>(db: &C, id: i32) -> Result<recipes::Model, ApiError> {
    recipes::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found.".to_owned()))
}

pub async fn get_recipe<C: ConnectionTrait>(
    db: &C,
    id: i32,
    viewer: Option<i32>,
    config: &AppConfig,
) -> Result<RecipeView, ApiError> {
    let recipe = find_recipe(db, id).await?;
    assemble(db, vec![recipe], viewer, config)
        .await?
        .pop()
        .ok_or_else(ApiError::not_found)
}

/// Runs every payload check, including which referenced ids exist.
async fn check_payload<C: ConnectionTrait>(
    db: &C,
    payload: RecipeWrite,
    mode: Mode,
) -> Result<ValidRecipe, ApiError> {
    let ingredient_ids = payload.ingredient_ids();
    let known_ingredients: HashSet<i32> = if ingredient_ids.is_empty() {
        HashSet::new()
    } else {
        ingredients::Entity::find()
            .select_only()
            .column(ingredients::Column::Id)
            .filter(ingredients::Column::Id.is_in(ingredient_ids))
            .into_tuple::<i32>()
            .all(db)
            .await?
            .into_iter()
            .collect()
    };

    let tag_ids = payload.tag_ids();
    let known_tags: HashSet<i32> = if tag_ids.is_empty() {
        HashSet::new()
    } else {
        tags::Entity::find()
            .select_only()
            .column(tags::Column::Id)
            .filter(tags::Column::Id.is_in(tag_ids))
            .into_tuple::<i32>()
            .all(db)
            .await?
            .into_iter()
            .collect()
    };

    payload.into_valid(mode, &known_ingredients, &known_tags)
}

/// Writes the image unless identical content is already stored.
async fn store_image(
    storage: &dyn StorageBackend,
    image: DecodedImage,
) -> Result<String, ApiError> {
    let filename = image.filename();
    if !storage.exists(&filename).await? {
        storage.put_object(image.bytes, &filename).await?;
    }
    Ok(filename)
}

/// Replaces every ingredient and tag link of a recipe.
async fn replace_links(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    ingredients: &[(i32, i32)],
    tags: &[i32],
) -> Result<(), ApiError> {
    recipe_ingredients::Entity::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;
    recipe_tags::Entity::delete_many()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;

    if !ingredients.is_empty() {
        recipe_ingredients::Entity::insert_many(ingredients.iter().map(|(id, amount)| {
            recipe_ingredients::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(*id),
                amount: Set(*amount),
                ..Default::default()
            }
        }))
        .exec_without_returning(txn)
        .await?;
    }

    if !tags.is_empty() {
        recipe_tags::Entity::insert_many(tags.iter().map(|id| recipe_tags::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*id),
            ..Default::default()
        }))
        .exec_without_returning(txn)
        .await?;
    }
    Ok(())
}

pub async fn create_recipe(
    db: &DatabaseConnection,
    storage: &dyn StorageBackend,
    author: &users::Model,
    payload: RecipeWrite,
    config: &AppConfig,
) -> Result<RecipeView, ApiError> {
    let valid = check_payload(db, payload, Mode::Create).await?;
    let (name, text, cooking_time, image) =
        match (valid.name, valid.text, valid.cooking_time, valid.image) {
            (Some(name), Some(text), Some(cooking_time), Some(image)) => {
                (name, text, cooking_time, image)
            }
            _ => return Err(ApiError::Internal("Validated recipe is incomplete".to_owned())),
        };
    let image = store_image(storage, image).await?;

    let txn = db.begin().await?;
    let recipe = recipes::ActiveModel {
        author_id: Set(author.id),
        name: Set(name),
        image: Set(image),
        text: Set(text),
        cooking_time: Set(cooking_time),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    replace_links(&txn, recipe.id, &valid.ingredients, &valid.tags).await?;
    txn.commit().await?;

    log::info!("user_id={} created recipe_id={}", author.id, recipe.id);
    get_recipe(db, recipe.id, Some(author.id), config).await
}

/// Applies a partial update. Missing recipe is 404, a non-author 403, a bad payload 400.
pub async fn update_recipe(
    db: &DatabaseConnection,
    storage: &dyn StorageBackend,
    user: &users::Model,
    recipe_id: i32,
    payload: RecipeWrite,
    config: &AppConfig,
) -> Result<RecipeView, ApiError> {
    let recipe = find_recipe(db, recipe_id).await?;
    if recipe.author_id != user.id {
        return Err(ApiError::Forbidden);
    }

    let valid = check_payload(db, payload, Mode::Update).await?;
    let image = match valid.image {
        Some(image) => Some(store_image(storage, image).await?),
        None => None,
    };

    let mut active: recipes::ActiveModel = recipe.into();
    if let Some(name) = valid.name {
        active.name = Set(name);
    }
    if let Some(text) = valid.text {
        active.text = Set(text);
    }
    if let Some(cooking_time) = valid.cooking_time {
        active.cooking_time = Set(cooking_time);
    }
    if let Some(image) = image {
        active.image = Set(image);
    }

    let txn = db.begin().await?;
    if active.is_changed() {
        active.update(&txn).await?;
    }
    replace_links(&txn, recipe_id, &valid.ingredients, &valid.tags).await?;
    txn.commit().await?;

    log::info!("user_id={} updated recipe_id={}", user.id, recipe_id);
    get_recipe(db, recipe_id, Some(user.id), config).await
}

/// Deletes a recipe. Its links, favorites and cart rows go with it.
pub async fn delete_recipe<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
    recipe_id: i32,
) -> Result<(), ApiError> {
    let recipe = find_recipe(db, recipe_id).await?;
    if recipe.author_id != user.id {
        return Err(ApiError::Forbidden);
    }
    recipes::Entity::delete_by_id(recipe_id).exec(db).await?;
    log::info!("user_id={} deleted recipe_id={}", user.id, recipe_id);
    Ok(())
}
