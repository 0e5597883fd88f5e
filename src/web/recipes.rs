use crate::app_config::AppConfig;
use crate::error::ApiError;
use crate::membership::{self, Favorites, ShoppingCart};
use crate::middleware::ClientCtx;
use crate::pagination::{request_url, Page, PageParams};
use crate::recipes::validation::RecipeWrite;
use crate::recipes::{self, RecipeFilter};
use crate::shopping_list;
use crate::storage::StorageBackend;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse, Responder};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    // The download route must be registered before `/api/recipes/{recipe_id}/`.
    conf.service(download_shopping_cart)
        .service(view_recipes)
        .service(create_recipe)
        .service(view_recipe)
        .service(update_recipe)
        .service(delete_recipe)
        .service(add_favorite)
        .service(remove_favorite)
        .service(add_to_cart)
        .service(remove_from_cart);
}

#[get("/api/recipes/")]
pub async fn view_recipes(
    req: HttpRequest,
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    page: web::Query<PageParams>,
) -> Result<impl Responder, ApiError> {
    let filter = RecipeFilter::from_query(req.query_string())?;
    let page = page.resolve(&config.pagination);
    let (results, count) =
        recipes::list_recipes(db.get_ref(), &filter, client.get_id(), page, &config).await?;
    Ok(HttpResponse::Ok().json(Page::new(results, count, page, &request_url(&req))))
}

#[post("/api/recipes/")]
pub async fn create_recipe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    payload: web::Json<RecipeWrite>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    let recipe = recipes::create_recipe(
        db.get_ref(),
        storage.get_ref(),
        user,
        payload.into_inner(),
        &config,
    )
    .await?;
    Ok(HttpResponse::Created().json(recipe))
}

#[get("/api/recipes/{recipe_id}/")]
pub async fn view_recipe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let recipe =
        recipes::get_recipe(db.get_ref(), path.into_inner().0, client.get_id(), &config).await?;
    Ok(HttpResponse::Ok().json(recipe))
}

#[patch("/api/recipes/{recipe_id}/")]
pub async fn update_recipe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    path: web::Path<(i32,)>,
    payload: web::Json<RecipeWrite>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    let recipe = recipes::update_recipe(
        db.get_ref(),
        storage.get_ref(),
        user,
        path.into_inner().0,
        payload.into_inner(),
        &config,
    )
    .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

#[delete("/api/recipes/{recipe_id}/")]
pub async fn delete_recipe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    recipes::delete_recipe(db.get_ref(), user, path.into_inner().0).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/recipes/{recipe_id}/favorite/")]
pub async fn add_favorite(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    let summary =
        membership::add::<Favorites, _>(db.get_ref(), user.id, path.into_inner().0, &config)
            .await?;
    Ok(HttpResponse::Created().json(summary))
}

#[delete("/api/recipes/{recipe_id}/favorite/")]
pub async fn remove_favorite(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    membership::remove::<Favorites, _>(db.get_ref(), user.id, path.into_inner().0).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/recipes/{recipe_id}/shopping_cart/")]
pub async fn add_to_cart(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    let summary =
        membership::add::<ShoppingCart, _>(db.get_ref(), user.id, path.into_inner().0, &config)
            .await?;
    Ok(HttpResponse::Created().json(summary))
}

#[delete("/api/recipes/{recipe_id}/shopping_cart/")]
pub async fn remove_from_cart(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    membership::remove::<ShoppingCart, _>(db.get_ref(), user.id, path.into_inner().0).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/api/recipes/download_shopping_cart/")]
pub async fn download_shopping_cart(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    let body = shopping_list::shopping_list(db.get_ref(), user.id).await?;

    Ok(HttpResponse::Ok()
        .content_type(mime::TEXT_PLAIN_UTF_8)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(
                shopping_list::FILENAME.to_owned(),
            )],
        })
        .body(body))
}
