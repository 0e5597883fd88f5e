use crate::catalog;
use crate::error::ApiError;
use actix_web::{get, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_ingredients).service(view_ingredient);
}

#[derive(Debug, Deserialize)]
pub struct IngredientSearch {
    search: Option<String>,
    name: Option<String>,
}

/// `?search=` or `?name=` narrows the list to names starting with the value.
#[get("/api/ingredients/")]
pub async fn view_ingredients(
    db: web::Data<DatabaseConnection>,
    query: web::Query<IngredientSearch>,
) -> Result<impl Responder, ApiError> {
    let query = query.into_inner();
    let prefix = query.search.or(query.name);
    let ingredients = catalog::search_ingredients(db.get_ref(), prefix.as_deref()).await?;
    Ok(HttpResponse::Ok().json(ingredients))
}

#[get("/api/ingredients/{ingredient_id}/")]
pub async fn view_ingredient(
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let ingredient = catalog::get_ingredient(db.get_ref(), path.into_inner().0).await?;
    Ok(HttpResponse::Ok().json(ingredient))
}
