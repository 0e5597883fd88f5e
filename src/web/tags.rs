use crate::catalog;
use crate::error::ApiError;
use actix_web::{get, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_tags).service(view_tag);
}

#[get("/api/tags/")]
pub async fn view_tags(db: web::Data<DatabaseConnection>) -> Result<impl Responder, ApiError> {
    let tags = catalog::list_tags(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(tags))
}

#[get("/api/tags/{tag_id}/")]
pub async fn view_tag(
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let tag = catalog::get_tag(db.get_ref(), path.into_inner().0).await?;
    Ok(HttpResponse::Ok().json(tag))
}
