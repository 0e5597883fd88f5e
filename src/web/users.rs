use crate::app_config::AppConfig;
use crate::create_user::{insert_new_user, UserCreate};
use crate::error::ApiError;
use crate::middleware::ClientCtx;
use crate::pagination::{request_url, Page, PageParams};
use crate::subscriptions;
use crate::user::{self, Profile};
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    // Fixed paths first; `{user_id}` would swallow them otherwise.
    conf.service(view_me)
        .service(delete_me)
        .service(set_password)
        .service(view_subscriptions)
        .service(view_users)
        .service(create_user)
        .service(view_user)
        .service(subscribe)
        .service(unsubscribe);
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordForm {
    new_password: String,
    current_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentPasswordForm {
    current_password: String,
}

#[get("/api/users/")]
pub async fn view_users(
    req: HttpRequest,
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    page: web::Query<PageParams>,
) -> Result<impl Responder, ApiError> {
    let page = page.resolve(&config.pagination);
    let (results, count) = user::list_users(db.get_ref(), client.get_id(), page).await?;
    Ok(HttpResponse::Ok().json(Page::new(results, count, page, &request_url(&req))))
}

#[post("/api/users/")]
pub async fn create_user(
    db: web::Data<DatabaseConnection>,
    form: web::Json<UserCreate>,
) -> Result<impl Responder, ApiError> {
    let user = insert_new_user(db.get_ref(), &form).await?;
    Ok(HttpResponse::Created().json(Profile::from_model(&user, false)))
}

#[get("/api/users/me/")]
pub async fn view_me(client: ClientCtx) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    Ok(HttpResponse::Ok().json(Profile::from_model(user, false)))
}

#[delete("/api/users/me/")]
pub async fn delete_me(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<CurrentPasswordForm>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    user::delete_account(db.get_ref(), user, &form.current_password).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/users/set_password/")]
pub async fn set_password(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<SetPasswordForm>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    user::change_password(
        db.get_ref(),
        user,
        &form.current_password,
        &form.new_password,
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/api/users/subscriptions/")]
pub async fn view_subscriptions(
    req: HttpRequest,
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    page: web::Query<PageParams>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    let page = page.resolve(&config.pagination);
    let (results, count) =
        subscriptions::list_subscriptions(db.get_ref(), user.id, page, &config).await?;
    Ok(HttpResponse::Ok().json(Page::new(results, count, page, &request_url(&req))))
}

#[get("/api/users/{user_id}/")]
pub async fn view_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let profile = Profile::get_by_id(db.get_ref(), path.into_inner().0, client.get_id()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[post("/api/users/{user_id}/subscribe/")]
pub async fn subscribe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    let view =
        subscriptions::subscribe(db.get_ref(), user.id, path.into_inner().0, &config).await?;
    Ok(HttpResponse::Created().json(view))
}

#[delete("/api/users/{user_id}/subscribe/")]
pub async fn unsubscribe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32,)>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    subscriptions::unsubscribe(db.get_ref(), user.id, path.into_inner().0).await?;
    Ok(HttpResponse::NoContent().finish())
}
