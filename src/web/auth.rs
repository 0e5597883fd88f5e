use crate::error::ApiError;
use crate::middleware::ClientCtx;
use crate::session::{login, revoke_token};
use actix_web::{post, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(token_login).service(token_logout);
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    auth_token: String,
}

#[post("/api/auth/token/login/")]
pub async fn token_login(
    db: web::Data<DatabaseConnection>,
    form: web::Json<LoginForm>,
) -> Result<impl Responder, ApiError> {
    let auth_token = login(db.get_ref(), &form.email, &form.password).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { auth_token }))
}

#[post("/api/auth/token/logout/")]
pub async fn token_logout(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, ApiError> {
    let user = client.require_login()?;
    if !revoke_token(db.get_ref(), user.id).await? {
        log::debug!("user_id={} logged out without a token row", user.id);
    }
    Ok(HttpResponse::NoContent().finish())
}
