pub mod auth;
pub mod ingredients;
pub mod media;
pub mod recipes;
pub mod tags;
pub mod users;

use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Bad JSON, query strings and path segments answer with a `detail` message
/// instead of actix-web's plain text.
fn configure_extractors(conf: &mut web::ServiceConfig) {
    conf.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({ "detail": err.to_string() }));
        InternalError::from_response(err, response).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({ "detail": err.to_string() }));
        InternalError::from_response(err, response).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::NotFound().json(json!({ "detail": "Not found." }));
        InternalError::from_response(err, response).into()
    }));
}

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    configure_extractors(conf);

    // Order is important. Route resolution stops at the first match, so
    // fixed paths like `/api/users/me/` come before `/api/users/{id}/`.
    auth::configure(conf);
    users::configure(conf);
    tags::configure(conf);
    ingredients::configure(conf);
    recipes::configure(conf);
    media::configure(conf);
}
