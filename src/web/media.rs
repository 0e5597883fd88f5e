use crate::error::ApiError;
use crate::recipes::image::is_image_filename;
use crate::storage::StorageBackend;
use actix_web::http::header::{self, CacheControl, CacheDirective};
use actix_web::{get, web, HttpResponse, Responder};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_recipe_image);
}

/// Serves stored recipe images. Names are content hashes, so they never change.
#[get("/media/recipes/images/{filename}")]
pub async fn view_recipe_image(
    storage: web::Data<dyn StorageBackend>,
    path: web::Path<(String,)>,
) -> Result<impl Responder, ApiError> {
    let filename = path.into_inner().0;
    if !is_image_filename(&filename) {
        return Err(ApiError::not_found());
    }

    let object = storage.get_object(&filename).await?;
    let mut response = HttpResponse::Ok();
    response.insert_header(CacheControl(vec![
        CacheDirective::Public,
        CacheDirective::MaxAge(31_536_000),
    ]));
    if let Some(content_type) = object.content_type {
        response.content_type(content_type);
    }
    if let Some(e_tag) = object.e_tag {
        response.insert_header((header::ETAG, e_tag));
    }
    Ok(response.body(object.body))
}
