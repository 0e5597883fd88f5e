use crate::error::ApiError;
use crate::orm::users;
use crate::session::{authenticate_by_token, parse_authorization};
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;
use std::rc::Rc;

/// Client context passed to routes.
///
/// Resolved once per request from the `Authorization: Token <key>` header and
/// cached in the request extensions. No header means a guest.
#[derive(Clone, Debug, Default)]
pub struct ClientCtx(Rc<Option<users::Model>>);

impl ClientCtx {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn for_user(user: users::Model) -> Self {
        Self(Rc::new(Some(user)))
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        (*self.0).as_ref().map(|u| u.id)
    }

    pub fn get_user(&self) -> Option<&users::Model> {
        (*self.0).as_ref()
    }

    /// Require user to be logged in. Returns the user or Unauthorized.
    pub fn require_login(&self) -> Result<&users::Model, ApiError> {
        self.get_user().ok_or(ApiError::Unauthorized)
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(cached) = req.extensions().get::<ClientCtx>() {
            let cached = cached.clone();
            return Box::pin(async move { Ok(cached) });
        }

        let req = req.clone();
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map(str::to_owned));
        let db = req.app_data::<Data<DatabaseConnection>>().cloned();

        Box::pin(async move {
            let client = match header {
                None => ClientCtx::guest(),
                Some(Err(_)) => return Err(ApiError::InvalidToken),
                Some(Ok(value)) => {
                    let key = parse_authorization(&value).ok_or(ApiError::InvalidToken)?;
                    let db = db.ok_or_else(|| {
                        ApiError::Internal("Database connection is not configured".to_owned())
                    })?;
                    let user = authenticate_by_token(db.get_ref(), key)
                        .await?
                        .ok_or(ApiError::InvalidToken)?;
                    ClientCtx::for_user(user)
                }
            };

            req.extensions_mut().insert(client.clone());
            Ok(client)
        })
    }
}
