/// HTTP middleware and request extractors for blog-service
///
/// `IdentifyUser` resolves an optional identity from a Bearer JWT (header or
/// `access_token` cookie) and never rejects a request. Views then pull the
/// viewer through `Viewer` (optional) or `LoginRequired` (mandatory).
pub mod csrf;
pub mod permissions;

pub use csrf::{CsrfForm, CsrfToken};
pub use permissions::*;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use crypto_core::jwt::JwtKeys;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::config::SiteSettings;
use crate::db::BlogStore;
use crate::error::AppError;
use crate::models::User;

/// Cookie carrying the access token for browser sessions.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Where the request's token came from. Header-authenticated requests are
/// not exposed to cross-site form posts and skip the CSRF check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    Header,
    Cookie,
}

/// Identity stored in request extensions after a token validated.
#[derive(Debug, Clone, Copy)]
pub struct UserId {
    pub id: i64,
    pub source: AuthSource,
}

// =====================================================================
// Identity middleware
// =====================================================================

pub struct IdentifyUser {
    keys: Arc<JwtKeys>,
}

impl IdentifyUser {
    pub fn new(keys: Arc<JwtKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentifyUser
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentifyUserService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentifyUserService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct IdentifyUserService<S> {
    service: Rc<S>,
    keys: Arc<JwtKeys>,
}

impl<S, B> Service<ServiceRequest> for IdentifyUserService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some((token, source)) = request_token(&req) {
            match self.keys.user_id_from_token(&token) {
                Ok(id) => {
                    req.extensions_mut().insert(UserId { id, source });
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring invalid access token");
                }
            }
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

fn request_token(req: &ServiceRequest) -> Option<(String, AuthSource)> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = header {
        return Some((token.to_string(), AuthSource::Header));
    }

    req.cookie(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .map(|t| (t, AuthSource::Cookie))
}

// =====================================================================
// Viewer extractors
// =====================================================================

/// The current user, if the request carries a valid token for an existing
/// user.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }

    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(Viewer(load_viewer(&req).await?)) })
    }
}

/// The current user; anonymous requests are redirected to the login page.
#[derive(Debug, Clone)]
pub struct LoginRequired(pub User);

impl FromRequest for LoginRequired {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match load_viewer(&req).await? {
                Some(user) => Ok(LoginRequired(user)),
                None => Err(login_required(&req).into()),
            }
        })
    }
}

async fn load_viewer(req: &HttpRequest) -> Result<Option<User>, AppError> {
    let Some(identity) = req.extensions().get::<UserId>().copied() else {
        return Ok(None);
    };
    let store = req
        .app_data::<web::Data<dyn BlogStore>>()
        .ok_or_else(|| AppError::Internal("blog store not configured".into()))?;

    let user = store.find_user_by_id(identity.id).await?;
    if user.is_none() {
        tracing::debug!(user_id = identity.id, "Token subject no longer exists");
    }
    Ok(user)
}

/// Redirect to the login page, remembering the requested path and query.
pub fn login_required(req: &HttpRequest) -> AppError {
    let login_url = req
        .app_data::<web::Data<SiteSettings>>()
        .map(|s| s.login_url.clone())
        .unwrap_or_else(|| "/auth/login/".to_string());
    let next = match req.query_string() {
        "" => req.path().to_string(),
        query => format!("{}?{}", req.path(), query),
    };
    let next = urlencoding::encode(&next).replace("%2F", "/");

    AppError::LoginRequired {
        location: format!("{}?next={}", login_url, next),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_login_redirect_keeps_path_and_query() {
        let req = TestRequest::get().uri("/follow/?page=2").to_http_request();
        match login_required(&req) {
            AppError::LoginRequired { location } => {
                assert_eq!(location, "/auth/login/?next=/follow/%3Fpage%3D2")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let req = TestRequest::get()
            .insert_header((AUTHORIZATION, "Bearer header-token"))
            .cookie(actix_web::cookie::Cookie::new(ACCESS_TOKEN_COOKIE, "cookie-token"))
            .to_srv_request();
        assert_eq!(
            request_token(&req),
            Some(("header-token".to_string(), AuthSource::Header))
        );
    }

    #[test]
    fn test_cookie_token_is_used_without_header() {
        let req = TestRequest::get()
            .cookie(actix_web::cookie::Cookie::new(ACCESS_TOKEN_COOKIE, "cookie-token"))
            .to_srv_request();
        assert_eq!(
            request_token(&req),
            Some(("cookie-token".to_string(), AuthSource::Cookie))
        );
        assert_eq!(request_token(&TestRequest::get().to_srv_request()), None);
    }
}
