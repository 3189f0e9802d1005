/// Double-submit CSRF protection
///
/// Pages with forms set the `csrftoken` cookie and embed the same value as
/// the `csrfmiddlewaretoken` field. [`CsrfForm`] reads a submission and
/// rejects it unless the two match. Requests authenticated through the
/// `Authorization` header are exempt.
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};

use super::{AuthSource, UserId};
use crate::error::AppError;
use crate::forms::FormPayload;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";
const TOKEN_LEN: usize = 32;

/// The token to embed in a rendered form.
#[derive(Debug, Clone)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Cookie to attach to the response that renders the form.
    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build(CSRF_COOKIE, self.0.clone())
            .path("/")
            .same_site(SameSite::Lax)
            .finish()
    }
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN && token.chars().all(|c| c.is_ascii_alphanumeric())
}

impl FromRequest for CsrfToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = req
            .cookie(CSRF_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| is_well_formed(t))
            .unwrap_or_else(|| crypto_core::random_token(TOKEN_LEN));
        ready(Ok(CsrfToken(token)))
    }
}

/// A form submission that passed the CSRF check.
#[derive(Debug)]
pub struct CsrfForm(pub FormPayload);

impl CsrfForm {
    pub fn into_inner(self) -> FormPayload {
        self.0
    }
}

impl FromRequest for CsrfForm {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let form = FormPayload::from_request(&req, payload);

        Box::pin(async move {
            let form = form.await?;
            verify(&req, &form)?;
            Ok(CsrfForm(form))
        })
    }
}

fn verify(req: &HttpRequest, form: &FormPayload) -> Result<(), AppError> {
    if req.method().is_safe() {
        return Ok(());
    }
    let header_auth = req
        .extensions()
        .get::<UserId>()
        .map(|id| id.source == AuthSource::Header)
        .unwrap_or(false);
    if header_auth {
        return Ok(());
    }

    let cookie = req
        .cookie(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::CsrfFailure("CSRF cookie not set".into()))?;
    let submitted = form
        .field(CSRF_FIELD)
        .ok_or_else(|| AppError::CsrfFailure("CSRF token missing".into()))?;

    if is_well_formed(&cookie) && constant_time_eq(cookie.as_bytes(), submitted.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::CsrfFailure("CSRF token incorrect".into()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
