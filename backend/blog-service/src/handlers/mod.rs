/// HTTP handlers for blog-service
///
/// Pages render through [`crate::templates::Templates`]; mutations answer
/// with a 302 to the page that shows the result.
pub mod comments;
pub mod follow;
pub mod health;
pub mod posts;

pub use comments::*;
pub use follow::*;
pub use health::*;
pub use posts::*;

use actix_web::http::header;
use actix_web::HttpResponse;

use crate::config::SiteSettings;
use crate::middleware::CsrfToken;
use crate::pagination::Paginator;

const HTML: &str = "text/html; charset=utf-8";

pub(crate) fn paginator(settings: &SiteSettings) -> Paginator {
    Paginator::new(settings.posts_per_page)
}

pub(crate) fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(HTML).body(body)
}

/// HTML response for a page containing a form; refreshes the CSRF cookie.
pub(crate) fn html_with_csrf(body: String, csrf: &CsrfToken) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(HTML)
        .cookie(csrf.cookie())
        .body(body)
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}
