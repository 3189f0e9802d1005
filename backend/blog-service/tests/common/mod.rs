//! Shared fixtures for blog-service integration tests.
//!
//! Every test builds its own application over the in-memory store and page
//! cache, with media written to a temporary directory.
#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::test::TestRequest;
use blog_service::cache::MemoryPageCache;
use blog_service::config::SiteSettings;
use blog_service::db::{BlogStore, MemoryBlogStore};
use blog_service::media::MediaStorage;
use blog_service::models::{Group, NewPost, Post, User};
use blog_service::templates::Templates;
use blog_service::AppState;
use crypto_core::jwt::JwtKeys;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const JWT_SECRET: &str = "integration-test-secret";
/// A well-formed CSRF token (32 alphanumerics).
pub const CSRF_TOKEN: &str = "TestCsrfToken0123456789abcdefghi";
pub const PAGE_SIZE: u32 = 10;

pub struct TestContext {
    pub store: Arc<MemoryBlogStore>,
    pub cache: Arc<MemoryPageCache>,
    pub keys: Arc<JwtKeys>,
    pub state: AppState,
    pub media_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_cache_ttl(Duration::from_secs(20))
    }

    pub fn with_cache_ttl(ttl: Duration) -> Self {
        let store = Arc::new(MemoryBlogStore::new());
        let cache = Arc::new(MemoryPageCache::new(ttl));
        let keys = Arc::new(JwtKeys::from_secret(JWT_SECRET.as_bytes(), 3600));
        let media_dir = tempfile::tempdir().expect("failed to create media dir");

        let state = AppState {
            store: store.clone(),
            cache: cache.clone(),
            keys: keys.clone(),
            templates: Arc::new(Templates::new().expect("templates must parse")),
            media: Arc::new(MediaStorage::new(media_dir.path())),
            settings: Arc::new(SiteSettings {
                site_name: "Yatube".into(),
                login_url: "/auth/login/".into(),
                media_url: "/media/".into(),
                max_upload_bytes: 1024 * 1024,
                posts_per_page: PAGE_SIZE,
            }),
        };

        Self {
            store,
            cache,
            keys,
            state,
            media_dir,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.store
            .create_user(username, "")
            .await
            .expect("failed to create user")
    }

    pub async fn group(&self, slug: &str, title: &str) -> Group {
        self.store
            .create_group(slug, title, "Test description")
            .await
            .expect("failed to create group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.store
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("failed to create post")
    }

    pub fn token(&self, user: &User) -> String {
        self.keys
            .issue_access_token(user.id, &user.username)
            .expect("failed to issue token")
    }

    /// GET as `user`, authenticated by the session cookie.
    pub fn get_as(&self, user: &User, uri: &str) -> TestRequest {
        TestRequest::get()
            .uri(uri)
            .cookie(Cookie::new("access_token", self.token(user)))
    }

    /// Form POST as `user` with a matching CSRF cookie and field.
    pub fn post_form_as(&self, user: &User, uri: &str, fields: &[(&str, &str)]) -> TestRequest {
        let mut form: Vec<(String, String)> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        form.push(("csrfmiddlewaretoken".into(), CSRF_TOKEN.into()));

        TestRequest::post()
            .uri(uri)
            .cookie(Cookie::new("access_token", self.token(user)))
            .cookie(Cookie::new("csrftoken", CSRF_TOKEN))
            .set_form(form)
    }
}

pub fn body_text(bytes: actix_web::web::Bytes) -> String {
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}

/// Number of post cards on a listing page.
pub fn post_cards(html: &str) -> usize {
    html.matches("<article class=\"post\">").count()
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
