/// HTML rendering
///
/// Templates are compiled into the binary and parsed once at startup. Every
/// page gets the shared base context from [`base_context`]; handlers add
/// their own variables on top.
use tera::{Context, Tera};
use tracing::error;

use crate::config::SiteSettings;
use crate::models::User;

const SOURCES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("posts/index.html", include_str!("../templates/posts/index.html")),
    (
        "posts/group_list.html",
        include_str!("../templates/posts/group_list.html"),
    ),
    ("posts/profile.html", include_str!("../templates/posts/profile.html")),
    (
        "posts/post_detail.html",
        include_str!("../templates/posts/post_detail.html"),
    ),
    (
        "posts/create_post.html",
        include_str!("../templates/posts/create_post.html"),
    ),
    ("posts/follow.html", include_str!("../templates/posts/follow.html")),
    ("core/404.html", include_str!("../templates/core/404.html")),
    ("core/403csrf.html", include_str!("../templates/core/403csrf.html")),
    ("core/500.html", include_str!("../templates/core/500.html")),
];

pub const NOT_FOUND_PAGE: &str = "core/404.html";
pub const CSRF_FAILURE_PAGE: &str = "core/403csrf.html";
pub const SERVER_ERROR_PAGE: &str = "core/500.html";

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(SOURCES.iter().copied())?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> tera::Result<String> {
        self.tera.render(name, context)
    }

    /// Render one of the error pages. Never fails: a broken template falls
    /// back to a bare message so the status code still reaches the client.
    pub fn render_error_page(&self, name: &str, settings: &SiteSettings, path: &str) -> String {
        let mut context = base_context(settings, None);
        context.insert("path", path);
        match self.tera.render(name, &context) {
            Ok(html) => html,
            Err(e) => {
                error!(template = name, error = %e, "Failed to render error page");
                format!("<h1>{}</h1>", settings.site_name)
            }
        }
    }
}

/// Variables every page template expects.
pub fn base_context(settings: &SiteSettings, viewer: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("site_name", &settings.site_name);
    context.insert("login_url", &settings.login_url);
    context.insert("media_url", &settings.media_url);
    context.insert("user", &viewer);
    context
}
