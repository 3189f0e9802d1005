/// Follow handlers - the feed of followed authors and (un)subscribing
use actix_web::{web, HttpResponse};

use super::{html, paginator, profile_url, redirect};
use crate::config::SiteSettings;
use crate::db::{BlogStore, PostScope};
use crate::error::Result;
use crate::middleware::LoginRequired;
use crate::pagination::PageQuery;
use crate::services::{FollowService, PostService};
use crate::templates::{base_context, Templates};

/// Posts by every author the current user follows.
pub async fn follow_index(
    store: web::Data<dyn BlogStore>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    user: LoginRequired,
    query: PageQuery,
) -> Result<HttpResponse> {
    let LoginRequired(user) = user;
    let page = PostService::new(store.get_ref(), paginator(&settings))
        .page(PostScope::FollowedBy(user.id), query.page.as_deref())
        .await?;

    let mut context = base_context(&settings, Some(&user));
    context.insert("page", &page);
    Ok(html(templates.render("posts/follow.html", &context)?))
}

pub async fn profile_follow(
    store: web::Data<dyn BlogStore>,
    user: LoginRequired,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let service = FollowService::new(store.get_ref());
    let author = service.author(&username).await?;
    service.follow(&user.0, &author).await?;
    Ok(redirect(&profile_url(&author.username)))
}

pub async fn profile_unfollow(
    store: web::Data<dyn BlogStore>,
    user: LoginRequired,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let service = FollowService::new(store.get_ref());
    let author = service.author(&username).await?;
    service.unfollow(&user.0, &author).await?;
    Ok(redirect(&profile_url(&author.username)))
}
