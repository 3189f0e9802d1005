/// Comment handlers
use actix_web::{web, HttpResponse};
use tracing::debug;

use super::{paginator, post_url, redirect};
use crate::config::SiteSettings;
use crate::db::BlogStore;
use crate::error::Result;
use crate::forms::CommentForm;
use crate::middleware::{CsrfForm, LoginRequired};
use crate::services::{CommentService, PostService};

/// Attach a comment to a post and go back to it. Invalid submissions are
/// dropped without feedback; a missing post is a 404.
pub async fn add_comment(
    store: web::Data<dyn BlogStore>,
    settings: web::Data<SiteSettings>,
    user: LoginRequired,
    post_id: web::Path<i64>,
    payload: CsrfForm,
) -> Result<HttpResponse> {
    let LoginRequired(user) = user;
    let post = PostService::new(store.get_ref(), paginator(&settings))
        .post(*post_id)
        .await?;

    match CommentForm::bind(&payload.0).validate() {
        Ok(draft) => {
            CommentService::new(store.get_ref())
                .add(post.id, &user, draft)
                .await?;
        }
        Err(errors) => {
            debug!(post_id = post.id, ?errors, "Dropped invalid comment");
        }
    }

    Ok(redirect(&post_url(post.id)))
}
