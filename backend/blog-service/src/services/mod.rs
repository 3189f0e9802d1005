/// Business logic layer for blog-service
///
/// - Post service: listings, lookups, creation and editing
/// - Comment service: comments on existing posts
/// - Follow service: subscriptions between users
///
/// Services borrow the store for the duration of a request. Every lookup by
/// id, slug or username fails with `AppError::NotFound` when nothing matches.
pub mod comments;
pub mod follow;
pub mod posts;

pub use comments::CommentService;
pub use follow::FollowService;
pub use posts::PostService;

use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::models::User;

pub(crate) async fn require_user(store: &dyn BlogStore, username: &str) -> Result<User> {
    store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", username)))
}
