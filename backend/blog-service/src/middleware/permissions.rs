/// Ownership checks for posts
///
/// Only the author may modify a post. A failed check is not an error page:
/// the edit view sends the visitor back to the post instead.
use thiserror::Error;

use crate::models::PostView;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("user {user_id} may not modify post {post_id}")]
pub struct PermissionDenied {
    pub user_id: i64,
    pub post_id: i64,
}

/// Result type for permission checks
pub type PermissionResult = Result<(), PermissionDenied>;

/// Check if a user owns a post
pub fn check_post_ownership(user_id: i64, post: &PostView) -> PermissionResult {
    if post.is_authored_by(user_id) {
        Ok(())
    } else {
        Err(PermissionDenied {
            user_id,
            post_id: post.id,
        })
    }
}
