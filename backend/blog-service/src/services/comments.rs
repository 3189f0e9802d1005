/// Comment service - comments on existing posts
use tracing::info;

use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::forms::CommentDraft;
use crate::metrics::CONTENT_WRITES;
use crate::models::{CommentView, NewComment, User};

pub struct CommentService<'a> {
    store: &'a dyn BlogStore,
}

impl<'a> CommentService<'a> {
    pub fn new(store: &'a dyn BlogStore) -> Self {
        Self { store }
    }

    /// Comments of a post, oldest first.
    pub async fn for_post(&self, post_id: i64) -> Result<Vec<CommentView>> {
        self.store.list_comments(post_id).await
    }

    pub async fn add(&self, post_id: i64, author: &User, draft: CommentDraft) -> Result<CommentView> {
        if self.store.find_post(post_id).await?.is_none() {
            return Err(AppError::not_found(format!("post {}", post_id)));
        }

        let comment = self
            .store
            .create_comment(NewComment {
                post_id,
                author_id: author.id,
                text: draft.text,
            })
            .await?;

        CONTENT_WRITES.with_label_values(&["comment"]).inc();
        info!(post_id, comment_id = comment.id, author = %author.username, "Comment added");
        Ok(comment)
    }
}
