/// Persistence layer
///
/// `BlogStore` is the seam between services and storage. `PgBlogStore` is the
/// production implementation; `MemoryBlogStore` backs tests and local runs
/// without a database.
pub mod memory;
pub mod postgres;

pub use memory::MemoryBlogStore;
pub use postgres::PgBlogStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    CommentView, Group, NewComment, NewPost, Post, PostChanges, PostView, User,
};

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows
    FollowedBy(i64),
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<()>;

    async fn create_user(&self, username: &str, full_name: &str) -> Result<User>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn create_group(&self, slug: &str, title: &str, description: &str) -> Result<Group>;
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;
    /// All groups ordered by title, for the post form's choices.
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn count_posts(&self, scope: PostScope) -> Result<i64>;
    /// Newest first.
    async fn list_posts(&self, scope: PostScope, limit: i64, offset: i64) -> Result<Vec<PostView>>;
    async fn find_post(&self, id: i64) -> Result<Option<PostView>>;
    async fn create_post(&self, post: NewPost) -> Result<Post>;
    /// Returns `None` when the post does not exist.
    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>>;

    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>>;
    async fn count_comments(&self, post_id: i64) -> Result<i64>;
    async fn create_comment(&self, comment: NewComment) -> Result<CommentView>;

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool>;
    /// Returns true when a new follow row was created.
    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<bool>;
    /// Returns true when a follow row was removed.
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool>;
    async fn count_followers(&self, author_id: i64) -> Result<i64>;
    async fn count_following(&self, user_id: i64) -> Result<i64>;
}
