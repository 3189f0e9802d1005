//! In-process store with the same observable behavior as the PostgreSQL
//! schema: unique usernames/slugs, unique follow pairs, cascading joins.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{BlogStore, PostScope};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentView, Follow, Group, NewComment, NewPost, Post, PostChanges, PostView, User,
};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: HashMap<i64, User>,
    groups: HashMap<i64, Group>,
    posts: HashMap<i64, Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn matches(&self, post: &Post, scope: PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Group(group_id) => post.group_id == Some(group_id),
            PostScope::Author(author_id) => post.author_id == author_id,
            PostScope::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn post_view(&self, post: &Post) -> Option<PostView> {
        let author = self.users.get(&post.author_id)?;
        let group = post.group_id.and_then(|id| self.groups.get(&id));
        Some(PostView {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            created_at: post.created_at,
            author_id: author.id,
            author_username: author.username.clone(),
            author_full_name: author.full_name.clone(),
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        })
    }

    fn comment_view(&self, comment: &Comment) -> Option<CommentView> {
        let author = self.users.get(&comment.author_id)?;
        Some(CommentView {
            id: comment.id,
            post_id: comment.post_id,
            author_id: author.id,
            author_username: author.username.clone(),
            author_full_name: author.full_name.clone(),
            text: comment.text.clone(),
            created_at: comment.created_at,
        })
    }

    fn scoped_posts(&self, scope: PostScope) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| self.matches(p, scope))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }
}

#[derive(Default)]
pub struct MemoryBlogStore {
    state: RwLock<MemoryState>,
}

impl MemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(what: String) -> AppError {
    AppError::BadRequest(what)
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_user(&self, username: &str, full_name: &str) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == username) {
            return Err(conflict(format!("username '{}' already exists", username)));
        }
        let user = User {
            id: state.next_id(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            joined_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_group(&self, slug: &str, title: &str, description: &str) -> Result<Group> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.slug == slug) {
            return Err(conflict(format!("group slug '{}' already exists", slug)));
        }
        let group = Group {
            id: state.next_id(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn count_posts(&self, scope: PostScope) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.scoped_posts(scope).len() as i64)
    }

    async fn list_posts(&self, scope: PostScope, limit: i64, offset: i64) -> Result<Vec<PostView>> {
        let state = self.state.read().await;
        let posts = state
            .scoped_posts(scope)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .filter_map(|p| state.post_view(p))
            .collect();
        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostView>> {
        let state = self.state.read().await;
        Ok(state.posts.get(&id).and_then(|p| state.post_view(p)))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&post.author_id) {
            return Err(conflict(format!("author {} does not exist", post.author_id)));
        }
        let created = Post {
            id: state.next_id(),
            text: post.text,
            image: post.image,
            created_at: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
        };
        state.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        Ok(state.posts.get_mut(&id).map(|post| {
            post.text = changes.text;
            post.group_id = changes.group_id;
            post.image = changes.image;
            post.clone()
        }))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let state = self.state.read().await;
        let mut comments: Vec<&Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments
            .into_iter()
            .filter_map(|c| state.comment_view(c))
            .collect())
    }

    async fn count_comments(&self, post_id: i64) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.comments.iter().filter(|c| c.post_id == post_id).count() as i64)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentView> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(AppError::not_found(format!("post {}", comment.post_id)));
        }
        let created = Comment {
            id: state.next_id(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        state.comments.push(created.clone());
        state
            .comment_view(&created)
            .ok_or_else(|| conflict(format!("author {} does not exist", created.author_id)))
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        if state
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }
        let follow = Follow {
            id: state.next_id(),
            user_id,
            author_id,
            created_at: Utc::now(),
        };
        state.follows.push(follow);
        Ok(true)
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(state.follows.len() < before)
    }

    async fn count_followers(&self, author_id: i64) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.follows.iter().filter(|f| f.author_id == author_id).count() as i64)
    }

    async fn count_following(&self, user_id: i64) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.follows.iter().filter(|f| f.user_id == user_id).count() as i64)
    }
}
