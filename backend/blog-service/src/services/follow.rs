/// Follow service - subscriptions between users
use tracing::info;

use super::require_user;
use crate::db::BlogStore;
use crate::error::Result;
use crate::metrics::CONTENT_WRITES;
use crate::models::User;

/// Follower figures shown on a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowStats {
    pub followers: i64,
    pub following: i64,
}

pub struct FollowService<'a> {
    store: &'a dyn BlogStore,
}

impl<'a> FollowService<'a> {
    pub fn new(store: &'a dyn BlogStore) -> Self {
        Self { store }
    }

    pub async fn author(&self, username: &str) -> Result<User> {
        require_user(self.store, username).await
    }

    /// Whether `viewer` follows `author`; anonymous viewers follow nobody.
    pub async fn is_following(&self, viewer: Option<i64>, author_id: i64) -> Result<bool> {
        match viewer {
            Some(user_id) => self.store.is_following(user_id, author_id).await,
            None => Ok(false),
        }
    }

    pub async fn stats(&self, user_id: i64) -> Result<FollowStats> {
        Ok(FollowStats {
            followers: self.store.count_followers(user_id).await?,
            following: self.store.count_following(user_id).await?,
        })
    }

    /// Subscribe `user` to `author`. Following yourself or following twice
    /// is a no-op; returns whether a subscription was created.
    pub async fn follow(&self, user: &User, author: &User) -> Result<bool> {
        if user.id == author.id {
            return Ok(false);
        }
        let created = self.store.create_follow(user.id, author.id).await?;
        if created {
            CONTENT_WRITES.with_label_values(&["follow"]).inc();
            info!(user = %user.username, author = %author.username, "Follow created");
        }
        Ok(created)
    }

    pub async fn unfollow(&self, user: &User, author: &User) -> Result<bool> {
        let removed = self.store.delete_follow(user.id, author.id).await?;
        if removed {
            CONTENT_WRITES.with_label_values(&["unfollow"]).inc();
            info!(user = %user.username, author = %author.username, "Follow removed");
        }
        Ok(removed)
    }
}
