/// Post service - listings, lookups, creation and editing
use tracing::info;

use super::require_user;
use crate::db::{BlogStore, PostScope};
use crate::error::{AppError, Result};
use crate::forms::{ImageChange, PostDraft};
use crate::media::MediaStorage;
use crate::metrics::CONTENT_WRITES;
use crate::models::{Group, NewPost, Post, PostChanges, PostView, User};
use crate::pagination::{Page, Paginator};

pub struct PostService<'a> {
    store: &'a dyn BlogStore,
    paginator: Paginator,
}

impl<'a> PostService<'a> {
    pub fn new(store: &'a dyn BlogStore, paginator: Paginator) -> Self {
        Self { store, paginator }
    }

    /// One page of posts in `scope`, newest first.
    pub async fn page(&self, scope: PostScope, requested: Option<&str>) -> Result<Page<PostView>> {
        let count = self.store.count_posts(scope).await?;
        let window = self.paginator.window(count, requested);
        let items = self
            .store
            .list_posts(scope, window.limit, window.offset)
            .await?;
        Ok(Page::new(window, items))
    }

    pub async fn group(&self, slug: &str) -> Result<Group> {
        self.store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("group {}", slug)))
    }

    pub async fn author(&self, username: &str) -> Result<User> {
        require_user(self.store, username).await
    }

    pub async fn post(&self, post_id: i64) -> Result<PostView> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        self.store.count_posts(PostScope::Author(author_id)).await
    }

    /// Choices for the post form's group field.
    pub async fn groups(&self) -> Result<Vec<Group>> {
        self.store.list_groups().await
    }

    pub async fn create(
        &self,
        author: &User,
        draft: PostDraft,
        media: &MediaStorage,
    ) -> Result<Post> {
        let image = match draft.image {
            ImageChange::Replace(image) => Some(media.save_image(&image).await?),
            ImageChange::Keep | ImageChange::Clear => None,
        };

        let post = self
            .store
            .create_post(NewPost {
                author_id: author.id,
                text: draft.text,
                group_id: draft.group_id,
                image,
            })
            .await?;

        CONTENT_WRITES.with_label_values(&["post_created"]).inc();
        info!(post_id = post.id, author = %author.username, "Post created");
        Ok(post)
    }

    /// Apply `draft` to an existing post. Ownership is checked by the caller.
    pub async fn update(
        &self,
        post: &PostView,
        draft: PostDraft,
        media: &MediaStorage,
    ) -> Result<Post> {
        let image = match draft.image {
            ImageChange::Keep => post.image.clone(),
            ImageChange::Clear => None,
            ImageChange::Replace(image) => Some(media.save_image(&image).await?),
        };

        let updated = self
            .store
            .update_post(
                post.id,
                PostChanges {
                    text: draft.text,
                    group_id: draft.group_id,
                    image,
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post.id)))?;

        CONTENT_WRITES.with_label_values(&["post_updated"]).inc();
        info!(post_id = updated.id, "Post updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBlogStore;
    use crate::forms::ValidatedImage;
    use image::ImageFormat;

    fn draft(text: &str, group_id: Option<i64>, image: ImageChange) -> PostDraft {
        PostDraft {
            text: text.to_string(),
            group_id,
            image,
        }
    }

    #[tokio::test]
    async fn test_create_and_edit_keep_single_record() {
        let store = MemoryBlogStore::new();
        let media_dir = tempfile::tempdir().unwrap();
        let media = MediaStorage::new(media_dir.path());
        let author = store.create_user("auth", "").await.unwrap();
        let service = PostService::new(&store, Paginator::default());

        let post = service
            .create(&author, draft("first", None, ImageChange::Keep), &media)
            .await
            .unwrap();
        let view = service.post(post.id).await.unwrap();
        service
            .update(&view, draft("edited", None, ImageChange::Keep), &media)
            .await
            .unwrap();

        assert_eq!(service.count_by_author(author.id).await.unwrap(), 1);
        assert_eq!(service.post(post.id).await.unwrap().text, "edited");
    }

    #[tokio::test]
    async fn test_image_replace_and_clear() {
        let store = MemoryBlogStore::new();
        let media_dir = tempfile::tempdir().unwrap();
        let media = MediaStorage::new(media_dir.path());
        let author = store.create_user("auth", "").await.unwrap();
        let service = PostService::new(&store, Paginator::default());

        let image = ValidatedImage {
            filename: "small.gif".into(),
            bytes: b"GIF89a".to_vec(),
            format: ImageFormat::Gif,
        };
        let post = service
            .create(&author, draft("pic", None, ImageChange::Replace(image)), &media)
            .await
            .unwrap();
        let stored = post.image.clone().unwrap();
        assert!(stored.starts_with("posts/"));
        assert!(media_dir.path().join(&stored).exists());

        let view = service.post(post.id).await.unwrap();
        let kept = service
            .update(&view, draft("pic", None, ImageChange::Keep), &media)
            .await
            .unwrap();
        assert_eq!(kept.image.as_deref(), Some(stored.as_str()));

        let cleared = service
            .update(&view, draft("pic", None, ImageChange::Clear), &media)
            .await
            .unwrap();
        assert_eq!(cleared.image, None);
    }

    #[tokio::test]
    async fn test_missing_lookups_are_not_found() {
        let store = MemoryBlogStore::new();
        let service = PostService::new(&store, Paginator::default());

        assert!(matches!(service.post(404).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.group("nope").await, Err(AppError::NotFound(_))));
        assert!(matches!(service.author("ghost").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pages_split_by_page_size() {
        let store = MemoryBlogStore::new();
        let media_dir = tempfile::tempdir().unwrap();
        let media = MediaStorage::new(media_dir.path());
        let author = store.create_user("auth", "").await.unwrap();
        let service = PostService::new(&store, Paginator::new(10));

        for i in 0..12 {
            service
                .create(&author, draft(&format!("post {}", i), None, ImageChange::Keep), &media)
                .await
                .unwrap();
        }

        let first = service.page(PostScope::All, None).await.unwrap();
        let second = service.page(PostScope::All, Some("2")).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 2);
        assert_eq!(first.items[0].text, "post 11");
    }
}
