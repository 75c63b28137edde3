use crate::database::models::LikeRecord;
use crate::database::repositories::{LikeRepository, PostRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes: i64,
}

#[derive(Clone)]
pub struct LikeService {
    database: Database,
}

impl LikeService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Flips the (post, user) like. The presence row is the source of truth;
    /// the returned count is always re-derived after the write.
    pub fn toggle(&self, post_id: &str, user_key: &str) -> Result<LikeState> {
        if user_key.trim().is_empty() {
            anyhow::bail!("user key may not be empty");
        }
        self.database.with_repositories(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                anyhow::bail!("post {post_id} not found");
            }
            let likes = repos.likes();
            let liked = if likes.exists(post_id, user_key)? {
                likes.remove(post_id, user_key)?;
                false
            } else {
                likes.insert(&LikeRecord {
                    post_id: post_id.to_string(),
                    user_key: user_key.to_string(),
                    created_at: now_utc_iso(),
                })?;
                true
            };
            Ok(LikeState {
                liked,
                likes: likes.count_for_post(post_id)?,
            })
        })
    }

    pub fn state(&self, post_id: &str, user_key: &str) -> Result<LikeState> {
        self.database.with_repositories(|repos| {
            Ok(LikeState {
                liked: repos.likes().exists(post_id, user_key)?,
                likes: repos.likes().count_for_post(post_id)?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::{PostKind, PostService, PublishPostInput};
    use rusqlite::Connection;

    fn setup() -> (LikeService, String) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        let post = PostService::new(db.clone(), "http://localhost")
            .publish(PublishPostInput {
                title: "Post".into(),
                author: "alice".into(),
                kind: PostKind::Article,
                cover_image: None,
                tags: Vec::new(),
                content: Some("body".into()),
                video_url: None,
                file_name: None,
                file_object_id: None,
            })
            .expect("publish");
        (LikeService::new(db), post.id)
    }

    #[test]
    fn double_toggle_returns_to_the_original_state() {
        let (service, post_id) = setup();
        let first = service.toggle(&post_id, "reader-1").unwrap();
        assert!(first.liked);
        assert_eq!(first.likes, 1);

        let second = service.toggle(&post_id, "reader-1").unwrap();
        assert!(!second.liked);
        assert_eq!(second.likes, 0);
    }

    #[test]
    fn counts_are_per_post_and_per_user() {
        let (service, post_id) = setup();
        service.toggle(&post_id, "reader-1").unwrap();
        let state = service.toggle(&post_id, "reader-2").unwrap();
        assert_eq!(state.likes, 2);

        let observed = service.state(&post_id, "reader-1").unwrap();
        assert!(observed.liked);
        assert_eq!(observed.likes, 2);
    }

    #[test]
    fn toggle_rejects_missing_posts_and_blank_keys() {
        let (service, post_id) = setup();
        assert!(service.toggle("missing", "reader-1").is_err());
        assert!(service.toggle(&post_id, "  ").is_err());
    }
}
