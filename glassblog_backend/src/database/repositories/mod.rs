mod comments;
mod likes;
mod objects;
mod posts;
mod sessions;

use super::models::{CommentRecord, LikeRecord, ObjectRecord, PostRecord, SessionRecord};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    /// Every post, newest first (the fetch order the feed pipeline assumes).
    fn list_recent(&self) -> Result<Vec<PostRecord>>;
    fn update_editable(
        &self,
        id: &str,
        title: &str,
        content: Option<&str>,
        updated_at: &str,
    ) -> Result<bool>;
    fn increment_views(&self, id: &str) -> Result<i64>;
    fn delete(&self, id: &str) -> Result<bool>;
    fn count(&self) -> Result<i64>;
    fn total_views(&self) -> Result<i64>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<CommentRecord>>;
    /// All comments for a post, creation time ascending.
    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
    fn count(&self) -> Result<i64>;
}

pub trait LikeRepository {
    fn insert(&self, record: &LikeRecord) -> Result<()>;
    fn remove(&self, post_id: &str, user_key: &str) -> Result<()>;
    fn exists(&self, post_id: &str, user_key: &str) -> Result<bool>;
    fn count_for_post(&self, post_id: &str) -> Result<i64>;
    /// Returns HashMap<post_id, like count> for every post with at least
    /// one like. Posts absent from the map have zero likes.
    fn counts_by_post(&self) -> Result<HashMap<String, i64>>;
}

pub trait ObjectRepository {
    fn insert(&self, record: &ObjectRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<ObjectRecord>>;
}

pub trait SessionRepository {
    fn insert(&self, record: &SessionRecord) -> Result<()>;
    fn get(&self, token: &str) -> Result<Option<SessionRecord>>;
    fn delete(&self, token: &str) -> Result<()>;
    fn delete_expired(&self, now: &str) -> Result<usize>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn likes(&self) -> impl LikeRepository + '_ {
        likes::SqliteLikeRepository { conn: self.conn }
    }

    pub fn objects(&self) -> impl ObjectRepository + '_ {
        objects::SqliteObjectRepository { conn: self.conn }
    }

    pub fn sessions(&self) -> impl SessionRepository + '_ {
        sessions::SqliteSessionRepository { conn: self.conn }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MIGRATIONS;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(MIGRATIONS).expect("migrations");
        conn
    }

    fn sample_post(id: &str, created_at: &str) -> PostRecord {
        PostRecord {
            id: id.into(),
            title: "First".into(),
            author: "alice".into(),
            kind: "article".into(),
            cover_image: None,
            tags: r#"["rust"]"#.into(),
            content: Some("Hello".into()),
            video_url: None,
            file_name: None,
            file_object_id: None,
            views: 0,
            created_at: created_at.into(),
            updated_at: None,
        }
    }

    #[test]
    fn post_repository_crud_and_counters() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        repos
            .posts()
            .create(&sample_post("post-1", "2024-01-01T00:00:00Z"))
            .unwrap();
        repos
            .posts()
            .create(&sample_post("post-2", "2024-02-01T00:00:00Z"))
            .unwrap();

        let listed = repos.posts().list_recent().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "post-2");

        assert_eq!(repos.posts().increment_views("post-1").unwrap(), 1);
        assert_eq!(repos.posts().increment_views("post-1").unwrap(), 2);
        assert_eq!(repos.posts().total_views().unwrap(), 2);

        let updated = repos
            .posts()
            .update_editable("post-1", "Renamed", Some("New body"), "2024-03-01T00:00:00Z")
            .unwrap();
        assert!(updated);
        let fetched = repos.posts().get("post-1").unwrap().unwrap();
        assert_eq!(fetched.title, "Renamed");
        assert_eq!(fetched.content.as_deref(), Some("New body"));
        assert!(fetched.updated_at.is_some());

        assert!(repos.posts().delete("post-1").unwrap());
        assert!(!repos.posts().delete("post-1").unwrap());
        assert_eq!(repos.posts().count().unwrap(), 1);
    }

    #[test]
    fn comment_rows_keep_creation_order() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos
            .posts()
            .create(&sample_post("post-1", "2024-01-01T00:00:00Z"))
            .unwrap();

        for (id, at) in [
            ("c-2", "2024-01-01T10:00:00Z"),
            ("c-1", "2024-01-01T09:00:00Z"),
        ] {
            repos
                .comments()
                .create(&CommentRecord {
                    id: id.into(),
                    post_id: "post-1".into(),
                    parent_id: None,
                    author: "bob".into(),
                    body: "hi".into(),
                    created_at: at.into(),
                    likes: 0,
                })
                .unwrap();
        }

        let listed = repos.comments().list_for_post("post-1").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "c-1");
        assert_eq!(repos.comments().count().unwrap(), 2);
    }

    #[test]
    fn like_rows_are_unique_per_user() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos
            .posts()
            .create(&sample_post("post-1", "2024-01-01T00:00:00Z"))
            .unwrap();

        let like = LikeRecord {
            post_id: "post-1".into(),
            user_key: "carol".into(),
            created_at: "2024-01-02T00:00:00Z".into(),
        };
        repos.likes().insert(&like).unwrap();
        assert!(repos.likes().exists("post-1", "carol").unwrap());
        // Repeated insert must not create a second row.
        repos.likes().insert(&like).unwrap();
        assert_eq!(repos.likes().count_for_post("post-1").unwrap(), 1);

        repos.likes().remove("post-1", "carol").unwrap();
        assert!(!repos.likes().exists("post-1", "carol").unwrap());
        assert_eq!(repos.likes().count_for_post("post-1").unwrap(), 0);
        assert!(repos.likes().counts_by_post().unwrap().is_empty());
    }

    #[test]
    fn deleting_a_post_cascades_to_comments_and_likes() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);
        repos
            .posts()
            .create(&sample_post("post-1", "2024-01-01T00:00:00Z"))
            .unwrap();
        repos
            .comments()
            .create(&CommentRecord {
                id: "c-1".into(),
                post_id: "post-1".into(),
                parent_id: None,
                author: "bob".into(),
                body: "hi".into(),
                created_at: "2024-01-01T01:00:00Z".into(),
                likes: 0,
            })
            .unwrap();
        repos
            .likes()
            .insert(&LikeRecord {
                post_id: "post-1".into(),
                user_key: "carol".into(),
                created_at: "2024-01-01T02:00:00Z".into(),
            })
            .unwrap();

        repos.posts().delete("post-1").unwrap();
        assert_eq!(repos.comments().count().unwrap(), 0);
        assert_eq!(repos.likes().count_for_post("post-1").unwrap(), 0);
    }

    #[test]
    fn session_repository_expiry() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        repos
            .sessions()
            .insert(&SessionRecord {
                token: "tok-1".into(),
                email: "admin@glassblog.local".into(),
                created_at: "2024-01-01T00:00:00Z".into(),
                expires_at: "2024-01-02T00:00:00Z".into(),
            })
            .unwrap();
        assert!(repos.sessions().get("tok-1").unwrap().is_some());

        let removed = repos
            .sessions()
            .delete_expired("2024-06-01T00:00:00Z")
            .unwrap();
        assert_eq!(removed, 1);
        assert!(repos.sessions().get("tok-1").unwrap().is_none());
    }
}
