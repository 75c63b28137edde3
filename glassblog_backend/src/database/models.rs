use serde::{Deserialize, Serialize};

/// Raw `posts` row. Which of the content columns is populated depends on
/// `kind`; decoding into a typed view happens in `crate::posts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub kind: String,
    pub cover_image: Option<String>,
    /// JSON array of tag strings.
    pub tags: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub file_name: Option<String>,
    pub file_object_id: Option<String>,
    pub views: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub author: String,
    pub body: String,
    pub created_at: String,
    /// Stored counter carried over from the original schema; surfaced
    /// read-only, there is no comment-like toggle.
    pub likes: i64,
}

/// Presence row: one per (post, user) pair that currently likes the post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRecord {
    pub post_id: String,
    pub user_key: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: String,
    pub bucket: String,
    pub stored_name: String,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub checksum: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub email: String,
    pub created_at: String,
    pub expires_at: String,
}
