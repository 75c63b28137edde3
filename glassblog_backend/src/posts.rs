use crate::database::models::PostRecord;
use crate::database::repositories::{CommentRepository, LikeRepository, PostRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Article,
    Vlog,
    Docs,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Article => "article",
            PostKind::Vlog => "vlog",
            PostKind::Docs => "docs",
        }
    }

    /// Cover shown when the admin supplies neither an upload nor a URL.
    pub fn default_cover(&self) -> &'static str {
        match self {
            PostKind::Article => {
                "https://images.unsplash.com/photo-1499750310107-5fef28a66643?w=800"
            }
            PostKind::Vlog => "https://images.unsplash.com/photo-1574717024653-61fd2cf4d44d?w=800",
            PostKind::Docs => "https://images.unsplash.com/photo-1569336415962-a4bd9f69cdc5?w=800",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "article" => Ok(PostKind::Article),
            "vlog" => Ok(PostKind::Vlog),
            "docs" => Ok(PostKind::Docs),
            other => anyhow::bail!("unknown post kind '{other}'"),
        }
    }
}

/// Exactly one variant per kind; populated at the record decode boundary so
/// the rest of the crate never sees half-filled content columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostContent {
    Article { body: String },
    Vlog { video_url: String },
    Docs { file_name: String, download_url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub author: String,
    pub kind: PostKind,
    pub cover_image: String,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub content: PostContent,
    pub views: i64,
    /// Derived from `post_likes`; never read from a stored counter.
    pub likes: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl PostView {
    pub fn from_record(record: PostRecord, likes: i64) -> Result<Self> {
        let kind = PostKind::from_str(&record.kind)
            .with_context(|| format!("post {} has a malformed kind column", record.id))?;
        let content = match kind {
            PostKind::Article => PostContent::Article {
                body: record.content.unwrap_or_default(),
            },
            PostKind::Vlog => PostContent::Vlog {
                video_url: record.video_url.unwrap_or_default(),
            },
            PostKind::Docs => PostContent::Docs {
                file_name: record.file_name.unwrap_or_default(),
                download_url: record
                    .file_object_id
                    .map(|id| format!("/objects/{id}"))
                    .unwrap_or_default(),
            },
        };
        let cover_image = record
            .cover_image
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| kind.default_cover().to_string());
        Ok(Self {
            id: record.id,
            title: record.title,
            author: record.author,
            kind,
            cover_image,
            tags: decode_tags(&record.tags),
            content,
            views: record.views,
            likes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn decode_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishPostInput {
    pub title: String,
    pub author: String,
    pub kind: PostKind,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_object_id: Option<String>,
}

impl PublishPostInput {
    /// Checks the fields every kind requires. Callers that store uploads
    /// before publishing use this to fail fast, so a rejected publish never
    /// leaves orphaned objects behind.
    pub fn validate_metadata(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            anyhow::bail!("title may not be empty");
        }
        if self.author.trim().is_empty() {
            anyhow::bail!("author may not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPostInput {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteStats {
    pub total_posts: i64,
    pub total_views: i64,
    pub total_comments: i64,
}

#[derive(Clone)]
pub struct PostService {
    database: Database,
    public_base_url: String,
}

impl PostService {
    pub fn new(database: Database, public_base_url: impl Into<String>) -> Self {
        Self {
            database,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn publish(&self, input: PublishPostInput) -> Result<PostView> {
        input.validate_metadata()?;

        let mut record = PostRecord {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            author: input.author,
            kind: input.kind.as_str().to_string(),
            cover_image: input
                .cover_image
                .filter(|url| !url.trim().is_empty())
                .or_else(|| Some(input.kind.default_cover().to_string())),
            tags: serde_json::to_string(&normalize_tags(input.tags))?,
            content: None,
            video_url: None,
            file_name: None,
            file_object_id: None,
            views: 0,
            created_at: now_utc_iso(),
            updated_at: None,
        };

        match input.kind {
            PostKind::Article => {
                let body = input.content.unwrap_or_default();
                if body.trim().is_empty() {
                    anyhow::bail!("content is required for articles");
                }
                record.content = Some(body);
            }
            PostKind::Vlog => {
                let url = input.video_url.unwrap_or_default();
                if url.trim().is_empty() {
                    anyhow::bail!("a video URL or uploaded video is required for vlogs");
                }
                record.video_url = Some(url);
            }
            PostKind::Docs => {
                let object_id = input.file_object_id.unwrap_or_default();
                if object_id.trim().is_empty() {
                    anyhow::bail!("an uploaded document is required for docs posts");
                }
                record.file_name = Some(
                    input
                        .file_name
                        .filter(|name| !name.trim().is_empty())
                        .unwrap_or_else(|| "document".to_string()),
                );
                record.file_object_id = Some(object_id);
            }
        }

        self.database
            .with_repositories(|repos| repos.posts().create(&record))?;
        tracing::info!(post_id = %record.id, kind = %record.kind, "published post");
        PostView::from_record(record, 0)
    }

    pub fn edit(&self, id: &str, input: EditPostInput) -> Result<Option<PostView>> {
        if input.title.trim().is_empty() {
            anyhow::bail!("title may not be empty");
        }
        let updated = self.database.with_repositories(|repos| {
            repos.posts().update_editable(
                id,
                &input.title,
                input.content.as_deref(),
                &now_utc_iso(),
            )
        })?;
        if !updated {
            return Ok(None);
        }
        self.get_post(id)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .database
            .with_repositories(|repos| repos.posts().delete(id))?;
        if removed {
            tracing::info!(post_id = %id, "deleted post");
        }
        Ok(removed)
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostView>> {
        self.database.with_repositories(|repos| {
            let Some(record) = repos.posts().get(id)? else {
                return Ok(None);
            };
            let likes = repos.likes().count_for_post(id)?;
            PostView::from_record(record, likes).map(Some)
        })
    }

    /// Fetch for the reader detail surface: bumps the view counter first so
    /// the returned view already carries the new count.
    pub fn open_post(&self, id: &str) -> Result<Option<PostView>> {
        self.database.with_repositories(|repos| {
            if repos.posts().get(id)?.is_none() {
                return Ok(None);
            }
            repos.posts().increment_views(id)?;
            let record = repos
                .posts()
                .get(id)?
                .context("post vanished while incrementing views")?;
            let likes = repos.likes().count_for_post(id)?;
            PostView::from_record(record, likes).map(Some)
        })
    }

    /// Every post, newest first, with derived like counts attached.
    pub fn list_posts(&self) -> Result<Vec<PostView>> {
        self.database.with_repositories(|repos| {
            let records = repos.posts().list_recent()?;
            let counts: HashMap<String, i64> = repos.likes().counts_by_post()?;
            let mut views = Vec::with_capacity(records.len());
            for record in records {
                let likes = counts.get(&record.id).copied().unwrap_or(0);
                views.push(PostView::from_record(record, likes)?);
            }
            Ok(views)
        })
    }

    pub fn stats(&self) -> Result<SiteStats> {
        self.database.with_repositories(|repos| {
            Ok(SiteStats {
                total_posts: repos.posts().count()?,
                total_views: repos.posts().total_views()?,
                total_comments: repos.comments().count()?,
            })
        })
    }

    pub fn share_url(&self, post_id: &str) -> String {
        format!("{}/?post={post_id}", self.public_base_url)
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
