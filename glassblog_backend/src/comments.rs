use crate::database::models::CommentRecord;
use crate::database::repositories::{CommentRepository, PostRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub author: String,
    pub body: String,
    pub created_at: String,
    pub likes: i64,
}

impl From<CommentRecord> for CommentView {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            parent_id: record.parent_id,
            author: record.author,
            body: record.body,
            created_at: record.created_at,
            likes: record.likes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentInput {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub body: String,
}

#[derive(Clone)]
pub struct CommentService {
    database: Database,
}

impl CommentService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn add_comment(&self, post_id: &str, input: AddCommentInput) -> Result<CommentView> {
        if input.body.trim().is_empty() {
            anyhow::bail!("comment body may not be empty");
        }
        let record = self.database.with_repositories(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                anyhow::bail!("post {post_id} not found");
            }
            let parent_id = match input.parent_id {
                Some(parent) if !parent.trim().is_empty() => {
                    if repos.comments().get(&parent)?.is_none() {
                        anyhow::bail!("parent comment {parent} not found");
                    }
                    Some(parent)
                }
                _ => None,
            };
            let record = CommentRecord {
                id: Uuid::new_v4().to_string(),
                post_id: post_id.to_string(),
                parent_id,
                author: input
                    .author
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "Anonymous".to_string()),
                body: input.body,
                created_at: now_utc_iso(),
                likes: 0,
            };
            repos.comments().create(&record)?;
            Ok(record)
        })?;
        tracing::debug!(post_id = %post_id, comment_id = %record.id, "added comment");
        Ok(record.into())
    }

    /// Oldest-first flat list for a post.
    pub fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentView>> {
        let records = self
            .database
            .with_repositories(|repos| repos.comments().list_for_post(post_id))?;
        Ok(records.into_iter().map(CommentView::from).collect())
    }

    /// Threaded view of a post's comments.
    pub fn tree_for_post(&self, post_id: &str) -> Result<Vec<CommentNode>> {
        Ok(build_tree(self.list_for_post(post_id)?))
    }
}

/// Assembles flat rows into a reply tree. Rows whose parent is missing,
/// self-referential, or part of a reference cycle are re-rooted at the top
/// level; every input row appears in the output exactly once, in input order
/// among its siblings.
pub fn build_tree(comments: Vec<CommentView>) -> Vec<CommentNode> {
    let known: HashSet<String> = comments.iter().map(|c| c.id.clone()).collect();
    let mut children: HashMap<String, Vec<CommentView>> = HashMap::new();
    let mut roots: Vec<CommentView> = Vec::new();
    let mut deferred: Vec<CommentView> = Vec::new();

    for comment in comments {
        match comment.parent_id.as_deref() {
            Some(parent) if parent != comment.id && known.contains(parent) => {
                children.entry(parent.to_string()).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut nodes = attach_replies(roots, &mut children, &mut visited);

    // Comments stranded in a parent cycle never hang off a reachable root;
    // surface them as top-level rather than dropping them.
    for (_, orphans) in children.drain() {
        for orphan in orphans {
            if !visited.contains(&orphan.id) {
                deferred.push(orphan);
            }
        }
    }
    deferred.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let mut leftover = HashMap::new();
    nodes.extend(attach_replies(deferred, &mut leftover, &mut visited));
    nodes
}

struct Frame {
    comment: CommentView,
    pending: std::vec::IntoIter<CommentView>,
    replies: Vec<CommentNode>,
}

// Explicit-stack traversal: depth is bounded by the input size, not the
// call stack, so pathological reply chains cannot overflow.
fn attach_replies(
    level: Vec<CommentView>,
    children: &mut HashMap<String, Vec<CommentView>>,
    visited: &mut HashSet<String>,
) -> Vec<CommentNode> {
    let mut out = Vec::with_capacity(level.len());
    for root in level {
        if !visited.insert(root.id.clone()) {
            continue;
        }
        let pending = children.remove(&root.id).unwrap_or_default().into_iter();
        let mut stack = vec![Frame {
            comment: root,
            pending,
            replies: Vec::new(),
        }];
        while let Some(top) = stack.last_mut() {
            if let Some(child) = top.pending.next() {
                if !visited.insert(child.id.clone()) {
                    continue;
                }
                let pending = children.remove(&child.id).unwrap_or_default().into_iter();
                stack.push(Frame {
                    comment: child,
                    pending,
                    replies: Vec::new(),
                });
            } else if let Some(frame) = stack.pop() {
                let node = CommentNode {
                    comment: frame.comment,
                    replies: frame.replies,
                };
                match stack.last_mut() {
                    Some(parent) => parent.replies.push(node),
                    None => out.push(node),
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::{PostKind, PostService, PublishPostInput};
    use rusqlite::Connection;

    fn setup() -> (CommentService, String) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        let posts = PostService::new(db.clone(), "http://localhost");
        let post = posts
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
        (CommentService::new(db), post.id)
    }

    fn view(id: &str, parent: Option<&str>, created_at: &str) -> CommentView {
        CommentView {
            id: id.into(),
            post_id: "p".into(),
            parent_id: parent.map(String::from),
            author: "a".into(),
            body: "b".into(),
            created_at: created_at.into(),
            likes: 0,
        }
    }

    #[test]
    fn add_comment_defaults_author_and_validates_parent() {
        let (service, post_id) = setup();
        let top = service
            .add_comment(
                &post_id,
                AddCommentInput {
                    author: Some("  ".into()),
                    parent_id: None,
                    body: "hello".into(),
                },
            )
            .expect("comment");
        assert_eq!(top.author, "Anonymous");

        let reply = service
            .add_comment(
                &post_id,
                AddCommentInput {
                    author: Some("bob".into()),
                    parent_id: Some(top.id.clone()),
                    body: "hi".into(),
                },
            )
            .expect("reply");
        assert_eq!(reply.parent_id.as_deref(), Some(top.id.as_str()));

        assert!(service
            .add_comment(
                &post_id,
                AddCommentInput {
                    author: None,
                    parent_id: Some("missing".into()),
                    body: "x".into(),
                },
            )
            .is_err());
        assert!(service
            .add_comment(
                &post_id,
                AddCommentInput {
                    author: None,
                    parent_id: None,
                    body: "   ".into(),
                },
            )
            .is_err());
    }

    #[test]
    fn tree_nests_replies_under_parents() {
        let flat = vec![
            view("1", None, "2024-01-01T00:00:00Z"),
            view("2", Some("1"), "2024-01-01T00:01:00Z"),
            view("3", Some("2"), "2024-01-01T00:02:00Z"),
            view("4", None, "2024-01-01T00:03:00Z"),
        ];
        let tree = build_tree(flat);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, "1");
        assert_eq!(tree[0].replies[0].comment.id, "2");
        assert_eq!(tree[0].replies[0].replies[0].comment.id, "3");
        assert_eq!(tree[1].comment.id, "4");
    }

    #[test]
    fn deep_reply_chains_do_not_overflow() {
        let flat: Vec<CommentView> = (0..5_000)
            .map(|i| {
                let parent = if i == 0 {
                    None
                } else {
                    Some((i - 1).to_string())
                };
                view(
                    &i.to_string(),
                    parent.as_deref(),
                    &format!("2024-01-01T00:00:{:02}Z", i % 60),
                )
            })
            .collect();
        let tree = build_tree(flat);
        assert_eq!(tree.len(), 1);
        let mut depth = 0usize;
        let mut cursor = &tree[0];
        while let Some(next) = cursor.replies.first() {
            depth += 1;
            cursor = next;
        }
        assert_eq!(depth, 4_999);
    }

    #[test]
    fn orphaned_parent_surfaces_at_top_level() {
        let flat = vec![
            view("1", Some("gone"), "2024-01-01T00:00:00Z"),
            view("2", None, "2024-01-01T00:01:00Z"),
        ];
        let tree = build_tree(flat);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, "1");
    }

    #[test]
    fn self_parent_and_cycles_lose_no_comments() {
        let flat = vec![
            view("1", Some("1"), "2024-01-01T00:00:00Z"),
            view("2", Some("3"), "2024-01-01T00:01:00Z"),
            view("3", Some("2"), "2024-01-01T00:02:00Z"),
        ];
        let tree = build_tree(flat);
        let mut seen: Vec<String> = Vec::new();
        let mut stack: Vec<&CommentNode> = tree.iter().collect();
        while let Some(node) = stack.pop() {
            seen.push(node.comment.id.clone());
            stack.extend(node.replies.iter());
        }
        seen.sort();
        assert_eq!(seen, vec!["1", "2", "3"]);
    }
}
