use crate::posts::{PostKind, PostView};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Reader-facing feed filter. `Popular` is special cased: it ignores post
/// kind entirely and forces a most-liked ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedFilter {
    #[default]
    All,
    Kind(PostKind),
    Popular,
}

impl FromStr for FeedFilter {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "" | "all" => Ok(FeedFilter::All),
            "popular" => Ok(FeedFilter::Popular),
            other => Ok(FeedFilter::Kind(PostKind::from_str(other)?)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    Popular,
}

impl FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "" | "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            "popular" => Ok(SortMode::Popular),
            other => anyhow::bail!("unknown sort mode '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub filter: FeedFilter,
    pub search: String,
    pub sort: SortMode,
    pub page_size: usize,
    pub pages: usize,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            filter: FeedFilter::All,
            search: String::new(),
            sort: SortMode::Newest,
            page_size: 6,
            pages: 1,
        }
    }
}

impl FeedQuery {
    /// The ordering actually applied: a popular filter overrides whatever
    /// sort the reader picked.
    pub fn effective_sort(&self) -> SortMode {
        if self.filter == FeedFilter::Popular {
            SortMode::Popular
        } else {
            self.sort
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<PostView>,
    pub total_matching: usize,
    pub has_more: bool,
    pub sort: SortMode,
}

/// Runs the whole pipeline over an already-loaded post list: filter, then
/// case-insensitive substring search over title, author, and tags, then a
/// stable sort, then the grow-only window of `page_size * pages` items.
pub fn visible_window(posts: Vec<PostView>, query: &FeedQuery) -> FeedPage {
    let mut matching: Vec<PostView> = posts
        .into_iter()
        .filter(|post| match query.filter {
            FeedFilter::All | FeedFilter::Popular => true,
            FeedFilter::Kind(kind) => post.kind == kind,
        })
        .filter(|post| matches_search(post, &query.search))
        .collect();

    match query.effective_sort() {
        SortMode::Newest => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::Oldest => matching.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortMode::Popular => matching.sort_by(|a, b| b.likes.cmp(&a.likes)),
    }

    let total_matching = matching.len();
    let window = query.page_size.saturating_mul(query.pages.max(1));
    matching.truncate(window);
    FeedPage {
        has_more: total_matching > matching.len(),
        total_matching,
        items: matching,
        sort: query.effective_sort(),
    }
}

fn matches_search(post: &PostView, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    post.title.to_lowercase().contains(&needle)
        || post.author.to_lowercase().contains(&needle)
        || post
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::PostContent;

    fn post(id: &str, kind: PostKind, created_at: &str, likes: i64) -> PostView {
        PostView {
            id: id.into(),
            title: format!("Post {id}"),
            author: "alice".into(),
            kind,
            cover_image: String::new(),
            tags: Vec::new(),
            content: PostContent::Article { body: String::new() },
            views: 0,
            likes,
            created_at: created_at.into(),
            updated_at: None,
        }
    }

    #[test]
    fn popular_filter_ignores_kind_and_sorts_by_likes() {
        let posts = vec![
            post("1", PostKind::Article, "2024-01-03T00:00:00Z", 2),
            post("2", PostKind::Vlog, "2024-01-02T00:00:00Z", 5),
            post("3", PostKind::Docs, "2024-01-01T00:00:00Z", 0),
        ];
        let query = FeedQuery {
            filter: FeedFilter::Popular,
            sort: SortMode::Oldest,
            ..FeedQuery::default()
        };
        let page = visible_window(posts, &query);
        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert_eq!(page.sort, SortMode::Popular);
    }

    #[test]
    fn kind_filter_keeps_only_that_kind() {
        let posts = vec![
            post("1", PostKind::Article, "2024-01-01T00:00:00Z", 0),
            post("2", PostKind::Vlog, "2024-01-02T00:00:00Z", 0),
        ];
        let query = FeedQuery {
            filter: FeedFilter::Kind(PostKind::Article),
            ..FeedQuery::default()
        };
        let page = visible_window(posts, &query);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "1");
    }

    #[test]
    fn search_is_case_insensitive_over_title_author_and_tags() {
        let mut tagged = post("1", PostKind::Article, "2024-01-01T00:00:00Z", 0);
        tagged.title = "All about dogs".into();
        tagged.tags = vec!["Category".into()];
        let mut other = post("2", PostKind::Article, "2024-01-02T00:00:00Z", 0);
        other.title = "My cat diary".into();

        let query = FeedQuery {
            search: "cat".into(),
            ..FeedQuery::default()
        };
        let page = visible_window(vec![tagged.clone(), other.clone()], &query);
        // "cat" hits the "Category" tag as well as the cat title.
        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);

        // Case folding applies to the whole needle, spaces included.
        let query = FeedQuery {
            search: "CAT DIARY".into(),
            ..FeedQuery::default()
        };
        let page = visible_window(vec![tagged.clone(), other.clone()], &query);
        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);

        let query = FeedQuery {
            search: "catx".into(),
            ..FeedQuery::default()
        };
        let page = visible_window(vec![tagged, other], &query);
        assert!(page.items.is_empty());
    }

    #[test]
    fn window_grows_by_page_size_per_page() {
        let posts: Vec<PostView> = (0..12)
            .map(|i| {
                post(
                    &i.to_string(),
                    PostKind::Article,
                    &format!("2024-01-{:02}T00:00:00Z", i + 1),
                    0,
                )
            })
            .collect();

        let mut query = FeedQuery {
            page_size: 5,
            pages: 1,
            ..FeedQuery::default()
        };
        let page = visible_window(posts.clone(), &query);
        assert_eq!(page.items.len(), 5);
        assert!(page.has_more);

        query.pages = 2;
        let page = visible_window(posts.clone(), &query);
        assert_eq!(page.items.len(), 10);
        assert!(page.has_more);

        query.pages = 3;
        let page = visible_window(posts, &query);
        assert_eq!(page.items.len(), 12);
        assert!(!page.has_more);
        assert_eq!(page.total_matching, 12);
    }

    #[test]
    fn newest_is_the_default_ordering() {
        let posts = vec![
            post("old", PostKind::Article, "2024-01-01T00:00:00Z", 9),
            post("new", PostKind::Article, "2024-01-02T00:00:00Z", 0),
        ];
        let page = visible_window(posts, &FeedQuery::default());
        assert_eq!(page.items[0].id, "new");
    }
}
