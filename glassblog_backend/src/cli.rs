use crate::api;
use crate::comments::CommentService;
use crate::config::GlassblogConfig;
use crate::database::Database;
use crate::feed::{self, FeedFilter, FeedQuery};
use crate::posts::{EditPostInput, PostContent, PostKind, PostService, PublishPostInput};
use anyhow::Result;
use shell_words;
use std::io::{self, Write};
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run the HTTP server mode (the default behaviour).
pub async fn run_server(config: GlassblogConfig, database: Database) -> Result<()> {
    tracing::info!(port = config.api_port, "starting GlassBlog HTTP server");
    api::serve_http(config, database).await
}

/// Run the interactive console used for managing posts without the HTTP API.
pub async fn run_admin(config: GlassblogConfig, database: Database) -> Result<()> {
    let post_service = PostService::new(database.clone(), config.public_base_url.clone());
    let comment_service = CommentService::new(database.clone());

    let mut session = CliSession {
        post_service,
        comment_service,
        author: "Admin".to_string(),
    };

    println!("GlassBlog admin console ready. Type 'help' for a list of commands.");

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        print!("glassblog> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            println!("Exiting");
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens = match shell_words::split(trimmed) {
            Ok(tokens) if !tokens.is_empty() => tokens,
            Ok(_) => continue,
            Err(err) => {
                println!("Unable to parse command: {err}");
                continue;
            }
        };

        match session.handle_command(&tokens) {
            Ok(LoopAction::Continue) => {}
            Ok(LoopAction::Exit) => break,
            Err(err) => {
                println!("Error: {err:#}");
            }
        }
    }

    Ok(())
}

struct CliSession {
    post_service: PostService,
    comment_service: CommentService,
    author: String,
}

enum LoopAction {
    Continue,
    Exit,
}

impl CliSession {
    fn handle_command(&mut self, tokens: &[String]) -> Result<LoopAction> {
        let command = tokens[0].as_str();
        match command {
            "help" => {
                self.print_help();
                Ok(LoopAction::Continue)
            }
            "stats" => {
                self.print_stats()?;
                Ok(LoopAction::Continue)
            }
            "list" | "posts" => {
                let filter = tokens
                    .get(1)
                    .map(|raw| FeedFilter::from_str(raw))
                    .transpose()?
                    .unwrap_or_default();
                self.list_posts(filter)?;
                Ok(LoopAction::Continue)
            }
            "view" | "post" => {
                if tokens.len() < 2 {
                    println!("Usage: view <post_id>");
                    return Ok(LoopAction::Continue);
                }
                self.view_post(&tokens[1])?;
                Ok(LoopAction::Continue)
            }
            "author" => {
                if tokens.len() < 2 {
                    println!("Current author: {}", self.author);
                    return Ok(LoopAction::Continue);
                }
                self.author = tokens[1..].join(" ");
                println!("Author set to {}", self.author);
                Ok(LoopAction::Continue)
            }
            "publish-article" => {
                if tokens.len() < 3 {
                    println!("Usage: publish-article \"title\" \"body\" [tag ...]");
                    return Ok(LoopAction::Continue);
                }
                self.publish(
                    PostKind::Article,
                    tokens[1].clone(),
                    tokens[2].clone(),
                    tokens[3..].to_vec(),
                )?;
                Ok(LoopAction::Continue)
            }
            "publish-vlog" => {
                if tokens.len() < 3 {
                    println!("Usage: publish-vlog \"title\" <video_url> [tag ...]");
                    return Ok(LoopAction::Continue);
                }
                self.publish(
                    PostKind::Vlog,
                    tokens[1].clone(),
                    tokens[2].clone(),
                    tokens[3..].to_vec(),
                )?;
                Ok(LoopAction::Continue)
            }
            "edit" => {
                if tokens.len() < 3 {
                    println!("Usage: edit <post_id> \"title\" [\"body\"]");
                    return Ok(LoopAction::Continue);
                }
                self.edit_post(&tokens[1], tokens[2].clone(), tokens.get(3).cloned())?;
                Ok(LoopAction::Continue)
            }
            "delete" => {
                if tokens.len() < 2 {
                    println!("Usage: delete <post_id>");
                    return Ok(LoopAction::Continue);
                }
                if self.post_service.delete(&tokens[1])? {
                    println!("Deleted post {}", tokens[1]);
                } else {
                    println!("Post {} not found", tokens[1]);
                }
                Ok(LoopAction::Continue)
            }
            "quit" | "exit" => Ok(LoopAction::Exit),
            "clear" => {
                print!("\x1B[2J\x1B[1;1H");
                Ok(LoopAction::Continue)
            }
            other => {
                println!("Unknown command '{other}'. Type 'help' for a list of commands.");
                Ok(LoopAction::Continue)
            }
        }
    }

    fn print_help(&self) {
        println!("Available commands:");
        println!("  help                        Show this help message");
        println!("  stats                       Show site totals");
        println!("  list [filter]               List posts (all, article, vlog, docs, popular)");
        println!("  view <post_id>              Display a post and its comments");
        println!("  author [NAME]               Show or set the author used for new posts");
        println!("  publish-article TITLE BODY [TAGS]  Publish an article");
        println!("  publish-vlog TITLE URL [TAGS]      Publish a vlog");
        println!("  edit <post_id> TITLE [BODY] Update a post's title and body");
        println!("  delete <post_id>            Remove a post and its comments");
        println!("  clear                       Clear the screen");
        println!("  exit                        Quit the console");
    }

    fn print_stats(&self) -> Result<()> {
        let stats = self.post_service.stats()?;
        println!("Posts: {}", stats.total_posts);
        println!("Views: {}", stats.total_views);
        println!("Comments: {}", stats.total_comments);
        Ok(())
    }

    fn list_posts(&self, filter: FeedFilter) -> Result<()> {
        let posts = self.post_service.list_posts()?;
        let query = FeedQuery {
            filter,
            page_size: usize::MAX,
            ..FeedQuery::default()
        };
        let page = feed::visible_window(posts, &query);
        if page.items.is_empty() {
            println!("No posts yet. Use 'publish-article' to create one.");
            return Ok(());
        }
        println!("Posts:");
        for post in page.items {
            println!(
                "  [{}] {} ({}, views: {}, likes: {})",
                post.id, post.title, post.kind, post.views, post.likes
            );
        }
        Ok(())
    }

    fn view_post(&self, post_id: &str) -> Result<()> {
        let Some(post) = self.post_service.get_post(post_id)? else {
            println!("Post {post_id} not found");
            return Ok(());
        };

        println!("{} ({})", post.title, post.kind);
        println!("By {} at {}", post.author, post.created_at);
        if !post.tags.is_empty() {
            println!("Tags: {}", post.tags.join(", "));
        }
        println!("Views: {}  Likes: {}", post.views, post.likes);
        match &post.content {
            PostContent::Article { body } => println!("\n{body}"),
            PostContent::Vlog { video_url } => println!("Video: {video_url}"),
            PostContent::Docs {
                file_name,
                download_url,
            } => println!("File: {file_name} ({download_url})"),
        }
        println!("Share: {}", self.post_service.share_url(post_id));

        let comments = self.comment_service.tree_for_post(post_id)?;
        if comments.is_empty() {
            println!("\n(no comments yet)");
        } else {
            println!("\nComments:");
            for node in &comments {
                print_comment(node, 1);
            }
        }
        Ok(())
    }

    fn publish(
        &self,
        kind: PostKind,
        title: String,
        payload: String,
        tags: Vec<String>,
    ) -> Result<()> {
        let mut input = PublishPostInput {
            title,
            author: self.author.clone(),
            kind,
            cover_image: None,
            tags,
            content: None,
            video_url: None,
            file_name: None,
            file_object_id: None,
        };
        match kind {
            PostKind::Article => input.content = Some(payload),
            PostKind::Vlog => input.video_url = Some(payload),
            PostKind::Docs => anyhow::bail!("docs posts need the HTTP admin surface for uploads"),
        }
        let post = self.post_service.publish(input)?;
        println!("Published post {}", post.id);
        Ok(())
    }

    fn edit_post(&self, post_id: &str, title: String, body: Option<String>) -> Result<()> {
        match self.post_service.edit(
            post_id,
            EditPostInput {
                title,
                content: body,
            },
        )? {
            Some(post) => println!("Updated post {}", post.id),
            None => println!("Post {post_id} not found"),
        }
        Ok(())
    }
}

fn print_comment(node: &crate::comments::CommentNode, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}{} at {}: {}",
        node.comment.author, node.comment.created_at, node.comment.body
    );
    for reply in &node.replies {
        print_comment(reply, depth + 1);
    }
}
