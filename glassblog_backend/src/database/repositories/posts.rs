use crate::database::models::PostRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const POST_COLUMNS: &str = "id, title, author, kind, cover_image, tags, content, \
     video_url, file_name, file_object_id, views, created_at, updated_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        kind: row.get(3)?,
        cover_image: row.get(4)?,
        tags: row.get(5)?,
        content: row.get(6)?,
        video_url: row.get(7)?,
        file_name: row.get(8)?,
        file_object_id: row.get(9)?,
        views: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, title, author, kind, cover_image, tags, content,
                               video_url, file_name, file_object_id, views, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.id,
                record.title,
                record.author,
                record.kind,
                record.cover_image,
                record.tags,
                record.content,
                record.video_url,
                record.file_name,
                record.file_object_id,
                record.views,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                record_from_row,
            )
            .optional()?)
    }

    fn list_recent(&self) -> Result<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY datetime(created_at) DESC"
        ))?;
        let rows = stmt.query_map([], record_from_row)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn update_editable(
        &self,
        id: &str,
        title: &str,
        content: Option<&str>,
        updated_at: &str,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE posts
            SET title = ?2, content = COALESCE(?3, content), updated_at = ?4
            WHERE id = ?1
            "#,
            params![id, title, content, updated_at],
        )?;
        Ok(changed > 0)
    }

    fn increment_views(&self, id: &str) -> Result<i64> {
        self.conn.execute(
            "UPDATE posts SET views = views + 1 WHERE id = ?1",
            params![id],
        )?;
        let views = self.conn.query_row(
            "SELECT views FROM posts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(views)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?)
    }

    fn total_views(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COALESCE(SUM(views), 0) FROM posts", [], |row| {
                row.get(0)
            })?)
    }
}
