use crate::database::models::LikeRecord;
use anyhow::Result;
use rusqlite::{params, Connection};
use std::collections::HashMap;

pub(super) struct SqliteLikeRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::LikeRepository for SqliteLikeRepository<'conn> {
    fn insert(&self, record: &LikeRecord) -> Result<()> {
        // The primary key makes a racing double-insert collapse to one row.
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO post_likes (post_id, user_key, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![record.post_id, record.user_key, record.created_at],
        )?;
        Ok(())
    }

    fn remove(&self, post_id: &str, user_key: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM post_likes WHERE post_id = ?1 AND user_key = ?2",
            params![post_id, user_key],
        )?;
        Ok(())
    }

    fn exists(&self, post_id: &str, user_key: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1 AND user_key = ?2",
            params![post_id, user_key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn count_for_post(&self, post_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?)
    }

    fn counts_by_post(&self) -> Result<HashMap<String, i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT post_id, COUNT(*) FROM post_likes GROUP BY post_id")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        let mut counts = HashMap::new();
        for row in rows {
            let (post_id, count) = row?;
            counts.insert(post_id, count);
        }
        Ok(counts)
    }
}
