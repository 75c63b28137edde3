use crate::database::models::SessionRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteSessionRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::SessionRepository for SqliteSessionRepository<'conn> {
    fn insert(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO admin_sessions (token, email, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                record.token,
                record.email,
                record.created_at,
                record.expires_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, token: &str) -> Result<Option<SessionRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT token, email, created_at, expires_at
                FROM admin_sessions
                WHERE token = ?1
                "#,
                params![token],
                |row| {
                    Ok(SessionRecord {
                        token: row.get(0)?,
                        email: row.get(1)?,
                        created_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    fn delete(&self, token: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM admin_sessions WHERE token = ?1",
            params![token],
        )?;
        Ok(())
    }

    fn delete_expired(&self, now: &str) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM admin_sessions WHERE datetime(expires_at) <= datetime(?1)",
            params![now],
        )?;
        Ok(removed)
    }
}
