use crate::database::models::ObjectRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteObjectRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::ObjectRepository for SqliteObjectRepository<'conn> {
    fn insert(&self, record: &ObjectRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO objects (id, bucket, stored_name, original_name, mime,
                                 size_bytes, checksum, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.id,
                record.bucket,
                record.stored_name,
                record.original_name,
                record.mime,
                record.size_bytes,
                record.checksum,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ObjectRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, bucket, stored_name, original_name, mime, size_bytes, checksum, created_at
                FROM objects
                WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(ObjectRecord {
                        id: row.get(0)?,
                        bucket: row.get(1)?,
                        stored_name: row.get(2)?,
                        original_name: row.get(3)?,
                        mime: row.get(4)?,
                        size_bytes: row.get(5)?,
                        checksum: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                },
            )
            .optional()?)
    }
}
