use crate::config::{GlassblogPaths, StorageConfig};
use crate::database::models::ObjectRecord;
use crate::database::repositories::ObjectRepository;
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::{anyhow, Context, Result};
use blake3::Hasher;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use uuid::Uuid;

/// The two kinds of uploads a post can carry plus the docs payload bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Covers,
    Videos,
    Docs,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Covers => "covers",
            Bucket::Videos => "videos",
            Bucket::Docs => "docs",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "covers" => Ok(Bucket::Covers),
            "videos" => Ok(Bucket::Videos),
            "docs" => Ok(Bucket::Docs),
            other => anyhow::bail!("unknown bucket '{other}'"),
        }
    }
}

#[derive(Clone)]
pub struct ObjectStore {
    database: Database,
    paths: GlassblogPaths,
    config: StorageConfig,
}

impl ObjectStore {
    pub fn new(database: Database, paths: GlassblogPaths, config: StorageConfig) -> Self {
        Self {
            database,
            paths,
            config,
        }
    }

    pub async fn put(&self, input: SaveObjectInput) -> Result<ObjectView> {
        if input.data.is_empty() {
            return Err(anyhow!("object data may not be empty"));
        }
        if input.data.len() as u64 > self.config.max_upload_bytes {
            return Err(anyhow!(
                "upload exceeds the {} byte limit",
                self.config.max_upload_bytes
            ));
        }

        let object_id = Uuid::new_v4().to_string();
        let original_name = input.original_name.as_deref().map(sanitize_filename);
        let stored_name = stored_object_name(original_name.as_deref());

        let bucket_dir = self.paths.bucket_dir(input.bucket.as_str());
        fs::create_dir_all(&bucket_dir)
            .await
            .with_context(|| format!("failed to create bucket directory {}", bucket_dir.display()))?;
        let absolute_path = bucket_dir.join(&stored_name);
        fs::write(&absolute_path, &input.data)
            .await
            .with_context(|| format!("failed to write object to {}", absolute_path.display()))?;

        let mut hasher = Hasher::new();
        hasher.update(&input.data);
        let checksum = format!("blake3:{}", hasher.finalize().to_hex());

        // Trust the declared type when present, sniff the bytes when not.
        let mime = input
            .mime
            .filter(|m| !m.trim().is_empty())
            .or_else(|| infer::get(&input.data).map(|kind| kind.mime_type().to_string()));

        let record = ObjectRecord {
            id: object_id,
            bucket: input.bucket.as_str().to_string(),
            stored_name,
            original_name,
            mime,
            size_bytes: input.data.len() as i64,
            checksum,
            created_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.objects().insert(&record))?;
        tracing::debug!(object_id = %record.id, bucket = %record.bucket, size = record.size_bytes, "stored object");
        Ok(ObjectView::from_record(record))
    }

    pub async fn prepare_download(&self, id: &str) -> Result<Option<ObjectDownload>> {
        let record = self
            .database
            .with_repositories(|repos| repos.objects().get(id))?;
        let Some(record) = record else {
            return Ok(None);
        };
        let bucket = Bucket::from_str(&record.bucket)?;
        let absolute_path = self
            .paths
            .bucket_dir(bucket.as_str())
            .join(&record.stored_name);
        if fs::metadata(&absolute_path).await.is_err() {
            tracing::warn!(path = %absolute_path.display(), "object missing on disk");
            return Ok(None);
        }
        Ok(Some(ObjectDownload {
            metadata: ObjectView::from_record(record),
            absolute_path,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct SaveObjectInput {
    pub bucket: Bucket,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectView {
    pub id: String,
    pub bucket: String,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub checksum: String,
    pub url: String,
}

impl ObjectView {
    fn from_record(record: ObjectRecord) -> Self {
        Self {
            url: format!("/objects/{}", record.id),
            id: record.id,
            bucket: record.bucket,
            original_name: record.original_name,
            mime: record.mime,
            size_bytes: record.size_bytes,
            checksum: record.checksum,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectDownload {
    pub metadata: ObjectView,
    pub absolute_path: PathBuf,
}

/// Disk names are `<millis>_<random>.<ext>` so repeated uploads of the same
/// file never collide.
fn stored_object_name(original_name: Option<&str>) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    match original_name
        .and_then(|name| Path::new(name).extension().and_then(|ext| ext.to_str()))
    {
        Some(ext) if !ext.is_empty() => format!("{millis}_{suffix}.{ext}"),
        _ => format!("{millis}_{suffix}"),
    }
}

fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|file| file.to_str())
        .unwrap_or("upload")
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlassblogPaths;
    use rusqlite::Connection;
    use tempfile::tempdir;
    use tokio::runtime::Runtime;

    fn setup(temp: &Path) -> ObjectStore {
        let paths = GlassblogPaths::from_base_dir(temp).expect("paths");
        let conn = Connection::open_in_memory().expect("db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        ObjectStore::new(db, paths, StorageConfig::default())
    }

    #[test]
    fn put_and_download_round_trip() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempdir().expect("tempdir");
            let store = setup(temp.path());

            let stored = store
                .put(SaveObjectInput {
                    bucket: Bucket::Docs,
                    original_name: Some("manual.pdf".into()),
                    mime: Some("application/pdf".into()),
                    data: b"hello".to_vec(),
                })
                .await
                .expect("put");
            assert_eq!(stored.bucket, "docs");
            assert_eq!(stored.original_name.as_deref(), Some("manual.pdf"));
            assert_eq!(stored.size_bytes, 5);
            assert!(stored.checksum.starts_with("blake3:"));
            assert_eq!(stored.url, format!("/objects/{}", stored.id));

            let download = store
                .prepare_download(&stored.id)
                .await
                .expect("prepare")
                .expect("exists");
            assert!(download.absolute_path.exists());
            assert!(download
                .absolute_path
                .to_string_lossy()
                .ends_with(".pdf"));

            assert!(store.prepare_download("missing").await.unwrap().is_none());
        });
    }

    #[test]
    fn put_enforces_the_size_cap_and_rejects_empty_data() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempdir().expect("tempdir");
            let paths = GlassblogPaths::from_base_dir(temp.path()).expect("paths");
            let conn = Connection::open_in_memory().expect("db");
            let db = Database::from_connection(conn, true);
            db.ensure_migrations().expect("migrations");
            let store = ObjectStore::new(
                db,
                paths,
                StorageConfig {
                    max_upload_bytes: 4,
                },
            );

            assert!(store
                .put(SaveObjectInput {
                    bucket: Bucket::Covers,
                    original_name: None,
                    mime: None,
                    data: Vec::new(),
                })
                .await
                .is_err());
            assert!(store
                .put(SaveObjectInput {
                    bucket: Bucket::Covers,
                    original_name: None,
                    mime: None,
                    data: b"too big".to_vec(),
                })
                .await
                .is_err());
        });
    }

    #[test]
    fn stored_names_keep_the_extension_and_never_collide() {
        let a = stored_object_name(Some("video.mp4"));
        let b = stored_object_name(Some("video.mp4"));
        assert!(a.ends_with(".mp4"));
        assert_ne!(a, b);
        assert!(!stored_object_name(None).contains('.'));
    }
}
