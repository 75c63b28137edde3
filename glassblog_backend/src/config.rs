use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GlassblogConfig {
    pub api_port: u16,
    /// Base URL embedded in share links, e.g. `https://blog.example.com`.
    pub public_base_url: String,
    pub paths: GlassblogPaths,
    pub admin: AdminConfig,
    pub storage: StorageConfig,
}

impl GlassblogConfig {
    pub fn from_env() -> Result<Self> {
        let paths = GlassblogPaths::discover()?;
        let api_port = env::var("GLASSBLOG_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let public_base_url = env::var("GLASSBLOG_PUBLIC_URL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{api_port}"));
        let admin = AdminConfig::from_env()?;
        let storage = StorageConfig::from_env();
        Ok(Self {
            api_port,
            public_base_url,
            paths,
            admin,
            storage,
        })
    }

    pub fn new(api_port: u16, paths: GlassblogPaths, admin: AdminConfig) -> Self {
        Self {
            api_port,
            public_base_url: format!("http://localhost:{api_port}"),
            paths,
            admin,
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    /// Bcrypt hash of the admin password. `None` disables the admin surface.
    pub password_hash: Option<String>,
    pub session_ttl_hours: i64,
}

impl AdminConfig {
    pub fn from_env() -> Result<Self> {
        let email = env::var("GLASSBLOG_ADMIN_EMAIL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| "admin@glassblog.local".to_string());

        // Prefer a pre-computed hash; fall back to hashing a plaintext
        // password handed over the environment at startup.
        let password_hash = match env::var("GLASSBLOG_ADMIN_PASSWORD_HASH") {
            Ok(hash) if !hash.trim().is_empty() => Some(hash),
            _ => match env::var("GLASSBLOG_ADMIN_PASSWORD") {
                Ok(plain) if !plain.trim().is_empty() => Some(
                    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
                        .map_err(|err| anyhow!("failed to hash admin password: {err}"))?,
                ),
                _ => None,
            },
        };

        let session_ttl_hours = env::var("GLASSBLOG_SESSION_TTL_HOURS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(24);

        Ok(Self {
            email,
            password_hash,
            session_ttl_hours,
        })
    }

    pub fn with_password(email: &str, password: &str) -> Result<Self> {
        Ok(Self {
            email: email.to_string(),
            password_hash: Some(
                bcrypt::hash(password, bcrypt::DEFAULT_COST)
                    .map_err(|err| anyhow!("failed to hash admin password: {err}"))?,
            ),
            session_ttl_hours: 24,
        })
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // 10 MiB, the original admin console's document limit.
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let max_upload_bytes = env::var("GLASSBLOG_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or_else(|| Self::default().max_upload_bytes);
        Self { max_upload_bytes }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GlassblogPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub files_dir: PathBuf,
    pub covers_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl GlassblogPaths {
    pub fn discover() -> Result<Self> {
        let base = match env::var("GLASSBLOG_DATA_DIR") {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw),
            _ => {
                let exe_path = std::env::current_exe()
                    .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
                exe_path
                    .parent()
                    .ok_or_else(|| anyhow!("executable path missing parent"))?
                    .to_path_buf()
            }
        };
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("glassblog.db");
        let files_dir = base.join("files");
        let covers_dir = files_dir.join("covers");
        let videos_dir = files_dir.join("videos");
        let docs_dir = files_dir.join("docs");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            db_path,
            files_dir,
            covers_dir,
            videos_dir,
            docs_dir,
            logs_dir,
        })
    }

    pub fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.files_dir.join(bucket)
    }
}
