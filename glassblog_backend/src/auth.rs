use crate::config::AdminConfig;
use crate::database::models::SessionRecord;
use crate::database::repositories::SessionRepository;
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    pub token: String,
    pub email: String,
    pub expires_at: String,
}

#[derive(Clone)]
pub struct AdminAuth {
    database: Database,
    config: AdminConfig,
}

impl AdminAuth {
    pub fn new(database: Database, config: AdminConfig) -> Self {
        Self { database, config }
    }

    /// Verifies the admin credentials and mints a bearer token. A deployment
    /// without a configured password hash has no admin surface at all.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<AdminSession> {
        let Some(hash) = self.config.password_hash.as_deref() else {
            return Err(anyhow!("admin access is not configured"));
        };
        if !email.eq_ignore_ascii_case(&self.config.email) {
            return Err(anyhow!("invalid credentials"));
        }
        let matches = bcrypt::verify(password, hash)
            .map_err(|err| anyhow!("failed to verify password: {err}"))?;
        if !matches {
            return Err(anyhow!("invalid credentials"));
        }

        let record = SessionRecord {
            token: Uuid::new_v4().to_string(),
            email: self.config.email.clone(),
            created_at: now_utc_iso(),
            expires_at: (Utc::now() + Duration::hours(self.config.session_ttl_hours)).to_rfc3339(),
        };
        self.database.with_repositories(|repos| {
            let sessions = repos.sessions();
            sessions.delete_expired(&now_utc_iso())?;
            sessions.insert(&record)
        })?;
        tracing::info!(email = %record.email, "admin signed in");
        Ok(AdminSession {
            token: record.token,
            email: record.email,
            expires_at: record.expires_at,
        })
    }

    /// Resolves a bearer token to its live session, if any.
    pub fn check(&self, token: &str) -> Result<Option<AdminSession>> {
        if token.trim().is_empty() {
            return Ok(None);
        }
        self.database.with_repositories(|repos| {
            let Some(record) = repos.sessions().get(token)? else {
                return Ok(None);
            };
            let expires_at = DateTime::parse_from_rfc3339(&record.expires_at)
                .map_err(|err| anyhow!("malformed session expiry: {err}"))?;
            if expires_at <= Utc::now() {
                repos.sessions().delete(token)?;
                return Ok(None);
            }
            Ok(Some(AdminSession {
                token: record.token,
                email: record.email,
                expires_at: record.expires_at,
            }))
        })
    }

    pub fn sign_out(&self, token: &str) -> Result<()> {
        self.database
            .with_repositories(|repos| repos.sessions().delete(token))
    }
}
