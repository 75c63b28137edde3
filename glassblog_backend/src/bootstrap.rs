use crate::config::GlassblogConfig;
use crate::database::Database;
use anyhow::{Context, Result};
use std::fs;

/// Everything a running process needs, prepared once at startup.
#[derive(Clone)]
pub struct BootstrapResources {
    pub config: GlassblogConfig,
    pub database: Database,
}

pub fn initialize(config: GlassblogConfig) -> Result<BootstrapResources> {
    let paths = &config.paths;
    for dir in [
        &paths.data_dir,
        &paths.files_dir,
        &paths.covers_dir,
        &paths.videos_dir,
        &paths.docs_dir,
        &paths.logs_dir,
    ] {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }

    let database = Database::connect(paths)?;
    let fresh = database.ensure_migrations()?;
    if fresh {
        tracing::info!(db = %paths.db_path.display(), "created new database");
    } else {
        tracing::debug!(db = %paths.db_path.display(), "opened existing database");
    }

    Ok(BootstrapResources { config, database })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdminConfig, GlassblogPaths};
    use tempfile::tempdir;

    #[test]
    fn initialize_creates_directories_and_database() {
        let temp = tempdir().expect("tempdir");
        let paths = GlassblogPaths::from_base_dir(temp.path()).expect("paths");
        let admin = AdminConfig::with_password("admin@glassblog.local", "pw").expect("admin");
        let config = GlassblogConfig::new(0, paths.clone(), admin);

        let resources = initialize(config).expect("bootstrap");
        assert!(paths.covers_dir.exists());
        assert!(paths.videos_dir.exists());
        assert!(paths.docs_dir.exists());
        assert!(paths.db_path.exists());

        // Connecting a second time reuses the schema.
        drop(resources);
        let config = GlassblogConfig::new(
            0,
            paths,
            AdminConfig::with_password("admin@glassblog.local", "pw").expect("admin"),
        );
        initialize(config).expect("re-bootstrap");
    }
}
