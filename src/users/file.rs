//! User repository persisted as a single JSON document
//!
//! Every mutation rewrites the whole document through a temporary file and a
//! rename, so readers never observe a half-written file. Mutations are serialized
//! by an async mutex held across the read-modify-write cycle.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::UserTable;
use crate::authentication::traits::UserRepository;
use crate::models::{User, UserUpsert};

#[derive(Debug)]
pub struct JsonFileUserRepository {
    path: PathBuf,
    owner_open_id: Option<String>,
    lock: Mutex<()>,
}

impl JsonFileUserRepository {
    /// Open a repository at `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, owner_open_id: Option<String>) -> Self {
        Self {
            path: path.into(),
            owner_open_id: owner_open_id.filter(|o| !o.is_empty()),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<UserTable> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt user store at {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UserTable::default()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read user store at {}", self.path.display())),
        }
    }

    async fn save(&self, table: &UserTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(table)?;
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for JsonFileUserRepository {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.find_by_open_id(open_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.find_by_email(email).cloned())
    }

    async fn upsert(&self, fields: UserUpsert) -> Result<User> {
        let _guard = self.lock.lock().await;
        let mut table = self.load().await?;
        let user = table.upsert(fields, self.owner_open_id.as_deref(), Utc::now())?;
        self.save(&table).await?;
        log::debug!("Stored user {} in {}", user.open_id, self.path.display());
        Ok(user)
    }

    async fn touch_last_signed_in(&self, open_id: &str, at: DateTime<Utc>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut table = self.load().await?;
        table.touch(open_id, at)?;
        self.save(&table).await
    }
}
