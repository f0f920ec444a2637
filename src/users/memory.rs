use std::sync::{PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::UserTable;
use crate::authentication::traits::UserRepository;
use crate::models::{User, UserUpsert};

/// Process-local user repository
///
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
    owner_open_id: Option<String>,
}

impl InMemoryUserRepository {
    #[must_use]
    pub fn new(owner_open_id: Option<String>) -> Self {
        Self {
            table: RwLock::new(UserTable::default()),
            owner_open_id: owner_open_id.filter(|o| !o.is_empty()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.find_by_open_id(open_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.find_by_email(email).cloned())
    }

    async fn upsert(&self, fields: UserUpsert) -> Result<User> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.upsert(fields, self.owner_open_id.as_deref(), Utc::now())
    }

    async fn touch_last_signed_in(&self, open_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.touch(open_id, at)
    }
}
