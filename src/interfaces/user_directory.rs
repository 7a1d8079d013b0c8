//! Username resolution.

use std::collections::HashMap;

use async_trait::async_trait;

use super::record::UserId;
use crate::error::Result;

/// Resolves usernames to user identities.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns `None` when no user has this name.
    async fn resolve(&self, username: &str) -> Result<Option<UserId>>;
}

/// Fixed username table.
#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, UserId>,
}

impl StaticUserDirectory {
    pub fn new(users: impl IntoIterator<Item = (String, UserId)>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    pub fn with_user(mut self, username: impl Into<String>, id: UserId) -> Self {
        self.users.insert(username.into(), id);
        self
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn resolve(&self, username: &str) -> Result<Option<UserId>> {
        Ok(self.users.get(username).copied())
    }
}
