//! Source of the current employee's identity token.
use std::path::PathBuf;

use async_trait::async_trait;

/// Read-only access to the persisted identity. `None` when nobody is signed in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn user_id(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    #[cfg(test)]
    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Identity persisted in a small file, re-read on every call so that a
/// sign-in elsewhere is picked up.
#[derive(Debug, Clone)]
pub struct FileIdentity {
    path: PathBuf,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl IdentityProvider for FileIdentity {
    async fn user_id(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "identity unreadable");
                None
            }
        }
    }
}
