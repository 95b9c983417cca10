//! # Session
//!
//! The bearer token every authenticated request carries.
//!
//! ## Token Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Session Token Lifecycle                         │
//! │                                                                         │
//! │   startup ──► load(token file) ──► Some(token) / None                   │
//! │                                                                         │
//! │   request ──► Authorization: Bearer <token>                             │
//! │                                                                         │
//! │   response                                                              │
//! │     ├── X-New-Token: <t2> ──► rotate(t2) ──► persisted to token file    │
//! │     ├── 401              ──► clear()    ──► token file removed          │
//! │     └── other            ──► unchanged                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is an explicit object owned by the transport, never a
//! process-wide global. Tests build one with [`Session::with_token`].

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};

/// Holds the current token and where it is persisted.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
    store_path: Option<PathBuf>,
}

impl Session {
    /// An empty in-memory session.
    pub fn new() -> Self {
        Self::default()
    }

    /// An in-memory session that starts signed in.
    pub fn with_token(token: impl Into<String>) -> Self {
        Session {
            token: RwLock::new(Some(token.into())),
            store_path: None,
        }
    }

    /// Loads the persisted token from `path`, if one exists.
    ///
    /// A missing file is an empty session, not an error.
    pub fn load(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let token = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(ClientError::SessionStoreFailed(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        debug!(?path, signed_in = token.is_some(), "Session loaded");
        Ok(Session {
            token: RwLock::new(token),
            store_path: Some(path),
        })
    }

    /// Replaces the in-memory token without touching the file, e.g. for a
    /// token supplied through the environment.
    pub async fn override_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    /// Stores a new token and persists it.
    pub async fn set_token(&self, token: impl Into<String>) -> ClientResult<()> {
        let token = token.into();
        self.persist(Some(&token))?;
        *self.token.write().await = Some(token);
        Ok(())
    }

    /// Applies a token handed back by the backend.
    ///
    /// Returns `false` when the token is unchanged.
    pub async fn rotate(&self, token: &str) -> ClientResult<bool> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(false);
        }

        let mut current = self.token.write().await;
        if current.as_deref() == Some(token) {
            return Ok(false);
        }

        *current = Some(token.to_string());
        drop(current);

        info!("Session token rotated by backend");
        self.persist(Some(token))?;
        Ok(true)
    }

    /// Signs out: forgets the token and removes the token file.
    pub async fn clear(&self) -> ClientResult<()> {
        let had_token = self.token.write().await.take().is_some();
        if had_token {
            info!("Session cleared");
        }
        self.persist(None)
    }

    fn persist(&self, token: Option<&str>) -> ClientResult<()> {
        let Some(path) = &self.store_path else {
            return Ok(());
        };

        let result = match token {
            Some(token) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| ClientError::SessionStoreFailed(e.to_string()))?;
                }
                std::fs::write(path, token)
            }
            None => match std::fs::remove_file(path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };

        result.map_err(|e| ClientError::SessionStoreFailed(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_signed_out() {
        let dir = TempDir::new().unwrap();
        let session = Session::load(dir.path().join("session.token")).unwrap();
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_set_token_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.token");

        let session = Session::load(&path).unwrap();
        session.set_token("abc").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc");

        let reloaded = Session::load(&path).unwrap();
        assert_eq!(reloaded.token().await.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_rotate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.token");
        let session = Session::load(&path).unwrap();
        session.set_token("one").await.unwrap();

        assert!(!session.rotate("one").await.unwrap());
        assert!(!session.rotate("  ").await.unwrap());
        assert!(session.rotate("two").await.unwrap());
        assert_eq!(session.token().await.as_deref(), Some("two"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.token");
        let session = Session::load(&path).unwrap();
        session.set_token("abc").await.unwrap();

        session.clear().await.unwrap();
        assert!(!session.is_authenticated().await);
        assert!(!path.exists());

        // clearing twice is fine
        session.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_session() {
        let session = Session::with_token("mem");
        assert!(session.store_path().is_none());
        session.rotate("mem2").await.unwrap();
        assert_eq!(session.token().await.as_deref(), Some("mem2"));
    }
}
