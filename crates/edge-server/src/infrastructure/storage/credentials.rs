//! Flat-file credential store: one `username password` pair per line.
//!
//! The file is rescanned on every lookup, so edits take effect for the next
//! login without a restart.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::application::login::{CredentialError, CredentialStore};

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn pairs(&self) -> Result<Vec<(String, String)>, CredentialError> {
        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|source| CredentialError {
                path: self.path.clone(),
                source,
            })?;
        Ok(text
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let user = parts.next()?;
                let password = parts.next().unwrap_or_default();
                Some((user.to_string(), password.to_string()))
            })
            .collect())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn username_exists(&self, username: &str) -> Result<bool, CredentialError> {
        Ok(self.pairs().await?.iter().any(|(u, _)| u == username))
    }

    async fn verify(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        Ok(self
            .pairs()
            .await?
            .iter()
            .any(|(u, p)| u == username && p == password))
    }
}
