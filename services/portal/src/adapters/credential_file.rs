//! services/portal/src/adapters/credential_file.rs
//!
//! Persists the credential as a small JSON file, the terminal's equivalent
//! of the browser's local storage. Implements the `CredentialStore` port.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use padho_likho_core::domain::{Credential, Role};
use padho_likho_core::ports::{CredentialStore, PortError, PortResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// On-disk layout: the `token` and `role` keys.
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    token: String,
    #[serde(default)]
    role: Option<String>,
}

fn io_error(e: std::io::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> PortResult<Option<Credential>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };
        let stored: StoredCredential = serde_json::from_str(&raw)
            .map_err(|e| PortError::Unexpected(format!("Corrupt credential file: {}", e)))?;

        // An unknown role is kept as "no role" and left for the guard to judge.
        let role = stored.role.as_deref().and_then(|role| match role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!("Ignoring stored role: {}", e);
                None
            }
        });
        Ok(Some(Credential::new(stored.token, role)))
    }

    async fn save(&self, credential: &Credential) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let stored = StoredCredential {
            token: credential.token.clone(),
            role: credential.role.map(|role| role.to_string()),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&self.path, json).await.map_err(io_error)?;
        debug!("Credential written to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}
