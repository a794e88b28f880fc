//! Persisted session cookie.
//!
//! A single token lives in a small JSON file (`{"ndus": "..."}`). It is the
//! fallback credential when a resolve request carries none, and it is
//! overwritten whenever an explicitly supplied cookie resolves successfully.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CookieRecord {
    ndus: Option<String>,
}

/// Reads and writes the stored session cookie.
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token.
    ///
    /// A missing or unreadable file behaves as if nothing was stored.
    pub async fn load(&self) -> Option<String> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cookie file {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str::<CookieRecord>(&content) {
            Ok(record) => record.ndus.filter(|token| !token.is_empty()),
            Err(e) => {
                warn!("Ignoring malformed cookie file {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Overwrite the stored token.
    pub async fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string(&CookieRecord {
            ndus: Some(token.to_string()),
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write cookie file {:?}", self.path))?;

        debug!("Saved session cookie to {:?}", self.path);
        Ok(())
    }
}

/// Shorten a token for display, keeping only its first characters.
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    if prefix.len() < token.len() {
        format!("{}…", prefix)
    } else {
        prefix
    }
}
