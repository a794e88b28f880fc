//! Storage helpers for processed files on disk.
//!
//! Merged files live flat in the downloads directory as `<file_id>.<ext>`.
//! yt-dlp writes `<name>.part` while a transfer is in flight.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

const PARTIAL_SUFFIX: &str = ".part";

/// Generate a fresh identifier for a resolved or processed file.
pub fn new_file_id() -> String {
    Uuid::new_v4().to_string()
}

/// Whether `file_id` can be used as a filename prefix without escaping the
/// downloads directory.
pub fn is_safe_id(file_id: &str) -> bool {
    !file_id.is_empty()
        && !file_id.contains(['/', '\\', '\0'])
        && !file_id.starts_with('.')
}

fn is_partial(name: &str) -> bool {
    name.ends_with(PARTIAL_SUFFIX)
}

/// Find the first finished file in `dir` whose name starts with `prefix`.
///
/// A missing directory simply has no matches.
pub async fn find_by_prefix(dir: &Path, prefix: &str) -> std::io::Result<Option<PathBuf>> {
    if !is_safe_id(prefix) {
        return Ok(None);
    }

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(prefix) && !is_partial(&name) && entry.file_type().await?.is_file() {
            matches.push(entry.path());
        }
    }

    // Directory order is unspecified
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Delete leftover partial downloads. Returns how many were removed.
pub async fn purge_partials(dir: &Path) -> std::io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if is_partial(&name) {
            tokio::fs::remove_file(entry.path()).await?;
            debug!("Removed partial download {}", name);
            removed += 1;
        }
    }

    if removed > 0 {
        info!("Purged {} partial download(s) from {}", removed, dir.display());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_file_id_is_uuid() {
        let id = new_file_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, new_file_id());
        assert!(is_safe_id(&id));
    }

    #[test]
    fn test_unsafe_ids() {
        assert!(!is_safe_id(""));
        assert!(!is_safe_id("../etc/passwd"));
        assert!(!is_safe_id("a/b"));
        assert!(!is_safe_id("a\\b"));
        assert!(!is_safe_id(".."));
    }

    #[tokio::test]
    async fn test_find_by_prefix_skips_partials() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("abc.mp4.part"), b"x").unwrap();
        assert_eq!(find_by_prefix(dir.path(), "abc").await.unwrap(), None);

        std::fs::write(dir.path().join("abc.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("xyz.mp4"), b"x").unwrap();
        assert_eq!(
            find_by_prefix(dir.path(), "abc").await.unwrap(),
            Some(dir.path().join("abc.mp4"))
        );
    }

    #[tokio::test]
    async fn test_find_in_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(find_by_prefix(&missing, "abc").await.unwrap(), None);
        assert_eq!(purge_partials(&missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_partials() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4.part"), b"x").unwrap();
        std::fs::write(dir.path().join("b.f137.mp4.part"), b"x").unwrap();
        std::fs::write(dir.path().join("c.mp4"), b"x").unwrap();

        assert_eq!(purge_partials(dir.path()).await.unwrap(), 2);
        let left: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(left, vec!["c.mp4".to_string()]);
    }
}
