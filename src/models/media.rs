//! Resolved media metadata.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of a successful resolve call.
///
/// Produced once per request and kept only in the server's file cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveResult {
    /// Direct download URL, when the resolver found one.
    #[serde(rename = "url", default)]
    pub direct_url: Option<String>,
    /// Page the media came from; needed to re-enter processing later.
    pub webpage_url: String,
    pub title: String,
    pub filename: String,
    /// Size in bytes (0 when unknown).
    #[serde(rename = "size", default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatOption>,
    /// Headers the upstream host requires to honor `direct_url`.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// One user-facing quality option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatOption {
    /// Display label, e.g. "1080p".
    pub label: String,
    pub format_id: String,
    #[serde(rename = "ext")]
    pub extension: String,
    #[serde(rename = "resolution", default)]
    pub resolution_label: Option<String>,
    #[serde(rename = "filesize", default)]
    pub filesize_bytes: Option<u64>,
    /// Already carries audio and can be fetched as-is.
    pub is_direct: bool,
    /// Only present when `is_direct` is set.
    #[serde(rename = "url", default)]
    pub direct_url: Option<String>,
}

impl FormatOption {
    /// Height parsed back out of the label ("720p" -> 720).
    pub fn height(&self) -> Option<u32> {
        self.label.strip_suffix('p')?.parse().ok()
    }
}

/// A merged file sitting in the downloads directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    /// Identifier the file name starts with.
    pub file_id: String,
    pub filename: String,
    pub path: PathBuf,
}
