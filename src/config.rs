//! Configuration management for teradrop.
//!
//! Settings start from built-in defaults, then a config file (explicit path
//! or discovered with the prefer crate) is layered on top, then CLI flags and
//! `TERADROP_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scrapers::browser::BrowserEngineConfig;

/// Downloads subdirectory name.
const DOWNLOADS_SUBDIR: &str = "downloads";

/// Stored session cookie filename.
const COOKIE_FILENAME: &str = "cookies.json";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Directory for merged downloads.
    pub downloads_dir: PathBuf,
    /// File holding the stored session cookie.
    pub cookie_file: PathBuf,
    /// yt-dlp executable (searched in PATH when unset).
    pub ytdlp_path: Option<PathBuf>,
    /// Directory or binary passed to yt-dlp's --ffmpeg-location.
    pub ffmpeg_location: Option<PathBuf>,
    /// Headless browser settings for share-page scraping.
    pub browser: BrowserEngineConfig,
    /// Seconds a resolved link stays downloadable.
    pub cache_ttl_secs: u64,
    /// Maximum resolved links kept in memory.
    pub cache_capacity: usize,
    /// Browser sessions and merges allowed to run at once.
    pub max_concurrent_jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        // Local data dir -> Home dir -> Current dir
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("teradrop");

        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            downloads_dir: data_dir.join(DOWNLOADS_SUBDIR),
            cookie_file: data_dir.join(COOKIE_FILENAME),
            data_dir,
            ytdlp_path: None,
            ffmpeg_location: None,
            browser: BrowserEngineConfig::default(),
            cache_ttl_secs: 3600,
            cache_capacity: 1024,
            max_concurrent_jobs: 4,
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (label, dir) in [("data", &self.data_dir), ("downloads", &self.downloads_dir)] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Downloads directory (defaults to `<data_dir>/downloads`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<String>,
    /// Cookie file (defaults to `<data_dir>/cookies.json`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ytdlp_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserEngineConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_capacity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_jobs: Option<usize>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a teradrop config file in the standard locations.
    pub async fn discover() -> Option<Self> {
        let pref_config = prefer::load("teradrop").await.ok()?;
        let path = pref_config.source_path()?;
        match Self::load_from_path(path).await {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring config at {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            *settings = Settings {
                browser: settings.browser.clone(),
                ..Settings::with_data_dir(self.resolve_path(data_dir, base_dir))
            };
        }
        if let Some(ref dir) = self.downloads_dir {
            settings.downloads_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref file) = self.cookie_file {
            settings.cookie_file = self.resolve_path(file, base_dir);
        }
        if let Some(ref path) = self.ytdlp_path {
            settings.ytdlp_path = Some(self.resolve_path(path, base_dir));
        }
        if let Some(ref path) = self.ffmpeg_location {
            settings.ffmpeg_location = Some(self.resolve_path(path, base_dir));
        }
        if let Some(ref browser) = self.browser {
            settings.browser = browser.clone();
        }
        if let Some(ttl) = self.cache_ttl_secs {
            settings.cache_ttl_secs = ttl;
        }
        if let Some(capacity) = self.cache_capacity {
            settings.cache_capacity = capacity.max(1);
        }
        if let Some(jobs) = self.max_concurrent_jobs {
            settings.max_concurrent_jobs = jobs.max(1);
        }
    }
}

/// Options controlling how settings are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (skips discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory override from the command line or environment.
    pub data_dir: Option<PathBuf>,
}

/// Load settings: defaults, then config file, then command-line overrides.
pub async fn load_settings(options: LoadOptions) -> anyhow::Result<Settings> {
    let config = match options.config_path {
        Some(ref path) => Some(
            Config::load_from_path(path)
                .await
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
        ),
        None => Config::discover().await,
    };

    let mut settings = Settings::default();

    if let Some(ref config) = config {
        let base_dir = config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        config.apply_to_settings(&mut settings, &base_dir);
        tracing::debug!("Loaded config from {:?}", config.source_path);
    }

    if let Some(data_dir) = options.data_dir {
        let expanded = shellexpand::tilde(&data_dir.to_string_lossy()).to_string();
        settings = Settings {
            browser: settings.browser.clone(),
            ytdlp_path: settings.ytdlp_path.clone(),
            ffmpeg_location: settings.ffmpeg_location.clone(),
            cache_ttl_secs: settings.cache_ttl_secs,
            cache_capacity: settings.cache_capacity,
            max_concurrent_jobs: settings.max_concurrent_jobs,
            ..Settings::with_data_dir(PathBuf::from(expanded))
        };
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_with_data_dir_layout() {
        let settings = Settings::with_data_dir(PathBuf::from("/srv/teradrop"));
        assert_eq!(settings.downloads_dir, PathBuf::from("/srv/teradrop/downloads"));
        assert_eq!(settings.cookie_file, PathBuf::from("/srv/teradrop/cookies.json"));
    }

    #[tokio::test]
    async fn test_load_toml_config_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("teradrop.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "state"
cache_ttl_secs = 60
max_concurrent_jobs = 2

[browser]
timeout = 60
max_attempts = 3
"#,
        )
        .unwrap();

        let settings = load_settings(LoadOptions {
            config_path: Some(path),
            data_dir: None,
        })
        .await
        .unwrap();

        assert_eq!(settings.data_dir, dir.path().join("state"));
        assert_eq!(settings.downloads_dir, dir.path().join("state").join("downloads"));
        assert_eq!(settings.cache_ttl_secs, 60);
        assert_eq!(settings.max_concurrent_jobs, 2);
        assert_eq!(settings.browser.timeout, 60);
        assert_eq!(settings.browser.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("teradrop.yaml");
        std::fs::write(&path, "cookie_file: /tmp/session.json\ncache_capacity: 0\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::with_data_dir(dir.path().to_path_buf());
        config.apply_to_settings(&mut settings, dir.path());

        assert_eq!(settings.cookie_file, PathBuf::from("/tmp/session.json"));
        assert_eq!(settings.cache_capacity, 1);
    }

    #[tokio::test]
    async fn test_data_dir_override_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("teradrop.json");
        std::fs::write(&path, r#"{"data_dir": "from-file", "cache_ttl_secs": 5}"#).unwrap();

        let settings = load_settings(LoadOptions {
            config_path: Some(path),
            data_dir: Some(dir.path().join("from-flag")),
        })
        .await
        .unwrap();

        assert_eq!(settings.data_dir, dir.path().join("from-flag"));
        assert_eq!(settings.cache_ttl_secs, 5);
    }

    #[tokio::test]
    async fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "cache_ttl_secs = \"soon\"").unwrap();

        let result = load_settings(LoadOptions {
            config_path: Some(path),
            data_dir: None,
        })
        .await;
        assert!(result.is_err());
    }
}
