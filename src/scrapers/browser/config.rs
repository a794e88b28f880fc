//! Browser engine configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Browser engine type.
    #[serde(default)]
    pub engine: BrowserEngineType,

    /// Run in headless mode (default: true).
    /// Set to false for debugging or if headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Chrome/Chromium executable. Searched for when unset.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Navigation timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Delay after navigation so client-side rendering can finish.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Browser launches per share link before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            engine: BrowserEngineType::default(),
            headless: default_headless(),
            proxy: None,
            executable: None,
            timeout: default_timeout(),
            settle_delay_ms: default_settle_delay_ms(),
            max_attempts: default_max_attempts(),
            chrome_args: Vec::new(),
        }
    }
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    45
}

pub fn default_settle_delay_ms() -> u64 {
    3000
}

pub fn default_max_attempts() -> u32 {
    2
}

/// Browser engine types.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BrowserEngineType {
    /// Standard chromiumoxide with stealth patches (default).
    #[default]
    Stealth,

    /// No stealth patches (for debugging).
    Standard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_table() {
        let config: BrowserEngineConfig = toml::from_str("").unwrap();
        assert!(config.headless);
        assert_eq!(config.timeout, 45);
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.engine, BrowserEngineType::Stealth);
    }

    #[test]
    fn test_engine_names() {
        let config: BrowserEngineConfig =
            toml::from_str("engine = \"standard\"\nheadless = false").unwrap();
        assert_eq!(config.engine, BrowserEngineType::Standard);
        assert!(!config.headless);
    }
}
