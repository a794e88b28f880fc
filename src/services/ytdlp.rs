//! yt-dlp child-process wrapper.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Top-level document printed by `yt-dlp --dump-json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default)]
    pub formats: Option<Vec<RawFormat>>,
    #[serde(default)]
    pub http_headers: Option<HashMap<String, String>>,
}

/// One entry of yt-dlp's `formats` list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub resolution: Option<String>,
    /// `"none"` for audio-only formats.
    #[serde(default)]
    pub vcodec: Option<String>,
    /// `"none"` for video-only formats.
    #[serde(default)]
    pub acodec: Option<String>,
    /// Total bitrate in KBit/s.
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
}

/// Handle on a yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    ffmpeg_location: Option<PathBuf>,
    proxy: Option<String>,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ffmpeg_location: None,
            proxy: None,
        }
    }

    /// Use `configured` when given, otherwise look `yt-dlp` up in PATH.
    pub fn locate(configured: Option<&Path>) -> Self {
        let binary = match configured {
            Some(path) => path.to_path_buf(),
            None => which::which("yt-dlp").unwrap_or_else(|_| {
                warn!("yt-dlp not found in PATH; generic links will fail until it is installed");
                PathBuf::from("yt-dlp")
            }),
        };
        debug!("Using yt-dlp at {}", binary.display());
        Self::new(binary)
    }

    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }

    /// Pass `--proxy` to every invocation (e.g. "socks5://127.0.0.1:9050").
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(ref proxy) = self.proxy {
            debug!("Using proxy for yt-dlp: {}", proxy);
            cmd.args(["--proxy", proxy]);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    /// Fetch metadata and the format list without downloading.
    pub async fn dump_json(&self, url: &str) -> Result<VideoInfo> {
        let mut cmd = self.command();
        cmd.args(["--dump-json", "--no-playlist", "--no-warnings"]);
        cmd.arg(url);

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute yt-dlp for metadata")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp metadata fetch failed: {}", stderr.trim());
        }

        let info: VideoInfo =
            serde_json::from_slice(&output.stdout).context("Failed to parse yt-dlp JSON output")?;

        Ok(info)
    }

    /// Download `format_id` plus the best audio and merge them into mp4.
    ///
    /// `output_template` is a yt-dlp template such as `<dir>/<id>.%(ext)s`.
    pub async fn download_merged(
        &self,
        url: &str,
        format_id: &str,
        output_template: &Path,
    ) -> Result<()> {
        info!("Merging format {} of {}", format_id, url);

        let format = format!("{}+bestaudio[ext=m4a]/bestaudio", format_id);
        let template = output_template.to_string_lossy().to_string();

        let mut cmd = self.command();
        cmd.args([
            "--no-playlist",
            "--no-progress",
            "--format",
            &format,
            "--merge-output-format",
            "mp4",
            "--output",
            &template,
            "--concurrent-fragments",
            "4",
            "--buffer-size",
            "1M",
            "--http-chunk-size",
            "10M",
            "--retries",
            "10",
            "--fragment-retries",
            "10",
        ]);

        if let Some(ref ffmpeg) = self.ffmpeg_location {
            cmd.arg("--ffmpeg-location").arg(ffmpeg);
        }

        cmd.arg(url);

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute yt-dlp")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp stderr: {}", stderr);
            anyhow::bail!("yt-dlp failed: {}", stderr.trim());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let ytdlp = YtDlp::new("/nonexistent/yt-dlp-binary");
        let err = ytdlp.dump_json("https://example.com/v").await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to execute yt-dlp"));
    }

    #[test]
    fn test_null_fields_deserialize() {
        let info: VideoInfo = serde_json::from_str(
            r#"{"title": null, "formats": [{"format_id": "1", "height": null, "tbr": null}]}"#,
        )
        .unwrap();
        assert!(info.title.is_none());
        let formats = info.formats.unwrap();
        assert_eq!(formats[0].format_id, "1");
        assert!(formats[0].height.is_none());
    }
}
