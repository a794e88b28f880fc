//! Generic video-page resolver backed by yt-dlp.
//!
//! yt-dlp reports every stream it knows about. Users only want one choice
//! per resolution, so the raw list is reduced: video-less and height-less
//! entries go, the rest are ranked and the best entry per height is kept.

use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{info, warn};

use super::resolver::LinkResolver;
use super::ytdlp::{RawFormat, VideoInfo, YtDlp};
use crate::error::ResolveError;
use crate::models::{FormatOption, ResolveResult};

/// yt-dlp's marker for an absent codec.
const NO_CODEC: &str = "none";

const DEFAULT_TITLE: &str = "download";
const DEFAULT_EXT: &str = "mp4";

pub struct GenericResolver {
    ytdlp: YtDlp,
}

impl GenericResolver {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self { ytdlp }
    }

    /// Resolve any page yt-dlp supports.
    pub async fn fetch(&self, url: &str) -> Result<ResolveResult, ResolveError> {
        info!("Resolving {} with yt-dlp", url);
        match self.ytdlp.dump_json(url).await {
            Ok(info) => Ok(to_resolve_result(url, info)),
            Err(e) => {
                warn!("yt-dlp could not resolve {}: {:#}", url, e);
                Err(ResolveError::ExtractionFailed(format!(
                    "Supported site extraction failed: {:#}",
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl LinkResolver for GenericResolver {
    async fn resolve(
        &self,
        url: &str,
        _cookie: Option<&str>,
    ) -> Result<ResolveResult, ResolveError> {
        self.fetch(url).await
    }
}

fn has_codec(codec: &Option<String>) -> bool {
    // Missing means yt-dlp did not say, which it does for muxed streams
    codec.as_deref() != Some(NO_CODEC)
}

/// Ranking: taller first, then mp4, then higher bitrate.
fn rank(a: &RawFormat, b: &RawFormat) -> Ordering {
    let is_mp4 = |f: &RawFormat| f.ext.as_deref() == Some("mp4");
    b.height
        .unwrap_or(0)
        .cmp(&a.height.unwrap_or(0))
        .then_with(|| is_mp4(b).cmp(&is_mp4(a)))
        .then_with(|| b.tbr.unwrap_or(0.0).total_cmp(&a.tbr.unwrap_or(0.0)))
}

/// Reduce yt-dlp's format list to one option per height, tallest first.
pub fn build_format_options(formats: &[RawFormat]) -> Vec<FormatOption> {
    let mut ranked: Vec<&RawFormat> = formats
        .iter()
        .filter(|f| f.height.is_some_and(|h| h > 0) && has_codec(&f.vcodec))
        .collect();
    ranked.sort_by(|a, b| rank(a, b));

    let mut seen = HashSet::new();
    ranked
        .into_iter()
        .filter_map(|f| {
            let height = f.height?;
            if !seen.insert(height) {
                return None;
            }

            let is_direct = has_codec(&f.acodec) && f.url.is_some();
            Some(FormatOption {
                label: format!("{}p", height),
                format_id: f.format_id.clone(),
                extension: f.ext.clone().unwrap_or_else(|| DEFAULT_EXT.to_string()),
                resolution_label: f.resolution.clone(),
                filesize_bytes: f
                    .filesize
                    .or_else(|| f.filesize_approx.map(|s| s as u64)),
                is_direct,
                direct_url: if is_direct { f.url.clone() } else { None },
            })
        })
        .collect()
}

/// Shape a yt-dlp document into a resolve result for `requested_url`.
pub fn to_resolve_result(requested_url: &str, info: VideoInfo) -> ResolveResult {
    let formats = build_format_options(info.formats.as_deref().unwrap_or_default());

    let title = info
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let ext = info.ext.unwrap_or_else(|| DEFAULT_EXT.to_string());
    let webpage_url = info
        .webpage_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| requested_url.to_string());

    ResolveResult {
        direct_url: info.url,
        webpage_url,
        filename: format!("{}.{}", title, ext),
        title,
        size_bytes: info
            .filesize
            .or_else(|| info.filesize_approx.map(|s| s as u64))
            .unwrap_or(0),
        thumbnail: info.thumbnail,
        formats,
        headers: info.http_headers.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trimmed `yt-dlp --dump-json` output for a public video.
    const RECORDED_INFO: &str = r#"{
        "id": "aqz-KE-bpKQ",
        "title": "Big Buck Bunny 60fps 4K",
        "ext": "mp4",
        "webpage_url": "https://www.youtube.com/watch?v=aqz-KE-bpKQ",
        "thumbnail": "https://i.ytimg.com/vi/aqz-KE-bpKQ/maxresdefault.jpg",
        "filesize_approx": 612345678.4,
        "http_headers": {
            "User-Agent": "Mozilla/5.0 (X11; Linux x86_64)",
            "Accept-Language": "en-us,en;q=0.5"
        },
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none", "height": 45, "url": "https://i.ytimg.com/sb/0"},
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "tbr": 129.5, "url": "https://rr.googlevideo.com/140"},
            {"format_id": "18", "ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360, "resolution": "640x360", "tbr": 600.1, "filesize": 52000000, "url": "https://rr.googlevideo.com/18"},
            {"format_id": "134", "ext": "mp4", "vcodec": "avc1.4d401e", "acodec": "none", "height": 360, "resolution": "640x360", "tbr": 400.0, "url": "https://rr.googlevideo.com/134"},
            {"format_id": "247", "ext": "webm", "vcodec": "vp9", "acodec": "none", "height": 720, "resolution": "1280x720", "tbr": 1500.0, "url": "https://rr.googlevideo.com/247"},
            {"format_id": "136", "ext": "mp4", "vcodec": "avc1.4d401f", "acodec": "none", "height": 720, "resolution": "1280x720", "tbr": 1100.0, "filesize_approx": 99000000.0, "url": "https://rr.googlevideo.com/136"},
            {"format_id": "299", "ext": "mp4", "vcodec": "avc1.64002a", "acodec": "none", "height": 1080, "resolution": "1920x1080", "tbr": 4400.0, "url": "https://rr.googlevideo.com/299"},
            {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080, "resolution": "1920x1080", "tbr": 2500.0, "url": "https://rr.googlevideo.com/137"},
            {"format_id": "hls-2160", "ext": "mp4", "height": 2160, "resolution": "3840x2160", "tbr": 16000.0, "url": "https://manifest.example.com/2160.m3u8"},
            {"format_id": "dash-nourl", "ext": "mp4", "vcodec": "avc1", "height": 1440, "tbr": 9000.0}
        ]
    }"#;

    fn recorded() -> ResolveResult {
        let info: VideoInfo = serde_json::from_str(RECORDED_INFO).unwrap();
        to_resolve_result("https://youtu.be/aqz-KE-bpKQ", info)
    }

    #[test]
    fn test_heights_strictly_descending_and_unique() {
        let result = recorded();
        let heights: Vec<u32> = result.formats.iter().filter_map(|f| f.height()).collect();
        assert_eq!(heights, vec![2160, 1440, 1080, 720, 360]);
        assert!(heights.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_best_entry_per_height_wins() {
        let result = recorded();
        let ids: Vec<&str> = result.formats.iter().map(|f| f.format_id.as_str()).collect();
        // 1080: higher bitrate; 720: mp4 over webm; 360: higher bitrate (muxed)
        assert_eq!(ids, vec!["hls-2160", "dash-nourl", "299", "136", "18"]);
    }

    #[test]
    fn test_direct_flag_follows_audio_and_url() {
        let result = recorded();
        for option in &result.formats {
            assert_eq!(option.is_direct, option.direct_url.is_some());
        }

        let by_id = |id: &str| result.formats.iter().find(|f| f.format_id == id).unwrap();
        // Missing codecs count as present
        assert!(by_id("hls-2160").is_direct);
        // Audio present but nothing to fetch
        assert!(!by_id("dash-nourl").is_direct);
        assert!(!by_id("299").is_direct);
        assert_eq!(
            by_id("18").direct_url.as_deref(),
            Some("https://rr.googlevideo.com/18")
        );
        assert_eq!(by_id("136").filesize_bytes, Some(99_000_000));
    }

    #[test]
    fn test_top_level_fields() {
        let result = recorded();
        assert_eq!(result.title, "Big Buck Bunny 60fps 4K");
        assert_eq!(result.filename, "Big Buck Bunny 60fps 4K.mp4");
        assert_eq!(result.webpage_url, "https://www.youtube.com/watch?v=aqz-KE-bpKQ");
        assert_eq!(result.size_bytes, 612_345_678);
        assert!(result.direct_url.is_none());
        assert_eq!(result.headers["User-Agent"], "Mozilla/5.0 (X11; Linux x86_64)");
    }

    #[test]
    fn test_zero_height_is_dropped() {
        let formats: Vec<RawFormat> = serde_json::from_str(
            r#"[
                {"format_id": "audio-as-video", "ext": "mp4", "vcodec": "avc1", "height": 0, "url": "https://cdn.example.com/0"},
                {"format_id": "22", "ext": "mp4", "vcodec": "avc1", "height": 720, "url": "https://cdn.example.com/22"}
            ]"#,
        )
        .unwrap();

        let options = build_format_options(&formats);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].format_id, "22");
        assert_eq!(options[0].label, "720p");
    }

    #[test]
    fn test_sparse_document_uses_defaults() {
        let result = to_resolve_result("https://example.com/clip", VideoInfo::default());
        assert_eq!(result.title, "download");
        assert_eq!(result.filename, "download.mp4");
        assert_eq!(result.webpage_url, "https://example.com/clip");
        assert_eq!(result.size_bytes, 0);
        assert!(result.formats.is_empty());
    }

    #[tokio::test]
    async fn test_extractor_failure_message() {
        let resolver = GenericResolver::new(YtDlp::new("/nonexistent/yt-dlp-binary"));
        let err = resolver.fetch("https://example.com/v").await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Supported site extraction failed: "));
    }
}
