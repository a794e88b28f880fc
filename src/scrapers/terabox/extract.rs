//! Direct-link extraction strategies.
//!
//! Strategies run in [`Strategy::ORDER`]; the first hit wins.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::scrapers::browser::PageCapture;

/// Elements that act as the share page's download button.
const DOWNLOAD_BUTTON_SELECTOR: &str = r#".download-btn, .btn-download, a[title="Download"]"#;

/// Filename used when the page title gives nothing better.
const FALLBACK_FILENAME: &str = "downloaded_file";

/// Returns the first file entry of the page's embedded file list, or null.
pub const FILE_INFO_PROBE: &str = r#"
(() => {
    try {
        const yun = window.yunData || {};
        const msg = window.msg || {};
        for (const list of [yun.FILEINFO, yun.filelist, msg.list]) {
            if (Array.isArray(list) && list.length > 0) {
                return list[0];
            }
        }
    } catch (e) {}
    return null;
})()
"#;

/// A direct link pulled out of a share page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub direct_url: String,
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Download button or link in the rendered DOM.
    DomAnchor,
    /// File list the page embeds in a global JavaScript variable.
    JsonVariable,
}

impl Strategy {
    pub const ORDER: [Strategy; 2] = [Strategy::DomAnchor, Strategy::JsonVariable];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::DomAnchor => "dom_anchor",
            Strategy::JsonVariable => "json_variable",
        }
    }

    pub fn apply(&self, page: &PageCapture) -> Option<Extraction> {
        match self {
            Strategy::DomAnchor => dom_anchor(page),
            Strategy::JsonVariable => page.probe.as_ref().and_then(json_variable),
        }
    }
}

/// Run every strategy in order and return the first hit.
pub fn extract(page: &PageCapture) -> Option<(Strategy, Extraction)> {
    Strategy::ORDER
        .iter()
        .find_map(|strategy| strategy.apply(page).map(|hit| (*strategy, hit)))
}

fn dom_anchor(page: &PageCapture) -> Option<Extraction> {
    let document = Html::parse_document(&page.content);
    let buttons = Selector::parse(DOWNLOAD_BUTTON_SELECTOR).ok()?;
    let anchors = Selector::parse("a").ok()?;

    let labelled = document
        .select(&anchors)
        .filter(|a| a.text().collect::<String>().contains("Download"));

    let href = document
        .select(&buttons)
        .chain(labelled)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .find(|href| href.starts_with("http://") || href.starts_with("https://"))?;

    Some(Extraction {
        direct_url: href.to_string(),
        filename: filename_from_title(&page.title),
        size: 0,
    })
}

fn json_variable(entry: &Value) -> Option<Extraction> {
    let direct_url = entry
        .get("dlink")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;

    let filename = entry
        .get("server_filename")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_FILENAME);

    let size = match entry.get("size") {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(0);

    Some(Extraction {
        direct_url: direct_url.to_string(),
        filename: filename.to_string(),
        size,
    })
}

/// "clip.mp4 - Share Files | TeraBox" -> "clip.mp4".
fn filename_from_title(title: &str) -> String {
    if !title.contains("TeraBox") {
        return FALLBACK_FILENAME.to_string();
    }
    let name = title.split(" - Share Files").next().unwrap_or("").trim();
    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name.to_string()
    }
}
