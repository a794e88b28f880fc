//! Browser capture request and response types.

use super::cookies::SessionCookie;
use super::fingerprint::Fingerprint;

/// What to load and how the browser should present itself.
#[derive(Debug, Clone)]
pub struct CaptureRequest<'a> {
    pub url: &'a str,
    pub fingerprint: &'a Fingerprint,
    /// Cookies set before navigation.
    pub cookies: &'a [SessionCookie],
    /// Script evaluated after the page settles; its JSON result is returned
    /// as `PageCapture::probe`.
    pub probe_script: Option<&'a str>,
}

/// Snapshot of a page after navigation settled.
#[derive(Debug, Clone, Default)]
pub struct PageCapture {
    pub final_url: String,
    pub title: String,
    pub content: String,
    /// Result of the probe script (`None` when absent, null or failed).
    pub probe: Option<serde_json::Value>,
    /// Cookies from the browser session (for subsequent HTTP requests).
    pub cookies: Vec<BrowserCookie>,
}

/// Cookie extracted from browser session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}
