//! Cookie parsing and conversion for browser sessions.

#[cfg(feature = "browser")]
use anyhow::Result;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::CookieParam;

use super::types::BrowserCookie;

/// A cookie to set in the browser before navigating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl SessionCookie {
    #[cfg(feature = "browser")]
    pub(crate) fn to_param(&self) -> Result<CookieParam> {
        CookieParam::builder()
            .name(self.name.as_str())
            .value(self.value.as_str())
            .domain(self.domain.as_str())
            .path(self.path.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build cookie {}: {}", self.name, e))
    }
}

/// Parse a user-supplied credential into name/value pairs.
///
/// Accepts either `name=value; name2=value2` or a bare token, which is
/// stored under `bare_name`. Segments without `=` in a list are skipped.
pub fn parse_cookie_string(raw: &str, bare_name: &str) -> Vec<(String, String)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if !raw.contains('=') {
        return vec![(bare_name.to_string(), raw.to_string())];
    }

    raw.split(';')
        .filter_map(|part| {
            let (name, value) = part.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Attach every pair to each of `domains`, path `/`.
pub fn cookies_for_domains(pairs: &[(String, String)], domains: &[&str]) -> Vec<SessionCookie> {
    pairs
        .iter()
        .flat_map(|(name, value)| {
            domains.iter().map(move |domain| SessionCookie {
                name: name.clone(),
                value: value.clone(),
                domain: domain.to_string(),
                path: "/".to_string(),
            })
        })
        .collect()
}

/// Render a browser cookie jar as a `Cookie` request header value.
pub fn cookie_header(cookies: &[BrowserCookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}
