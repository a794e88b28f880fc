//! TeraBox mirror domains and share-URL normalization.

use url::Url;

/// Name fragments that mark a TeraBox share link, wherever they appear in
/// the host or path.
pub const PROVIDER_ALIASES: &[&str] = &[
    "terabox",
    "1024tera",
    "terashare",
    "terafileshare",
    "miracledown",
];

/// Mirrors that are rewritten onto [`CANONICAL_DOMAIN`] before loading.
pub const PROVIDER_DOMAINS: &[&str] = &[
    "terabox.com",
    "terabox.app",
    "teraboxapp.com",
    "1024tera.com",
    "1024terabox.com",
    "terasharefile.com",
    "terafileshare.com",
    "freeterabox.com",
    "teraboxlink.com",
    "miracledown.com",
];

/// Mirror every share link is rewritten to before loading.
pub const CANONICAL_DOMAIN: &str = "1024tera.com";

/// Domains each supplied cookie is set for.
pub const COOKIE_DOMAINS: &[&str] = &[".terabox.com", ".1024tera.com"];

/// Cookie name for a credential given as a bare token.
pub const BARE_COOKIE_NAME: &str = "ndus";

fn contains_alias(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    PROVIDER_ALIASES.iter().any(|alias| text.contains(alias))
}

/// Parse user input as a URL, assuming `https://` when no scheme was pasted.
fn parse_lenient(url: &str) -> Option<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains("://") {
        return Url::parse(trimmed).ok();
    }
    Url::parse(&format!("https://{}", trimmed)).ok()
}

/// Mirror domain `host` belongs to, if any.
fn provider_domain(host: &str) -> Option<&'static str> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    PROVIDER_DOMAINS.iter().copied().find(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Whether `url` is a TeraBox share link: its host or path names a provider
/// alias, in any case. Input that does not parse is checked as plain text.
pub fn is_provider_url(url: &str) -> bool {
    match parse_lenient(url) {
        Some(parsed) => {
            parsed.host_str().is_some_and(contains_alias) || contains_alias(parsed.path())
        }
        None => contains_alias(url),
    }
}

/// Rewrite a mirror share URL onto [`CANONICAL_DOMAIN`].
///
/// Scheme, subdomain, path and query are kept; a missing scheme becomes
/// `https`. Hosts outside [`PROVIDER_DOMAINS`] keep their domain.
pub fn normalize_share_url(url: &str) -> String {
    let trimmed = url.trim();
    let Some(mut parsed) = parse_lenient(trimmed) else {
        return trimmed.to_string();
    };

    let Some(host) = parsed
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
    else {
        return trimmed.to_string();
    };
    let Some(domain) = provider_domain(&host) else {
        return parsed.to_string();
    };

    let prefix = &host[..host.len() - domain.len()];
    let canonical = format!("{}{}", prefix, CANONICAL_DOMAIN);
    if parsed.set_host(Some(canonical.as_str())).is_err() {
        return trimmed.to_string();
    }
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_hosts() {
        assert!(is_provider_url("https://terabox.com/s/1abc"));
        assert!(is_provider_url("https://www.TeraBox.App/s/1abc"));
        assert!(is_provider_url("http://dm.1024terabox.com/sharing/link?surl=x"));
        assert!(is_provider_url("https://MiracleDown.com/s/1x"));
        assert!(is_provider_url("  https://teraboxlink.com/s/1x  "));
        assert!(is_provider_url("https://terasharefile.com/s/1x"));
    }

    #[test]
    fn test_schemeless_share_links() {
        assert!(is_provider_url("terabox.com/s/1abc"));
        assert!(is_provider_url("www.1024tera.com/s/1abc"));
        assert!(is_provider_url("TERABOXAPP.COM/s/1abc"));
    }

    #[test]
    fn test_unlisted_mirrors() {
        assert!(is_provider_url("https://www.terabox.fun/s/1abc"));
        assert!(is_provider_url("https://teraboxshare.com/s/1abc"));
        assert!(is_provider_url("https://www.terabox.club/s/1abc"));
        assert!(is_provider_url("https://teraboxurl.com/s/1zdtsNGLVL1C7TMpKcn6JzA"));
    }

    #[test]
    fn test_alias_in_path() {
        assert!(is_provider_url("https://example.com/TeraBox.com/s/1a"));
    }

    #[test]
    fn test_other_urls_are_not_providers() {
        assert!(!is_provider_url("https://www.youtube.com/watch?v=abc"));
        assert!(!is_provider_url("https://vimeo.com/12345"));
        assert!(!is_provider_url("not a url"));
        assert!(!is_provider_url(""));
    }

    #[test]
    fn test_normalize_rewrites_mirror() {
        assert_eq!(
            normalize_share_url("https://www.terabox.com/s/1abc?pwd=x"),
            "https://www.1024tera.com/s/1abc?pwd=x"
        );
        assert_eq!(
            normalize_share_url("https://teraboxapp.com/sharing/link?surl=abc"),
            "https://1024tera.com/sharing/link?surl=abc"
        );
        assert_eq!(
            normalize_share_url("https://1024tera.com/s/1abc"),
            "https://1024tera.com/s/1abc"
        );
    }

    #[test]
    fn test_normalize_adds_scheme() {
        assert_eq!(
            normalize_share_url("terabox.com/s/1abc"),
            "https://1024tera.com/s/1abc"
        );
    }

    #[test]
    fn test_normalize_keeps_unlisted_hosts() {
        assert_eq!(
            normalize_share_url("https://www.terabox.fun/s/1abc"),
            "https://www.terabox.fun/s/1abc"
        );
        assert_eq!(
            normalize_share_url("https://example.com/s/1abc"),
            "https://example.com/s/1abc"
        );
        assert_eq!(normalize_share_url("not a url"), "not a url");
    }
}
