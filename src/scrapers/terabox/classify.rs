//! Share-page classification.

use crate::error::ResolveError;
use crate::scrapers::browser::PageCapture;

/// Check a settled share page for the terminal conditions, in priority order.
///
/// Returns `None` when the page looks like a live share and extraction
/// should run.
pub fn classify(page: &PageCapture) -> Option<ResolveError> {
    let content = &page.content;

    if content.contains("Extract code") || content.contains("input-code") {
        return Some(ResolveError::PasswordProtected);
    }

    if content.contains("The link has expired") {
        return Some(ResolveError::LinkExpired);
    }

    if content.contains("we can\u{2019}t find the page")
        || content.contains("we can't find the page")
        || page.title.contains("404")
    {
        return Some(ResolveError::LinkNotFound);
    }

    let final_url = page.final_url.to_lowercase();
    if final_url.contains("passport.terabox.com") || final_url.contains("login") {
        return Some(ResolveError::LoginRequired);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(final_url: &str, title: &str, content: &str) -> PageCapture {
        PageCapture {
            final_url: final_url.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    const SHARE: &str = "https://1024tera.com/s/1abc";

    #[test]
    fn test_live_page() {
        assert_eq!(classify(&page(SHARE, "clip.mp4 - Share Files", "<html></html>")), None);
    }

    #[test]
    fn test_each_condition() {
        assert_eq!(
            classify(&page(SHARE, "", "<div class=\"input-code\"></div>")),
            Some(ResolveError::PasswordProtected)
        );
        assert_eq!(
            classify(&page(SHARE, "", "<p>The link has expired</p>")),
            Some(ResolveError::LinkExpired)
        );
        assert_eq!(
            classify(&page(SHARE, "", "Sorry, we can\u{2019}t find the page")),
            Some(ResolveError::LinkNotFound)
        );
        assert_eq!(
            classify(&page(SHARE, "404 Not Found", "")),
            Some(ResolveError::LinkNotFound)
        );
        assert_eq!(
            classify(&page("https://passport.terabox.com/?next=x", "", "")),
            Some(ResolveError::LoginRequired)
        );
        assert_eq!(
            classify(&page("https://1024tera.com/LOGIN", "", "")),
            Some(ResolveError::LoginRequired)
        );
    }

    #[test]
    fn test_priority_order() {
        // Password prompt wins over every later condition
        let everything = page(
            "https://passport.terabox.com/login",
            "404",
            "Extract code. The link has expired",
        );
        assert_eq!(classify(&everything), Some(ResolveError::PasswordProtected));

        let expired_and_missing = page(SHARE, "404", "The link has expired");
        assert_eq!(classify(&expired_and_missing), Some(ResolveError::LinkExpired));

        let missing_on_login = page("https://1024tera.com/login", "404", "");
        assert_eq!(classify(&missing_on_login), Some(ResolveError::LinkNotFound));
    }
}
