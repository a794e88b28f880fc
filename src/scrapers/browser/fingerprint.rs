//! Browser identity presented to the target site.

/// Real browser user agents for impersonation.
pub const IMPERSONATE_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Desktop viewports to pick from.
const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1536, 864), (1440, 900), (1366, 768)];

/// User agent, viewport, locale and timezone for one browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub accept_language: String,
    pub timezone: String,
}

impl Fingerprint {
    /// Pick a random user agent and viewport.
    pub fn random() -> Self {
        let seed = seed();
        Self {
            user_agent: IMPERSONATE_USER_AGENTS[seed % IMPERSONATE_USER_AGENTS.len()].to_string(),
            viewport: VIEWPORTS[(seed / 7) % VIEWPORTS.len()],
            accept_language: "en-US,en".to_string(),
            timezone: "America/New_York".to_string(),
        }
    }
}

fn seed() -> usize {
    use std::time::SystemTime;
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_fingerprint_is_from_lists() {
        let fp = Fingerprint::random();
        assert!(IMPERSONATE_USER_AGENTS.contains(&fp.user_agent.as_str()));
        assert!(VIEWPORTS.contains(&fp.viewport));
        assert_eq!(fp.timezone, "America/New_York");
    }
}
