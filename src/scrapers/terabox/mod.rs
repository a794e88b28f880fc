//! TeraBox share-link resolver.
//!
//! Each attempt loads the share page in a fresh browser, classifies it, and
//! runs the extraction strategies. Classified pages (expired, password,
//! missing, login) end the resolve immediately; anything else is retried
//! with a linear backoff until the attempts run out.

mod classify;
mod extract;
mod hosts;

pub use classify::classify;
pub use extract::{extract, Extraction, Strategy, FILE_INFO_PROBE};
pub use hosts::{
    is_provider_url, normalize_share_url, BARE_COOKIE_NAME, CANONICAL_DOMAIN, COOKIE_DOMAINS,
    PROVIDER_ALIASES, PROVIDER_DOMAINS,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::models::ResolveResult;
use crate::scrapers::browser::{
    cookie_header, cookies_for_domains, parse_cookie_string, CaptureRequest, Fingerprint,
    PageCapture, PageCapturer,
};
use crate::services::resolver::LinkResolver;

/// Base of the linear backoff between attempts.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Resolves TeraBox share links through a [`PageCapturer`].
pub struct TeraboxResolver<C> {
    capturer: C,
    max_attempts: u32,
    backoff: Duration,
    jobs: Arc<Semaphore>,
}

impl<C: PageCapturer> TeraboxResolver<C> {
    /// `jobs` bounds how many browser sessions run at once across the process.
    pub fn new(capturer: C, max_attempts: u32, jobs: Arc<Semaphore>) -> Self {
        Self {
            capturer,
            max_attempts: max_attempts.max(1),
            backoff: DEFAULT_BACKOFF,
            jobs,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn resolve(
        &self,
        url: &str,
        cookie: Option<&str>,
    ) -> Result<ResolveResult, ResolveError> {
        let share_url = normalize_share_url(url);
        let pairs = cookie
            .map(|raw| parse_cookie_string(raw, BARE_COOKIE_NAME))
            .unwrap_or_default();
        let cookies = cookies_for_domains(&pairs, COOKIE_DOMAINS);

        info!("Resolving share link {}", share_url);
        if !pairs.is_empty() {
            debug!("Using {} session cookie(s)", pairs.len());
        }

        for attempt in 1..=self.max_attempts {
            let fingerprint = Fingerprint::random();
            debug!(
                "Attempt {}/{} as {}",
                attempt, self.max_attempts, fingerprint.user_agent
            );

            let captured = {
                let _permit = self
                    .jobs
                    .acquire()
                    .await
                    .map_err(|_| ResolveError::exhausted())?;
                self.capturer
                    .capture(CaptureRequest {
                        url: &share_url,
                        fingerprint: &fingerprint,
                        cookies: &cookies,
                        probe_script: Some(FILE_INFO_PROBE),
                    })
                    .await
            };

            match captured {
                Ok(page) => {
                    if let Some(error) = classify(&page) {
                        warn!("Share page {} classified: {}", share_url, error);
                        return Err(error);
                    }

                    if let Some((strategy, hit)) = extract(&page) {
                        info!(
                            "Extracted {} via {} on attempt {}",
                            hit.filename,
                            strategy.name(),
                            attempt
                        );
                        return Ok(build_result(&share_url, &fingerprint, &page, hit));
                    }

                    warn!(
                        "Attempt {}/{}: no extraction strategy matched",
                        attempt, self.max_attempts
                    );
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {:#}", attempt, self.max_attempts, e);
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff * attempt).await;
            }
        }

        Err(ResolveError::exhausted())
    }
}

fn build_result(
    share_url: &str,
    fingerprint: &Fingerprint,
    page: &PageCapture,
    hit: Extraction,
) -> ResolveResult {
    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), fingerprint.user_agent.clone());
    headers.insert("Cookie".to_string(), cookie_header(&page.cookies));
    headers.insert("Referer".to_string(), share_url.to_string());

    ResolveResult {
        direct_url: Some(hit.direct_url),
        webpage_url: share_url.to_string(),
        title: hit.filename.clone(),
        filename: hit.filename,
        size_bytes: hit.size,
        thumbnail: None,
        formats: Vec::new(),
        headers,
    }
}

#[async_trait]
impl<C: PageCapturer> LinkResolver for TeraboxResolver<C> {
    async fn resolve(
        &self,
        url: &str,
        cookie: Option<&str>,
    ) -> Result<ResolveResult, ResolveError> {
        TeraboxResolver::resolve(self, url, cookie).await
    }
}
