//! Routing of input URLs to the resolver that handles them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ResolveError;
use crate::models::ResolveResult;
use crate::scrapers::terabox::is_provider_url;

/// Turns a user-supplied URL into downloadable media metadata.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, url: &str, cookie: Option<&str>)
        -> Result<ResolveResult, ResolveError>;
}

/// Sends anything naming a TeraBox alias to the share-page scraper and
/// everything else to the generic extractor.
pub struct Dispatcher {
    share: Arc<dyn LinkResolver>,
    generic: Arc<dyn LinkResolver>,
}

impl Dispatcher {
    pub fn new(share: Arc<dyn LinkResolver>, generic: Arc<dyn LinkResolver>) -> Self {
        Self { share, generic }
    }
}

#[async_trait]
impl LinkResolver for Dispatcher {
    async fn resolve(
        &self,
        url: &str,
        cookie: Option<&str>,
    ) -> Result<ResolveResult, ResolveError> {
        if is_provider_url(url) {
            debug!("Routing {} to the share-page resolver", url);
            self.share.resolve(url, cookie).await
        } else {
            debug!("Routing {} to yt-dlp", url);
            self.generic.resolve(url, None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        name: &'static str,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl LinkResolver for Recorder {
        async fn resolve(
            &self,
            url: &str,
            cookie: Option<&str>,
        ) -> Result<ResolveResult, ResolveError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), cookie.map(str::to_string)));
            Ok(ResolveResult {
                direct_url: None,
                webpage_url: url.to_string(),
                title: self.name.to_string(),
                filename: format!("{}.mp4", self.name),
                size_bytes: 0,
                thumbnail: None,
                formats: vec![],
                headers: HashMap::new(),
            })
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<Recorder>, Arc<Recorder>) {
        let share = Arc::new(Recorder {
            name: "share",
            ..Default::default()
        });
        let generic = Arc::new(Recorder {
            name: "generic",
            ..Default::default()
        });
        (
            Dispatcher::new(share.clone(), generic.clone()),
            share,
            generic,
        )
    }

    #[tokio::test]
    async fn test_mirrors_route_to_share_resolver() {
        let (dispatcher, share, generic) = dispatcher();
        for url in [
            "https://terabox.com/s/1a",
            "https://WWW.TERABOXAPP.COM/s/1a",
            "https://dm.1024tera.com/s/1a",
            "https://freeterabox.com/s/1a",
            "https://www.miracledown.com/s/1a",
            "terabox.com/s/1a",
            "https://www.terabox.fun/s/1a",
            "https://teraboxshare.com/s/1a",
            "https://example.com/terabox.com/s/1a",
        ] {
            let result = dispatcher.resolve(url, Some("tok")).await.unwrap();
            assert_eq!(result.title, "share", "{}", url);
        }
        assert_eq!(share.calls.lock().unwrap().len(), 9);
        assert_eq!(share.calls.lock().unwrap()[0].1.as_deref(), Some("tok"));
        assert!(generic.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_urls_route_to_generic() {
        let (dispatcher, share, generic) = dispatcher();
        for url in [
            "https://www.youtube.com/watch?v=abc123",
            "https://vimeo.com/76979871",
            "not even a url",
        ] {
            let result = dispatcher.resolve(url, Some("tok")).await.unwrap();
            assert_eq!(result.title, "generic", "{}", url);
        }
        assert!(share.calls.lock().unwrap().is_empty());
        // Cookies are only meaningful to the share resolver
        assert!(generic.calls.lock().unwrap().iter().all(|(_, c)| c.is_none()));
    }
}
