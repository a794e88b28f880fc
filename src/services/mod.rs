//! Service layer for teradrop.
//!
//! Resolution, processing and cookie persistence live here so the CLI and
//! the web server share one implementation.

pub mod cookie_store;
pub mod generic;
pub mod processing;
pub mod resolver;
pub mod ytdlp;

pub use cookie_store::CookieStore;
pub use generic::GenericResolver;
pub use processing::{MediaProcessor, YtDlpProcessor};
pub use resolver::{Dispatcher, LinkResolver};
pub use ytdlp::YtDlp;

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::Settings;
use crate::scrapers::{BrowserFetcher, TeraboxResolver};

/// Everything a front end needs, wired from settings.
#[derive(Clone)]
pub struct Services {
    pub resolver: Arc<dyn LinkResolver>,
    pub processor: Arc<dyn MediaProcessor>,
    pub cookies: CookieStore,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> Self {
        // Browser sessions and merges draw from one pool
        let jobs = Arc::new(Semaphore::new(settings.max_concurrent_jobs.max(1)));

        let ytdlp = YtDlp::locate(settings.ytdlp_path.as_deref())
            .with_ffmpeg_location(settings.ffmpeg_location.clone())
            .with_proxy(settings.browser.proxy.clone());

        let share = TeraboxResolver::new(
            BrowserFetcher::new(settings.browser.clone()),
            settings.browser.max_attempts,
            jobs.clone(),
        );
        let generic = GenericResolver::new(ytdlp.clone());

        Self {
            resolver: Arc::new(Dispatcher::new(Arc::new(share), Arc::new(generic))),
            processor: Arc::new(YtDlpProcessor::new(
                ytdlp,
                settings.downloads_dir.clone(),
                jobs,
            )),
            cookies: CookieStore::new(&settings.cookie_file),
        }
    }
}
