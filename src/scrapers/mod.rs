//! Share-page scrapers.

pub mod browser;
pub mod terabox;

pub use browser::{BrowserEngineConfig, BrowserEngineType, BrowserFetcher, PageCapturer};
pub use terabox::TeraboxResolver;
