//! HTTP API for resolving, processing and downloading media.
//!
//! - `POST /api/resolve` turns a link into metadata and a `fileId`
//! - `POST /api/process` merges a chosen format into a local file
//! - `GET /api/download/:file_id` streams the local file or proxies the link

mod cache;
mod handlers;
mod proxy;
mod routes;

pub use cache::FileCache;
pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::Settings;
use crate::services::{CookieStore, LinkResolver, MediaProcessor, Services};
use crate::storage;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<dyn LinkResolver>,
    pub processor: Arc<dyn MediaProcessor>,
    pub cookies: CookieStore,
    pub cache: Arc<FileCache>,
    pub downloads_dir: PathBuf,
    /// Client for proxied downloads.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Self::with_services(Services::from_settings(settings), settings)
    }

    pub fn with_services(services: Services, settings: &Settings) -> anyhow::Result<Self> {
        let mut http = reqwest::Client::builder().connect_timeout(Duration::from_secs(30));
        if let Some(ref proxy) = settings.browser.proxy {
            http = http.proxy(reqwest::Proxy::all(proxy).context("Invalid proxy URL")?);
        }

        Ok(Self {
            resolver: services.resolver,
            processor: services.processor,
            cookies: services.cookies,
            cache: Arc::new(FileCache::new(
                Duration::from_secs(settings.cache_ttl_secs),
                settings.cache_capacity,
            )),
            downloads_dir: settings.downloads_dir.clone(),
            http: http.build().context("Failed to build HTTP client")?,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    storage::purge_partials(&settings.downloads_dir)
        .await
        .context("Failed to clean up partial downloads")?;

    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
