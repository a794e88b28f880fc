//! teradrop - share-link and video-page resolver.
//!
//! Resolves TeraBox share links (through a headless browser) and generic
//! video pages (through yt-dlp) into downloadable media, and serves the
//! result over a small HTTP API.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if teradrop::cli::is_verbose() {
        "teradrop=debug"
    } else {
        "teradrop=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    teradrop::cli::run().await
}
