//! Headless browser capture for JavaScript-rendered share pages.
//!
//! Uses chromiumoxide (CDP) with stealth evasion techniques. Every capture
//! launches its own browser on a throwaway profile directory and closes it
//! before returning, so nothing carries over between attempts.

mod config;
mod cookies;
mod fingerprint;
mod stealth;
mod types;

pub use config::{BrowserEngineConfig, BrowserEngineType};
pub use cookies::{cookie_header, cookies_for_domains, parse_cookie_string, SessionCookie};
pub use fingerprint::Fingerprint;
pub use types::{BrowserCookie, CaptureRequest, PageCapture};

#[cfg(feature = "browser")]
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTimezoneOverrideParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::{GetCookiesParams, SetUserAgentOverrideParams};
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;

/// Loads a page in a browser and returns what it rendered.
#[async_trait]
pub trait PageCapturer: Send + Sync {
    async fn capture(&self, request: CaptureRequest<'_>) -> Result<PageCapture>;
}

/// Browser-based fetcher with stealth capabilities.
pub struct BrowserFetcher {
    config: BrowserEngineConfig,
}

impl BrowserFetcher {
    /// Create a new browser fetcher.
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Find Chrome executable.
    fn find_chrome(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.config.executable {
            return Ok(path.clone());
        }

        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or set browser.executable in the config file"
        ))
    }

    /// Launch a fresh browser on its own profile directory.
    async fn launch(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<(Browser, tokio::task::JoinHandle<()>, tempfile::TempDir)> {
        let chrome_path = self.find_chrome()?;
        let profile = tempfile::Builder::new()
            .prefix("teradrop-profile-")
            .tempdir()
            .context("Failed to create browser profile directory")?;

        info!("Launching browser (headless={})", self.config.headless);

        let (width, height) = fingerprint.viewport;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(profile.path())
            .window_size(width, height);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        for arg in stealth::STEALTH_ARGS {
            builder = builder.arg(*arg);
        }
        builder = builder.arg(format!("--lang={}", fingerprint.accept_language));

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handler_task, profile))
    }

    /// Present the fingerprint, stealth scripts and cookies on a blank page.
    async fn prepare_page(&self, page: &Page, request: &CaptureRequest<'_>) -> Result<()> {
        let fingerprint = request.fingerprint;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(fingerprint.user_agent.as_str())
            .accept_language(fingerprint.accept_language.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid user agent override: {}", e))?;
        page.execute(user_agent).await?;

        let (width, height) = fingerprint.viewport;
        page.execute(SetDeviceMetricsOverrideParams::new(
            width as i64,
            height as i64,
            1.0,
            false,
        ))
        .await?;

        if let Err(e) = page
            .execute(SetTimezoneOverrideParams::new(fingerprint.timezone.clone()))
            .await
        {
            debug!("Timezone override skipped: {}", e);
        }

        if self.config.engine == BrowserEngineType::Stealth {
            for script in stealth::STEALTH_SCRIPTS {
                if let Err(e) = page
                    .execute(AddScriptToEvaluateOnNewDocumentParams::new(script.to_string()))
                    .await
                {
                    debug!("Stealth script registration skipped: {}", e);
                }
            }
        }

        for cookie in request.cookies {
            match cookie.to_param() {
                Ok(param) => {
                    if let Err(e) = page.set_cookie(param).await {
                        warn!("Failed to set cookie {}: {}", cookie.name, e);
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        if !request.cookies.is_empty() {
            debug!("Injected {} cookies", request.cookies.len());
        }

        Ok(())
    }

    async fn capture_in(&self, browser: &Browser, request: &CaptureRequest<'_>) -> Result<PageCapture> {
        let page = browser.new_page("about:blank").await?;
        let result = self.capture_page(&page, request).await;
        // Close the page to prevent tab accumulation
        let _ = page.close().await;
        result
    }

    async fn capture_page(&self, page: &Page, request: &CaptureRequest<'_>) -> Result<PageCapture> {
        self.prepare_page(page, request).await?;

        info!("Navigating to {}", request.url);
        let nav_params = NavigateParams::builder()
            .url(request.url)
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid URL: {}", e))?;

        let nav_timeout = Duration::from_secs(self.config.timeout);
        tokio::time::timeout(nav_timeout, page.execute(nav_params))
            .await
            .map_err(|_| anyhow::anyhow!("Navigation timed out after {}s", self.config.timeout))??;

        let wait_for_ready_script = r#"
            new Promise((resolve) => {
                if (document.readyState === 'complete' || document.readyState === 'interactive') {
                    resolve(document.readyState);
                } else {
                    document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
                    setTimeout(() => resolve('timeout'), 10000);
                }
            })
        "#;

        match tokio::time::timeout(nav_timeout, page.evaluate(wait_for_ready_script.to_string()))
            .await
        {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state"),
        }

        // Client-side rendering races the content checks
        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        let final_url = page
            .url()
            .await?
            .map(|u| u.to_string())
            .unwrap_or_else(|| request.url.to_string());

        let title = match page.evaluate("document.title".to_string()).await {
            Ok(result) => result.into_value::<String>().unwrap_or_default(),
            Err(e) => {
                debug!("Could not read page title: {}", e);
                String::new()
            }
        };

        let content = page.content().await?;

        let probe = match request.probe_script {
            Some(script) => match page.evaluate(script.to_string()).await {
                Ok(result) => result
                    .into_value::<serde_json::Value>()
                    .ok()
                    .filter(|v| !v.is_null()),
                Err(e) => {
                    debug!("Probe script failed: {}", e);
                    None
                }
            },
            None => None,
        };

        let cookie_params = GetCookiesParams::builder()
            .urls(vec![final_url.clone()])
            .build();
        let browser_cookies = match page.execute(cookie_params).await {
            Ok(result) => result.result.cookies,
            Err(e) => {
                warn!(
                    "Failed to get cookies via CDP: {}, trying page.get_cookies()",
                    e
                );
                page.get_cookies().await.unwrap_or_default()
            }
        };
        debug!("Got {} cookies from browser", browser_cookies.len());

        let cookies = browser_cookies
            .iter()
            .map(|c| BrowserCookie {
                name: c.name.clone(),
                value: c.value.clone(),
                domain: c.domain.clone(),
                path: c.path.clone(),
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect();

        Ok(PageCapture {
            final_url,
            title,
            content,
            probe,
            cookies,
        })
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageCapturer for BrowserFetcher {
    async fn capture(&self, request: CaptureRequest<'_>) -> Result<PageCapture> {
        let (mut browser, handler_task, _profile) = self.launch(request.fingerprint).await?;

        let result = self.capture_in(&browser, &request).await;

        // The browser lives exactly as long as this capture
        if let Err(e) = browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageCapturer for BrowserFetcher {
    async fn capture(&self, _request: CaptureRequest<'_>) -> Result<PageCapture> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }
}
