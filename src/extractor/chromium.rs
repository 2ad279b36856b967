//! Chromium-based page extractor using chromiumoxide.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tracing::debug;

use super::{ExtractError, ExtractedImage, PageExtractor, IMAGE_SELECTOR};
use crate::config::Config;

/// How often to re-check for the image element while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. BINGRAB_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("BINGRAB_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.bingrab/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".bingrab/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".bingrab/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".bingrab/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".bingrab/chromium/chrome-linux64/chrome"),
                home.join(".bingrab/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    if let Ok(path) = which::which("google-chrome") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium-browser") {
        return Some(path);
    }

    // 4. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Extractor driving a headless Chromium instance.
pub struct ChromiumExtractor {
    browser: Browser,
    wait_timeout: Duration,
}

impl ChromiumExtractor {
    /// Launch a headless Chromium instance for the run.
    ///
    /// A missing browser binary is a fatal setup error.
    pub async fn launch(config: &Config) -> Result<Self> {
        let chrome_path = find_chromium().context(
            "Chromium not found. Install Chrome/Chromium or set BINGRAB_CHROMIUM_PATH.",
        )?;

        let browser_config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the handler task
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            wait_timeout: config.wait_timeout,
        })
    }

    async fn extract_on(&self, page: &Page, url: &str) -> Result<ExtractedImage, ExtractError> {
        tokio::time::timeout(self.wait_timeout, page.goto(url))
            .await
            .map_err(|_| ExtractError::WaitTimeout(self.wait_timeout))?
            .map_err(ExtractError::driver)?;

        // Poll for the image element until the wait budget runs out. The
        // element often appears only after client-side rendering settles.
        let deadline = Instant::now() + self.wait_timeout;
        let element = loop {
            match page.find_element(IMAGE_SELECTOR).await {
                Ok(el) => break el,
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(_) => return Err(ExtractError::WaitTimeout(self.wait_timeout)),
            }
        };

        let src = element
            .attribute("src")
            .await
            .map_err(ExtractError::driver)?
            // An <img> with no src cannot be downloaded; terminal miss.
            .ok_or(ExtractError::ElementNotFound)?;
        let alt = element
            .attribute("alt")
            .await
            .map_err(ExtractError::driver)?
            .filter(|a| !a.trim().is_empty());

        debug!(url, src = %src, "resolved image element");
        Ok(ExtractedImage { src, alt })
    }
}

#[async_trait]
impl PageExtractor for ChromiumExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedImage, ExtractError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(ExtractError::driver)?;

        let result = self.extract_on(&page, url).await;
        let _ = page.close().await;
        result
    }
}
