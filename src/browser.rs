use anyhow::{anyhow, Context, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// A rendering backend the pagination engine drives one page at a time.
pub trait BrowserSession {
    fn goto(&mut self, url: &str) -> Result<()>;
    fn scroll_height(&mut self) -> Result<i64>;
    fn scroll_to_bottom(&mut self) -> Result<()>;
    fn page_source(&mut self) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Headless Chrome, runs the page's JavaScript
    Chrome,
    /// Plain HTTP GET, server-rendered markup only
    Http,
}

pub fn open_session(backend: Backend) -> Result<Box<dyn BrowserSession>> {
    match backend {
        Backend::Chrome => Ok(Box::new(ChromeSession::launch()?)),
        Backend::Http => Ok(Box::new(HttpSession::new()?)),
    }
}

/// Headless Chrome over the DevTools protocol. The protocol is async, so the
/// session owns a current-thread runtime and blocks on every call.
pub struct ChromeSession {
    page: Page,
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    // Dropped last; the handles above belong to it.
    runtime: Runtime,
}

impl ChromeSession {
    pub fn launch() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build runtime for the browser session")?;

        let (browser, page, handler) = runtime.block_on(async {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(30))
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .build()
                .map_err(|e| anyhow!("Invalid browser config: {}", e))?;

            info!("Launching headless Chrome");
            let (browser, mut events) = Browser::launch(config)
                .await
                .context("Failed to launch headless Chrome")?;

            let handler = tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .context("Failed to open browser tab")?;
            page.set_user_agent(USER_AGENT)
                .await
                .context("Failed to set user agent")?;

            Ok::<_, anyhow::Error>((browser, page, handler))
        })?;

        Ok(Self {
            page,
            browser: Some(browser),
            handler,
            runtime,
        })
    }

    fn evaluate_i64(&mut self, script: &str) -> Result<i64> {
        let result = self
            .runtime
            .block_on(self.page.evaluate(script))
            .with_context(|| format!("Failed to evaluate `{}`", script))?;
        result
            .into_value::<i64>()
            .with_context(|| format!("`{}` did not return an integer", script))
    }

    /// Shut the browser down. Also runs on drop; calling it twice is harmless.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut browser) = self.browser.take() {
            debug!("Closing headless Chrome");
            self.runtime.block_on(async {
                browser.close().await.context("Failed to close browser")?;
                browser.wait().await.context("Browser did not exit")?;
                Ok::<_, anyhow::Error>(())
            })?;
        }
        self.handler.abort();
        Ok(())
    }
}

impl BrowserSession for ChromeSession {
    fn goto(&mut self, url: &str) -> Result<()> {
        self.runtime
            .block_on(self.page.goto(url))
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    fn scroll_height(&mut self) -> Result<i64> {
        self.evaluate_i64("document.body.scrollHeight")
    }

    fn scroll_to_bottom(&mut self) -> Result<()> {
        self.runtime
            .block_on(self.page.evaluate("window.scrollTo(0, document.body.scrollHeight);"))
            .context("Failed to scroll page")?;
        Ok(())
    }

    fn page_source(&mut self) -> Result<String> {
        self.runtime
            .block_on(self.page.content())
            .context("Failed to read page source")
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error while closing browser: {:#}", e);
        }
    }
}

/// Fetches pages without rendering them. Scrolling is a no-op, so the scroll
/// loop sees a constant height and returns after one attempt.
pub struct HttpSession {
    client: reqwest::blocking::Client,
    body: Option<String>,
}

impl HttpSession {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, body: None })
    }
}

impl BrowserSession for HttpSession {
    fn goto(&mut self, url: &str) -> Result<()> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to fetch {}: HTTP {}", url, response.status()));
        }

        self.body = Some(response.text().context("Failed to read response body")?);
        Ok(())
    }

    fn scroll_height(&mut self) -> Result<i64> {
        Ok(0)
    }

    fn scroll_to_bottom(&mut self) -> Result<()> {
        Ok(())
    }

    fn page_source(&mut self) -> Result<String> {
        self.body
            .clone()
            .ok_or_else(|| anyhow!("No page loaded yet"))
    }
}
