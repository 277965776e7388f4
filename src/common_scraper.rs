use crate::browser::BrowserSession;
use crate::error::ScrapeError;
use crate::models::{PageResult, Site};
use crate::progress::Progress;
use anyhow::{Context, Result};
use scraper::Selector;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    /// Pause after each scroll before measuring the page height again.
    pub settle_delay: Duration,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// Everything that differs between listing sites. The pagination loop in
/// [`scrape_listings`] is shared.
pub trait PlatformScraper {
    fn site(&self) -> Site;

    /// Search-results URL for a 1-based page number.
    fn page_url(&self, query: &str, page: usize) -> String;

    /// Sites that lazy-load results on scroll need the page scrolled to the
    /// bottom before the markup is complete.
    fn needs_scrolling(&self) -> bool {
        false
    }

    /// Extract listing links and decide whether this is the last page.
    fn parse_page(&self, html: &str) -> Result<PageResult, ScrapeError>;
}

pub(crate) fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css.to_string()))
}

/// Scroll to the bottom until the document stops growing.
pub fn keep_scrolling(session: &mut dyn BrowserSession, settle_delay: Duration) -> Result<()> {
    let mut last_height = session.scroll_height()?;

    loop {
        session.scroll_to_bottom()?;
        std::thread::sleep(settle_delay);

        let new_height = session.scroll_height()?;
        debug!("Scroll height {} -> {}", last_height, new_height);
        if new_height == last_height {
            return Ok(());
        }
        last_height = new_height;
    }
}

/// Walk result pages from page 1 until the site reports the last one and
/// return every listing URL seen on the way.
pub fn scrape_listings(
    scraper: &dyn PlatformScraper,
    session: &mut dyn BrowserSession,
    query: &str,
    options: &ScrapingOptions,
    progress: &mut Progress,
) -> Result<HashSet<String>> {
    let mut listing_links = HashSet::new();
    let mut page = 1;

    loop {
        progress.page(page, query)?;
        let url = scraper.page_url(query, page);

        session.goto(&url)?;
        if scraper.needs_scrolling() {
            keep_scrolling(session, options.settle_delay)?;
        }
        let html = session.page_source()?;

        let result = scraper
            .parse_page(&html)
            .with_context(|| format!("Failed to parse {}", url))?;
        debug!(
            "{} page {}: {} links, last page: {}",
            scraper.site(),
            page,
            result.links.len(),
            result.is_last_page
        );

        listing_links.extend(result.links);
        if result.is_last_page {
            break;
        }
        page += 1;
    }

    Ok(listing_links)
}

/// One site's scraping run. Holds the browser session for as long as the
/// run lives and prints the closing banner however the run ends.
pub struct SiteRun<'a> {
    scraper: Box<dyn PlatformScraper>,
    session: Box<dyn BrowserSession>,
    progress: &'a mut Progress,
}

impl<'a> SiteRun<'a> {
    pub fn begin(
        scraper: Box<dyn PlatformScraper>,
        session: Box<dyn BrowserSession>,
        progress: &'a mut Progress,
    ) -> Result<Self> {
        progress.begin_site(scraper.site().name())?;
        Ok(Self {
            scraper,
            session,
            progress,
        })
    }

    pub fn scrape(&mut self, query: &str, options: &ScrapingOptions) -> Result<HashSet<String>> {
        self.progress.query(query)?;
        scrape_listings(
            self.scraper.as_ref(),
            self.session.as_mut(),
            query,
            options,
            self.progress,
        )
    }
}

impl Drop for SiteRun<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.progress.finish_site(self.scraper.site().name()) {
            warn!("Failed to write progress: {}", e);
        }
    }
}
