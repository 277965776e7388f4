use crate::browser::BrowserSession;
use crate::common_scraper::{ScrapingOptions, SiteRun};
use crate::config::Queries;
use crate::models::Site;
use crate::persistence::Persistence;
use crate::progress::Progress;
use crate::scrapers::scraper_for;
use anyhow::Result;
use chrono::Local;
use std::collections::HashSet;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub queries: Queries,
    pub skip: HashSet<Site>,
    pub scraping: ScrapingOptions,
}

/// Scrape every enabled site in turn, one browser session per site.
pub fn scrape_all_sites(
    options: &RunOptions,
    open_session: &mut dyn FnMut(Site) -> Result<Box<dyn BrowserSession>>,
    progress: &mut Progress,
) -> Result<HashSet<String>> {
    let mut offers = HashSet::new();

    for site in Site::ALL {
        if options.skip.contains(&site) {
            progress.skipped_site(site.name())?;
            continue;
        }

        let queries = options.queries.for_site(site);
        if queries.is_empty() {
            info!("No queries configured for {}", site);
            continue;
        }

        let session = open_session(site)?;
        let mut run = SiteRun::begin(scraper_for(site), session, progress)?;
        for query in queries {
            let found = run.scrape(query, &options.scraping)?;
            info!("{} offers from {}", found.len(), query);
            offers.extend(found);
        }
    }

    Ok(offers)
}

/// The whole batch job: scrape everything, then record what is new. Nothing
/// is written unless every site finished cleanly.
pub fn run(
    options: &RunOptions,
    persistence: &Persistence,
    open_session: &mut dyn FnMut(Site) -> Result<Box<dyn BrowserSession>>,
    progress: &mut Progress,
) -> Result<Vec<String>> {
    progress.run_started(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string())?;

    let offers = scrape_all_sites(options, open_session, progress)?;
    let recorded = persistence.update(&offers)?;

    progress.recorded(recorded.len())?;
    Ok(recorded)
}
