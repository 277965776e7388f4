use crate::common_scraper::{selector, PlatformScraper};
use crate::error::ScrapeError;
use crate::models::{PageResult, Site};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::debug;

const OTODOM_DOMAIN: &str = "https://www.otodom.pl";
const SUPPLEMENT_MARKER_ID: &str = "pie_searchSupplement";

pub fn scraper_for(site: Site) -> Box<dyn PlatformScraper> {
    match site {
        Site::Otodom => Box::new(OtodomScraper),
        Site::NieruchomosciOnline => Box::new(NieruchomosciOnlineScraper),
        Site::Gratka => Box::new(GratkaScraper),
    }
}

fn absolute_url(domain: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", domain, href)
    }
}

fn first_link<'a>(
    site: Site,
    element: ElementRef<'a>,
    what: &str,
) -> Result<&'a str, ScrapeError> {
    let anchor = element
        .select(&selector("a")?)
        .next()
        .ok_or_else(|| ScrapeError::page_structure(site.name(), format!("{} without a link", what)))?;
    anchor
        .value()
        .attr("href")
        .map(str::trim)
        .ok_or_else(|| ScrapeError::page_structure(site.name(), format!("{} link without href", what)))
}

/// otodom.pl renders results lazily, so the page is scrolled to the bottom
/// before parsing. Past the last page the organic results block disappears.
pub struct OtodomScraper;

impl PlatformScraper for OtodomScraper {
    fn site(&self) -> Site {
        Site::Otodom
    }

    fn page_url(&self, query: &str, page: usize) -> String {
        format!("{}&daysSinceCreated=7&limit=72&page={}", query, page)
    }

    fn needs_scrolling(&self) -> bool {
        true
    }

    fn parse_page(&self, html: &str) -> Result<PageResult, ScrapeError> {
        let document = Html::parse_document(html);

        let organic_selector = selector(r#"div[data-cy="search.listing.organic"]"#)?;
        let Some(organic) = document.select(&organic_selector).next() else {
            return Ok(PageResult::exhausted());
        };

        let mut links = HashSet::new();
        for item in organic.select(&selector(r#"div[data-cy="listing-item"]"#)?) {
            let href = first_link(self.site(), item, "listing item")?;
            links.insert(absolute_url(OTODOM_DOMAIN, href));
        }

        Ok(PageResult::more(links))
    }
}

/// nieruchomosci-online.pl pads the last page with "similar offers" after an
/// `h2#pie_searchSupplement` heading; everything after it is ignored.
pub struct NieruchomosciOnlineScraper;

impl PlatformScraper for NieruchomosciOnlineScraper {
    fn site(&self) -> Site {
        Site::NieruchomosciOnline
    }

    fn page_url(&self, query: &str, page: usize) -> String {
        format!("{}&p={}", query, page)
    }

    fn parse_page(&self, html: &str) -> Result<PageResult, ScrapeError> {
        let document = Html::parse_document(html);

        let tiles = document
            .select(&selector("div#tilesWrapper")?)
            .next()
            .ok_or_else(|| ScrapeError::page_structure(self.site().name(), "missing #tilesWrapper"))?;

        let name_selector = selector("h2.name")?;
        let mut links = HashSet::new();
        let mut reached_supplement = false;

        for tile in tiles.children().filter_map(ElementRef::wrap) {
            match tile.value().name() {
                "div" if tile.value().classes().any(|c| c == "column-container") => {
                    for holder in tile.select(&name_selector) {
                        links.insert(first_link(self.site(), holder, "tile name")?.to_string());
                    }
                }
                "h2" => {
                    let id = tile.value().attr("id").ok_or_else(|| {
                        ScrapeError::page_structure(self.site().name(), "tile heading without id")
                    })?;
                    if id == SUPPLEMENT_MARKER_ID {
                        reached_supplement = true;
                        break;
                    }
                }
                _ => {}
            }
        }

        let is_last_page = links.is_empty() || reached_supplement;
        Ok(PageResult {
            links,
            is_last_page,
        })
    }
}

pub struct GratkaScraper;

impl PlatformScraper for GratkaScraper {
    fn site(&self) -> Site {
        Site::Gratka
    }

    fn page_url(&self, query: &str, page: usize) -> String {
        format!("{}&page={}", query, page)
    }

    fn parse_page(&self, html: &str) -> Result<PageResult, ScrapeError> {
        let document = Html::parse_document(html);

        let mut links = HashSet::new();
        for teaser in document.select(&selector("a.teaserLink")?) {
            let href = teaser.value().attr("href").map(str::trim).ok_or_else(|| {
                ScrapeError::page_structure(self.site().name(), "teaser link without href")
            })?;
            debug!("{}", href);
            links.insert(href.to_string());
        }

        if links.is_empty() {
            return Ok(PageResult::exhausted());
        }
        Ok(PageResult::more(links))
    }
}
