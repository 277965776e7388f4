use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The rendered page is missing an element the site always serves.
    #[error("unexpected {site} page structure: {reason}")]
    PageStructure { site: &'static str, reason: String },

    #[error("failed to parse selector `{0}`")]
    Selector(String),
}

impl ScrapeError {
    pub fn page_structure(site: &'static str, reason: impl Into<String>) -> Self {
        ScrapeError::PageStructure {
            site,
            reason: reason.into(),
        }
    }
}
