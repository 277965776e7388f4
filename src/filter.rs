use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Localities around Kraków whose listings are never worth watching.
const DEFAULT_EXCLUDED_LOCALITIES: &[&str] = &[
    "grabie", "tyniec", "huta", "skawina", "zielonki", "bielany",
    "sygneczow", "giebultow", "kozmice", "piekary", "rzaska", "szyce",
    "wielka-wies", "maslomiaca", "michalowice", "zabierzow", "modlniczka",
    "gorna-wies", "zelkow", "konary", "bronowice", "batowice", "gaj",
    "bosutow", "kryspinow", "zabawa", "mogiany", "rusiecki", "mogilany",
    "maciejowice", "cholerzyn", "tomaszkowice", "tomaszowice", "bibice",
    "lusina", "rzeszotary", "sciejowice", "modlnica", "baranowka",
    "dojazdow", "grebalow",
];

/// Rejects listing URLs containing any of a set of tokens. Matching is a
/// plain case-sensitive substring test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionFilter {
    tokens: Vec<String>,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_LOCALITIES.iter().map(|t| t.to_string()))
    }
}

impl ExclusionFilter {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }

    /// One token per line. Blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read exclusion list: {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#'))
                .map(str::to_string),
        )
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn allows(&self, url: &str) -> bool {
        !self.tokens.iter().any(|token| url.contains(token.as_str()))
    }
}
