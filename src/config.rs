use crate::models::Site;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SEEN_FILE: &str = "seen.txt";
pub const DEFAULT_WATCH_FILE: &str = "watch.txt";

/// Search-results URLs per site. Pagination parameters are appended by the
/// site scrapers, so each query must already carry a `?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queries {
    #[serde(default)]
    pub otodom: Vec<String>,
    #[serde(default)]
    pub nieruchomosci_online: Vec<String>,
    #[serde(default)]
    pub gratka: Vec<String>,
}

impl Default for Queries {
    fn default() -> Self {
        Self {
            otodom: vec![
                "https://www.otodom.pl/pl/wyniki/sprzedaz/dom/wiele-lokalizacji?ownerTypeSingleSelect=ALL&distanceRadius=0&locations=%5Bmalopolskie%2Fkrakow%2Fkrakow%2Fkrakow%2Cmalopolskie%2Fwielicki%2Fwieliczka%2Fsledziejowice%2Cmalopolskie%2Fwielicki%2Fwieliczka%2Fczarnochowice%2Cmalopolskie%2Fwielicki%2Fwieliczka%2Cmalopolskie%2Fkrakowski%2Fskawina%5D&priceMax=1700000&areaMin=70&areaMax=170&viewType=listing".to_string(),
                "https://www.otodom.pl/pl/wyniki/sprzedaz/inwestycja/wiele-lokalizacji?distanceRadius=0&limit=36&priceMax=1400000&locations=%5Bmalopolskie%2Fwielicki%2Fwieliczka%2Cmalopolskie%2Fkrakowski%2Fskawina%2Cmalopolskie%2Fkrakow%2Fkrakow%2Fkrakow%2Cmalopolskie%2Fwielicki%2Fwieliczka%2Fczarnochowice%2Cmalopolskie%2Fwielicki%2Fwieliczka%2Fsledziejowice%5D&investmentEstateType=HOUSES&by=DEFAULT&direction=DESC&viewType=listing".to_string(),
            ],
            nieruchomosci_online: vec![
                "https://wieliczka.nieruchomosci-online.pl/szukaj.html?3,dom,sprzedaz,,Wieliczka:32080,,,,-1700000,-150&q=gara%C5%BC".to_string(),
                "https://www.nieruchomosci-online.pl/szukaj.html?3,dom,sprzedaz,,Krak%C3%B3w:5600,,,,-1700000,-150&q=gara%C5%BC".to_string(),
                "https://www.nieruchomosci-online.pl/szukaj.html?3,mieszkanie,sprzedaz,,Wieliczka:32080,,,,-1300000,75,,,,,,4,,4,,,1,,,,,,1&q=gara%C5%BC".to_string(),
            ],
            gratka: vec![
                "https://gratka.pl/nieruchomosci/domy?typ-budynku[0]=wolnostojacy&typ-budynku[1]=blizniak&typ-budynku[2]=szeregowy&typ-budynku[3]=szeregowy-segment&stan-dom[0]=wykonczony&stan-dom[1]=do-wykonczenia&stan-dom[2]=do-remontu&stan-dom[3]=stan-surowy-zamkniety&powierzchnia-w-m2:max=170&powierzchnia-w-m2:min=70&cena-calkowita:max=1700000&rok-budowy:min=2000&lokalizacja[0]=34933&lokalizacja[1]=86187&lokalizacja[2]=86237&lokalizacja[3]=86233&lokalizacja[4]=86205&lokalizacja[5]=34749".to_string(),
            ],
        }
    }
}

impl Queries {
    /// Hardcoded queries, or the JSON file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse query file: {}", path.display()))
    }

    pub fn for_site(&self, site: Site) -> &[String] {
        match site {
            Site::Otodom => &self.otodom,
            Site::NieruchomosciOnline => &self.nieruchomosci_online,
            Site::Gratka => &self.gratka,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_queries_cover_every_site() {
        let queries = Queries::default();
        for site in Site::ALL {
            assert!(!queries.for_site(site).is_empty(), "no queries for {}", site);
            assert!(queries.for_site(site).iter().all(|q| q.contains('?')));
        }
    }

    #[test]
    fn query_file_may_omit_sites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.json");
        fs::write(&path, r#"{"gratka": ["https://gratka.pl/nieruchomosci/domy?x=1"]}"#).unwrap();

        let queries = Queries::load(Some(&path)).unwrap();

        assert!(queries.otodom.is_empty());
        assert!(queries.nieruchomosci_online.is_empty());
        assert_eq!(queries.for_site(Site::Gratka), &["https://gratka.pl/nieruchomosci/domy?x=1".to_string()]);
    }

    #[test]
    fn malformed_query_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.json");
        fs::write(&path, "[1, 2").unwrap();

        let err = Queries::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse query file"));
    }
}
