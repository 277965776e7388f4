use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Otodom,
    NieruchomosciOnline,
    Gratka,
}

impl Site {
    /// Sites in the order the batch job visits them.
    pub const ALL: [Site; 3] = [Site::Otodom, Site::NieruchomosciOnline, Site::Gratka];

    pub fn name(&self) -> &'static str {
        match self {
            Site::Otodom => "otodom",
            Site::NieruchomosciOnline => "nieruchomosci-online",
            Site::Gratka => "gratka",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Links found on one results page, and whether the result set ends here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub links: HashSet<String>,
    pub is_last_page: bool,
}

impl PageResult {
    pub fn more(links: HashSet<String>) -> Self {
        Self {
            links,
            is_last_page: false,
        }
    }

    pub fn last(links: HashSet<String>) -> Self {
        Self {
            links,
            is_last_page: true,
        }
    }

    /// A page past the end of the results: nothing on it, stop here.
    pub fn exhausted() -> Self {
        Self::last(HashSet::new())
    }
}
