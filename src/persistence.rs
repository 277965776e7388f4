use crate::filter::ExclusionFilter;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The two append-only ledgers: every offer ever seen, and the subset worth
/// watching. Neither file is ever rewritten, so readers may meet duplicate
/// lines if runs overlap.
pub struct Persistence {
    seen_file: PathBuf,
    watch_file: PathBuf,
    filter: ExclusionFilter,
}

impl Persistence {
    pub fn new(seen_file: impl Into<PathBuf>, watch_file: impl Into<PathBuf>, filter: ExclusionFilter) -> Self {
        Self {
            seen_file: seen_file.into(),
            watch_file: watch_file.into(),
            filter,
        }
    }

    /// Offers recorded by earlier runs. A missing ledger means a first run.
    pub fn load_seen(&self) -> Result<HashSet<String>> {
        let content = match fs::read_to_string(&self.seen_file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Seen file does not exist yet: {}", self.seen_file.display());
                return Ok(HashSet::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read seen file: {}", self.seen_file.display())
                })
            }
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Record offers not seen before and return those that passed the
    /// exclusion filter and went into the watch file.
    pub fn update(&self, offers: &HashSet<String>) -> Result<Vec<String>> {
        let seen = self.load_seen()?;

        // Same normalisation as load_seen, so a written line always matches
        // the offer it came from on the next run.
        let offers: HashSet<&str> = offers
            .iter()
            .map(|offer| offer.trim())
            .filter(|offer| !offer.is_empty())
            .collect();

        let mut new_offers: Vec<String> = offers
            .iter()
            .filter(|offer| !seen.contains(**offer))
            .map(|offer| offer.to_string())
            .collect();
        new_offers.sort();
        debug!(
            "{} scraped offers, {} already seen, {} new",
            offers.len(),
            offers.len() - new_offers.len(),
            new_offers.len()
        );

        // Seen goes first: if the watch append fails, the offer is lost to
        // the watch ledger rather than watched twice on the next run.
        append_lines(&self.seen_file, &new_offers)?;

        let watched: Vec<String> = new_offers
            .into_iter()
            .filter(|offer| {
                let allowed = self.filter.allows(offer);
                if !allowed {
                    debug!("Excluded by locality: {}", offer);
                }
                allowed
            })
            .collect();
        append_lines(&self.watch_file, &watched)?;

        Ok(watched)
    }
}

fn ends_without_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for appending", path.display()))?;

    // A hand-edited ledger may lack its final newline.
    let needs_separator = !lines.is_empty()
        && ends_without_newline(&mut file)
            .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    if needs_separator {
        writeln!(writer)?;
    }
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn set(urls: &[&str]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn persistence(dir: &TempDir, tokens: &[&str]) -> Persistence {
        Persistence::new(
            dir.path().join("seen.txt"),
            dir.path().join("watch.txt"),
            ExclusionFilter::new(tokens.iter().map(|t| t.to_string())),
        )
    }

    #[test]
    fn records_only_unseen_offers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("seen.txt"), "http://x/1\n").unwrap();
        let persistence = persistence(&dir, &["krzeszowice"]);

        let recorded = persistence.update(&set(&["http://x/1", "http://x/2"])).unwrap();

        assert_eq!(recorded, vec!["http://x/2"]);
        assert_eq!(lines(&dir.path().join("seen.txt")), vec!["http://x/1", "http://x/2"]);
        assert_eq!(lines(&dir.path().join("watch.txt")), vec!["http://x/2"]);
    }

    #[test]
    fn first_run_treats_everything_as_new() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = persistence(&dir, &[]);

        let recorded = persistence.update(&set(&["http://x/b", "http://x/a"])).unwrap();

        assert_eq!(recorded, vec!["http://x/a", "http://x/b"]);
        assert_eq!(persistence.load_seen().unwrap(), set(&["http://x/a", "http://x/b"]));
    }

    #[test]
    fn second_update_with_same_offers_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = persistence(&dir, &[]);
        let offers = set(&["http://x/1", "http://x/2"]);

        persistence.update(&offers).unwrap();
        let recorded = persistence.update(&offers).unwrap();

        assert!(recorded.is_empty());
        assert_eq!(lines(&dir.path().join("seen.txt")).len(), 2);
        assert_eq!(lines(&dir.path().join("watch.txt")).len(), 2);
    }

    #[test]
    fn excluded_offers_are_seen_but_not_watched() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = persistence(&dir, &["tyniec"]);

        let recorded = persistence
            .update(&set(&["http://x/dom-tyniec-1", "http://x/dom-podgorze-2"]))
            .unwrap();

        assert_eq!(recorded, vec!["http://x/dom-podgorze-2"]);
        assert!(persistence.load_seen().unwrap().contains("http://x/dom-tyniec-1"));
        assert_eq!(lines(&dir.path().join("watch.txt")), vec!["http://x/dom-podgorze-2"]);

        // Already seen now, so a later run cannot sneak it into the watch file.
        persistence.update(&set(&["http://x/dom-tyniec-1"])).unwrap();
        assert_eq!(lines(&dir.path().join("watch.txt")), vec!["http://x/dom-podgorze-2"]);
    }

    #[test]
    fn seen_file_becomes_union_of_old_and_new() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("seen.txt"), "http://x/1\n\nhttp://x/3  \n").unwrap();
        let persistence = persistence(&dir, &[]);

        persistence.update(&set(&["http://x/2", "http://x/3"])).unwrap();

        assert_eq!(
            persistence.load_seen().unwrap(),
            set(&["http://x/1", "http://x/2", "http://x/3"])
        );
    }

    #[test]
    fn nothing_new_still_leaves_both_ledgers_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = persistence(&dir, &[]);

        let recorded = persistence.update(&HashSet::new()).unwrap();

        assert!(recorded.is_empty());
        assert!(dir.path().join("seen.txt").exists());
        assert!(dir.path().join("watch.txt").exists());
    }

    #[test]
    fn surrounding_whitespace_does_not_defeat_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = persistence(&dir, &[]);
        let offers = set(&["https://gratka.pl/dom-1 ", "\thttps://gratka.pl/dom-2", "  "]);

        let first = persistence.update(&offers).unwrap();
        let second = persistence.update(&offers).unwrap();

        assert_eq!(first, vec!["https://gratka.pl/dom-1", "https://gratka.pl/dom-2"]);
        assert!(second.is_empty());
        assert_eq!(
            lines(&dir.path().join("watch.txt")),
            vec!["https://gratka.pl/dom-1", "https://gratka.pl/dom-2"]
        );
    }

    #[test]
    fn appends_after_ledger_missing_final_newline() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("seen.txt"), "http://x/1").unwrap();
        fs::write(dir.path().join("watch.txt"), "http://x/1").unwrap();
        let persistence = persistence(&dir, &[]);

        persistence.update(&set(&["http://x/2"])).unwrap();

        assert_eq!(persistence.load_seen().unwrap(), set(&["http://x/1", "http://x/2"]));
        assert_eq!(lines(&dir.path().join("watch.txt")), vec!["http://x/1", "http://x/2"]);
    }

    #[test]
    fn nothing_to_append_leaves_unterminated_ledger_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("seen.txt"), "http://x/1").unwrap();
        let persistence = persistence(&dir, &[]);

        persistence.update(&set(&["http://x/1"])).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("seen.txt")).unwrap(), "http://x/1");
    }

    #[test]
    fn failed_watch_append_still_records_offers_as_seen() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the watch ledger should be.
        fs::create_dir(dir.path().join("watch.txt")).unwrap();
        let persistence = persistence(&dir, &[]);

        assert!(persistence.update(&set(&["http://x/1"])).is_err());
        assert_eq!(lines(&dir.path().join("seen.txt")), vec!["http://x/1"]);
    }

    #[test]
    fn unreadable_seen_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the ledger should be.
        fs::create_dir(dir.path().join("seen.txt")).unwrap();
        let persistence = persistence(&dir, &[]);

        assert!(persistence.update(&set(&["http://x/1"])).is_err());
    }
}
