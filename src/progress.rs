use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

/// Human-readable run output. Diagnostics go through `tracing`; this is only
/// what the person running the job watches.
pub struct Progress {
    out: Box<dyn Write>,
}

impl Progress {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self { out }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Swallows everything, for callers that only want the results.
    pub fn silent() -> Self {
        Self::new(Box::new(io::sink()))
    }

    fn line(&mut self, color: Color, text: String) -> io::Result<()> {
        queue!(
            self.out,
            SetForegroundColor(color),
            Print(text),
            ResetColor,
            Print("\n")
        )?;
        self.out.flush()
    }

    pub fn run_started(&mut self, timestamp: &str) -> io::Result<()> {
        self.line(Color::DarkGrey, format!("--- Starting run at {} ---", timestamp))
    }

    pub fn begin_site(&mut self, site: &str) -> io::Result<()> {
        self.line(Color::Cyan, format!("Beginning scraping of {}", site))
    }

    pub fn query(&mut self, query: &str) -> io::Result<()> {
        self.line(Color::White, query.to_string())
    }

    pub fn page(&mut self, page: usize, query: &str) -> io::Result<()> {
        self.line(Color::DarkGrey, format!("Scraping page {} of {}", page, query))
    }

    pub fn finish_site(&mut self, site: &str) -> io::Result<()> {
        self.line(Color::Cyan, format!("Finished scraping of {}", site))
    }

    pub fn skipped_site(&mut self, site: &str) -> io::Result<()> {
        self.line(Color::DarkGrey, format!("Skipping {}", site))
    }

    pub fn recorded(&mut self, count: usize) -> io::Result<()> {
        self.line(Color::Green, format!("Recorded {} new offers", count))
    }
}
