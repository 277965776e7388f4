use anyhow::Result;
use clap::Parser;
use krakowfinder::browser::{open_session, Backend};
use krakowfinder::common_scraper::ScrapingOptions;
use krakowfinder::config::{Queries, DEFAULT_SEEN_FILE, DEFAULT_WATCH_FILE};
use krakowfinder::filter::ExclusionFilter;
use krakowfinder::models::Site;
use krakowfinder::persistence::Persistence;
use krakowfinder::progress::Progress;
use krakowfinder::runner::{self, RunOptions};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Krakowfinder - new house offers around Kraków")]
struct Args {
    /// Ledger of every offer recorded so far
    #[clap(long, default_value = DEFAULT_SEEN_FILE)]
    seen: PathBuf,

    /// Ledger of new offers that passed the locality filter
    #[clap(long, default_value = DEFAULT_WATCH_FILE)]
    watch: PathBuf,

    /// File with excluded locality tokens, one per line (defaults to the built-in list)
    #[clap(long)]
    exclusions: Option<PathBuf>,

    /// JSON file with search queries per site (defaults to the built-in queries)
    #[clap(long)]
    queries: Option<PathBuf>,

    /// How result pages are fetched
    #[clap(long, value_enum, default_value = "chrome")]
    backend: Backend,

    /// Milliseconds to wait after each scroll on lazily loading pages
    #[clap(long, default_value = "500")]
    settle_ms: u64,

    /// Skip otodom.pl
    #[clap(long)]
    skip_otodom: bool,

    /// Skip nieruchomosci-online.pl
    #[clap(long)]
    skip_nieruchomosci: bool,

    /// Skip gratka.pl
    #[clap(long)]
    skip_gratka: bool,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "krakowfinder=debug" } else { "krakowfinder=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let filter = match &args.exclusions {
        Some(path) => ExclusionFilter::from_file(path)?,
        None => ExclusionFilter::default(),
    };

    let mut skip = HashSet::new();
    if args.skip_otodom {
        skip.insert(Site::Otodom);
    }
    if args.skip_nieruchomosci {
        skip.insert(Site::NieruchomosciOnline);
    }
    if args.skip_gratka {
        skip.insert(Site::Gratka);
    }

    let options = RunOptions {
        queries: Queries::load(args.queries.as_deref())?,
        skip,
        scraping: ScrapingOptions {
            settle_delay: Duration::from_millis(args.settle_ms),
        },
    };
    let persistence = Persistence::new(args.seen, args.watch, filter);

    let backend = args.backend;
    runner::run(
        &options,
        &persistence,
        &mut |_site| open_session(backend),
        &mut Progress::stdout(),
    )?;

    Ok(())
}
