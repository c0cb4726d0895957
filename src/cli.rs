//! CLI parsing and orchestration. Runs grab-book (fetch pipeline) or create-epub
//! (build pipeline) for each requested book and maps the batch outcome to an exit code.

use crate::catalog::{self, BookEntry, CatalogError};
use crate::config::{self, Config};
use crate::epub::{assemble_epub, write_epub, DEFAULT_AUTHOR};
use crate::scraper::{
    grab_book, FandomWikiTemplate, PageFetcher, PageTemplate, PoliteClient, DEFAULT_DELAY_SECS,
    DEFAULT_TIMEOUT_SECS,
};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = "data";

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("{failed} of {requested} book(s) failed; {skipped_chapters} chapter(s) skipped")]
    BatchFailed {
        failed: usize,
        requested: usize,
        skipped_chapters: usize,
    },
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Catalog(_) => 1,
            CliRunError::BatchFailed { .. } => 2,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "wotscrape")]
#[command(about = "Scrape Wheel of Time wiki chapter summaries and build one EPUB per book")]
#[command(
    after_help = "Config file keys (data_dir, user_agent, request_delay_secs, timeout_secs, author) are read from ./wotscrape.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Data directory for chapter files and EPUBs (overrides config; default ./data).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// HTTP User-Agent (overrides config).
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Delay between requests in seconds (overrides config; default 1).
    #[arg(long, global = true)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Suppress progress output (errors only).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug logging and verbose error chain.
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch chapter summaries of the given books into the data directory.
    GrabBook {
        #[arg(required = true, value_name = "NUMBER")]
        numbers: Vec<u32>,
    },
    /// Build an EPUB for each given book from previously fetched chapters.
    CreateEpub {
        #[arg(required = true, value_name = "NUMBER")]
        numbers: Vec<u32>,
    },
    /// Print the book catalog.
    ListBooks,
}

/// Effective settings after merging CLI flags over config over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub user_agent: Option<String>,
    pub delay_secs: u64,
    pub timeout_secs: u64,
    pub author: String,
}

impl Settings {
    pub fn resolve(args: &Args, config: Option<&Config>) -> Self {
        Settings {
            data_dir: args
                .data_dir
                .clone()
                .or_else(|| config.and_then(|c| c.data_dir.clone()))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            user_agent: args
                .user_agent
                .clone()
                .or_else(|| config.and_then(|c| c.user_agent.clone())),
            delay_secs: args
                .delay
                .or_else(|| config.and_then(|c| c.request_delay_secs))
                .unwrap_or(DEFAULT_DELAY_SECS),
            timeout_secs: args
                .timeout
                .or_else(|| config.and_then(|c| c.timeout_secs))
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            author: config
                .and_then(|c| c.author.clone())
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        }
    }

    fn client(&self) -> Result<PoliteClient, CliRunError> {
        let mut builder = PoliteClient::builder()
            .delay_secs(self.delay_secs)
            .timeout_secs(self.timeout_secs);
        if let Some(ua) = &self.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        builder
            .build()
            .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))
    }
}

/// Aggregate outcome of one invocation over several books.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub requested: usize,
    pub failed: usize,
    pub skipped_chapters: usize,
}

impl BatchSummary {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    pub fn into_result(self) -> Result<(), CliRunError> {
        if self.failed == 0 && self.skipped_chapters == 0 {
            Ok(())
        } else {
            Err(CliRunError::BatchFailed {
                failed: self.failed,
                requested: self.requested,
                skipped_chapters: self.skipped_chapters,
            })
        }
    }
}

fn progress_bar(total: u32) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new(total as u64);
    if let Ok(style) = indicatif::ProgressStyle::default_bar()
        .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
    {
        bar.set_style(
            style
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Fetch pipeline over several books. Each book gets its own directory under
/// the data dir; a failing book is reported and the rest still run.
pub fn grab_books(
    books: &[&BookEntry],
    settings: &Settings,
    fetcher: &mut dyn PageFetcher,
    template: &dyn PageTemplate,
    quiet: bool,
) -> BatchSummary {
    let mut summary = BatchSummary::new(books.len());
    for book in books {
        if !quiet {
            eprintln!("Grabbing {}...", book.title);
        }
        let dir = settings.data_dir.join(book.dir_name());
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("Cannot create {}: {}. Skipped.", dir.display(), e);
            summary.failed += 1;
            continue;
        }

        let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
        let progress_cb = |n: u32, total: u32| {
            if total == 0 {
                return;
            }
            let mut state = progress_state.borrow_mut();
            let pb = state.get_or_insert_with(|| progress_bar(total));
            pb.set_position(n as u64);
            pb.set_message(format!("Fetching chapter {}/{}", n, total));
        };
        let progress: Option<&dyn Fn(u32, u32)> = if quiet { None } else { Some(&progress_cb) };

        let result = grab_book(book, &dir, fetcher, template, progress);

        if let Some(pb) = progress_state.borrow_mut().take() {
            pb.disable_steady_tick();
            pb.finish_and_clear();
        }

        match result {
            Ok(report) => {
                summary.skipped_chapters += report.failures.len();
                if !quiet {
                    eprintln!(
                        "{}: {} chapter(s) written to {}, {} skipped",
                        book.title,
                        report.written.len(),
                        dir.display(),
                        report.failures.len()
                    );
                }
            }
            Err(e) => {
                eprintln!("Unable to grab {} from {}: {}", book.title, book.url, e);
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Build pipeline over several books. A book without a data directory is
/// reported and skipped; a book whose build fails does not stop the others.
pub fn create_epubs(books: &[&BookEntry], settings: &Settings, quiet: bool) -> BatchSummary {
    let mut summary = BatchSummary::new(books.len());
    for book in books {
        let dir = settings.data_dir.join(book.dir_name());
        if !dir.is_dir() {
            eprintln!("No data present for {}", book.title);
            summary.failed += 1;
            continue;
        }
        if !quiet {
            eprintln!("Generating {}...", book.title);
        }
        let output = settings.data_dir.join(book.epub_file_name());
        match assemble_epub(book, &dir, &settings.author).and_then(|b| write_epub(&b, &output)) {
            Ok(()) => {
                if !quiet {
                    eprintln!("Wrote {}", output.display());
                }
            }
            Err(e) => {
                eprintln!("Unable to build {}: {}", book.title, e);
                summary.failed += 1;
            }
        }
    }
    summary
}

fn list_books() {
    for book in catalog::BOOKS {
        println!("{:>2}  {:<22}  {}", book.ordinal, book.title, book.url);
    }
}

/// Entry point for the CLI. Returns Ok(()) when every requested book succeeded.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let numbers = match &args.command {
        Command::ListBooks => {
            list_books();
            return Ok(());
        }
        Command::GrabBook { numbers } | Command::CreateEpub { numbers } => numbers,
    };
    let books = catalog::resolve_all(numbers)?;

    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let settings = Settings::resolve(args, config.as_ref());
    log::debug!("settings: {:?}", settings);

    let summary = match &args.command {
        Command::GrabBook { .. } => {
            let mut client = settings.client()?;
            let template = FandomWikiTemplate::new()
                .map_err(|e| CliRunError::InvalidInput(e.to_string()))?;
            grab_books(&books, &settings, &mut client, &template, args.quiet)
        }
        Command::CreateEpub { .. } => create_epubs(&books, &settings, args.quiet),
        Command::ListBooks => BatchSummary::default(),
    };
    summary.into_result()
}
