//! Fetch pipeline: page fetching, the wiki page template, extraction, and the per-book orchestrator.

mod client;
mod error;
mod extract;
mod fandom;

#[cfg(test)]
pub(crate) mod fixtures;

pub use client::{PoliteClient, PoliteClientBuilder, DEFAULT_DELAY_SECS, DEFAULT_TIMEOUT_SECS};
pub use error::ScraperError;
pub use extract::{extract_chapter, resolve_chapter_urls};
pub use fandom::FandomWikiTemplate;

use crate::catalog::BookEntry;
use crate::model::{BookIndex, ChapterEntry};
use crate::store;
use scraper::Html;
use std::path::Path;

/// Source of page bodies. Implementations turn non-success statuses into
/// [ScraperError::HttpStatus].
pub trait PageFetcher {
    fn fetch_page(&mut self, url: &str) -> Result<String, ScraperError>;
}

/// Page-template adapter: one method per field the pipeline needs from the wiki.
///
/// Every method that can fail returns [ScraperError::LayoutChanged] naming the
/// missing field.
pub trait PageTemplate {
    /// Raw `href` values of the chapter links on a book's index page, in document order.
    fn chapter_links(&self, doc: &Html) -> Result<Vec<String>, ScraperError>;
    fn role(&self, doc: &Html) -> Result<String, ScraperError>;
    fn title(&self, doc: &Html) -> Result<String, ScraperError>;
    /// Setting markup, kept as an element rather than flattened to text.
    fn setting(&self, doc: &Html) -> Result<String, ScraperError>;
    /// Direct-child summary blocks of the content region, rendered with links unwrapped.
    fn summary_fragments(&self, doc: &Html) -> Result<Vec<String>, ScraperError>;
    fn footnotes(&self, doc: &Html) -> Option<String>;
}

/// A chapter that could not be fetched or extracted.
#[derive(Debug)]
pub struct ChapterFailure {
    pub ordinal: u32,
    pub url: String,
    pub error: ScraperError,
}

/// Result of fetching one book.
#[derive(Debug, Default)]
pub struct GrabReport {
    pub written: Vec<ChapterEntry>,
    pub failures: Vec<ChapterFailure>,
}

/// Fetch every chapter of `book` into `dst_dir`, one fragment file per chapter,
/// then update the directory's sidecar index.
///
/// Index-page failures abort the book. A chapter whose fetch or extraction
/// fails is reported, recorded in [GrabReport::failures], and skipped. Local
/// write failures abort the book.
pub fn grab_book(
    book: &BookEntry,
    dst_dir: &Path,
    fetcher: &mut dyn PageFetcher,
    template: &dyn PageTemplate,
    progress: Option<&dyn Fn(u32, u32)>,
) -> Result<GrabReport, ScraperError> {
    let urls = resolve_chapter_urls(fetcher, template, book.url)?;
    log::debug!("{}: {} chapter link(s)", book.title, urls.len());
    let total = urls.len() as u32;
    let mut report = GrabReport::default();

    for (i, url) in urls.into_iter().enumerate() {
        let ordinal = i as u32;
        if let Some(p) = progress {
            p(ordinal + 1, total);
        }
        let chapter = match fetcher
            .fetch_page(&url)
            .and_then(|html| extract_chapter(template, &html))
        {
            Ok(c) => c,
            Err(e) => {
                eprintln!(
                    "Chapter {} of {} ({}): {}. Skipped.",
                    ordinal, book.title, url, e
                );
                report.failures.push(ChapterFailure {
                    ordinal,
                    url,
                    error: e,
                });
                continue;
            }
        };
        let file = store::chapter_file_name(ordinal, &chapter.role, &chapter.title);
        store::write_chapter(dst_dir, &file, &chapter.html)?;
        report.written.push(ChapterEntry {
            ordinal,
            role: chapter.role,
            title: chapter.title,
            file,
        });
    }

    let mut index = match store::load_index(dst_dir) {
        Ok(Some(index)) => index,
        Ok(None) => BookIndex::new(book.ordinal, book.title),
        Err(e) => {
            log::warn!("{}; rebuilding it", e);
            BookIndex::new(book.ordinal, book.title)
        }
    };
    let stale = index.merge(report.written.iter().cloned());
    store::save_index(dst_dir, &index)?;
    for file in stale {
        store::remove_chapter(dst_dir, &file)?;
    }

    Ok(report)
}
