//! wotscrape: scrape Wheel of Time wiki chapter summaries and assemble one EPUB per book.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod epub;
pub mod model;
pub mod scraper;
pub mod store;

// Re-exports for CLI and consumers.
pub use catalog::{BookEntry, CatalogError, BOOKS};
pub use epub::{assemble_epub, write_epub, ChapterItem, EpubBook, EpubError};
pub use crate::scraper::{
    extract_chapter, grab_book, resolve_chapter_urls, FandomWikiTemplate, GrabReport,
    PageFetcher, PageTemplate, PoliteClient, PoliteClientBuilder, ScraperError,
};
pub use store::StoreError;
