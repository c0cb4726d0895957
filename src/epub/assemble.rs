//! Build an [EpubBook] from a directory of saved chapter fragments.

use crate::catalog::BookEntry;
use crate::epub::{ChapterItem, EpubBook, EpubError};
use crate::store;
use sha2::{Digest, Sha256};
use std::path::Path;

pub const LANGUAGE: &str = "en";
pub const DEFAULT_AUTHOR: &str = "Wheel of Time WIKI";

/// Stable identifier derived from the book title (hex SHA-256).
pub fn book_identifier(title: &str) -> String {
    hex::encode(Sha256::digest(title.as_bytes()))
}

/// Read every saved chapter of `book` from `src_dir`, in file-name order.
///
/// Chapter metadata comes from the sidecar index when present; otherwise it is
/// decoded from the file names, and a malformed name fails the whole book.
pub fn assemble_epub(
    book: &BookEntry,
    src_dir: &Path,
    author: &str,
) -> Result<EpubBook, EpubError> {
    let entries = match store::load_index(src_dir)? {
        Some(index) => index.chapters,
        None => {
            log::debug!(
                "no {} in {}; decoding chapter file names",
                store::SIDECAR_FILE,
                src_dir.display()
            );
            store::entries_from_file_names(src_dir)?
        }
    };

    let mut chapters = Vec::with_capacity(entries.len());
    for entry in entries {
        let content = store::read_chapter(src_dir, &entry.file)?;
        let stem = entry
            .file
            .strip_suffix(".html")
            .unwrap_or(&entry.file)
            .to_string();
        chapters.push(ChapterItem {
            file_name: format!("{}.xhtml", stem),
            title: entry.display_title(),
            language: LANGUAGE.to_string(),
            content,
        });
    }

    Ok(EpubBook {
        identifier: book_identifier(book.title),
        title: book.title.to_string(),
        language: LANGUAGE.to_string(),
        author: author.to_string(),
        description: Some(book.description()),
        chapters,
    })
}
