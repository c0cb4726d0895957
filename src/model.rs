//! Chapter records shared by the fetch and build pipelines.
//!
//! A chapter lives on disk as one HTML fragment file plus one entry in the
//! book's `index.json` sidecar. The EPUB assembler reads the sidecar when it
//! exists and only falls back to decoding file names when it does not.

use serde::{Deserialize, Serialize};

/// Output of the chapter extractor for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedChapter {
    /// Tail of the page heading after the last `/`.
    pub role: String,
    pub title: String,
    /// Newline-joined fragments: heading, setting, summary, optional notes.
    pub html: String,
}

/// One chapter's metadata as persisted in the sidecar index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterEntry {
    /// 0-based position in the book's chapter index page.
    pub ordinal: u32,
    pub role: String,
    pub title: String,
    /// File name of the HTML fragment, relative to the book directory.
    pub file: String,
}

impl ChapterEntry {
    /// Display title used for the EPUB table of contents.
    pub fn display_title(&self) -> String {
        format!("{}: {}", self.role, self.title)
    }
}

/// Sidecar index written next to the chapter files of one book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookIndex {
    pub book: u32,
    pub title: String,
    pub chapters: Vec<ChapterEntry>,
}

impl BookIndex {
    pub fn new(book: u32, title: impl Into<String>) -> Self {
        Self {
            book,
            title: title.into(),
            chapters: Vec::new(),
        }
    }

    /// Insert or replace entries by ordinal, keeping chapters sorted by file name.
    ///
    /// Returns the file names of replaced entries that no longer match the
    /// new entry's file, i.e. fragments left behind by a renamed chapter.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = ChapterEntry>) -> Vec<String> {
        let mut stale = Vec::new();
        for entry in entries {
            if let Some(pos) = self.chapters.iter().position(|c| c.ordinal == entry.ordinal) {
                let old = self.chapters.swap_remove(pos);
                if old.file != entry.file {
                    stale.push(old.file);
                }
            }
            self.chapters.push(entry);
        }
        self.chapters.sort_by(|a, b| a.file.cmp(&b.file));
        stale
    }
}
