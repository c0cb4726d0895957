//! Fixed catalog of known books, keyed by 1-based ordinal.

use thiserror::Error;

/// One book of the series and the wiki page listing its chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub ordinal: u32,
    pub title: &'static str,
    pub url: &'static str,
}

pub static BOOKS: &[BookEntry] = &[
    BookEntry {
        ordinal: 1,
        title: "The Eye of the World",
        url: "https://wot.fandom.com/wiki/The_Eye_of_the_World",
    },
    BookEntry {
        ordinal: 2,
        title: "The Great Hunt",
        url: "https://wot.fandom.com/wiki/The_Great_Hunt",
    },
    BookEntry {
        ordinal: 3,
        title: "The Dragon Reborn",
        url: "https://wot.fandom.com/wiki/The_Dragon_Reborn",
    },
    BookEntry {
        ordinal: 4,
        title: "The Shadow Rising",
        url: "https://wot.fandom.com/wiki/The_Shadow_Rising",
    },
    BookEntry {
        ordinal: 5,
        title: "The Fires of Heaven",
        url: "https://wot.fandom.com/wiki/The_Fires_of_Heaven",
    },
    BookEntry {
        ordinal: 6,
        title: "Lord of Chaos",
        url: "https://wot.fandom.com/wiki/Lord_of_Chaos",
    },
    BookEntry {
        ordinal: 7,
        title: "A Crown of Swords",
        url: "https://wot.fandom.com/wiki/A_Crown_of_Swords",
    },
    BookEntry {
        ordinal: 8,
        title: "The Path of Daggers",
        url: "https://wot.fandom.com/wiki/The_Path_of_Daggers",
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown book number {0}. Run `wotscrape list-books` to see the catalog.")]
    UnknownBook(u32),

    #[error("Unknown book number(s): {}. Run `wotscrape list-books` to see the catalog.", join_numbers(.numbers))]
    UnknownBooks { numbers: Vec<u32> },
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Look up a book by its ordinal.
pub fn lookup(number: u32) -> Result<&'static BookEntry, CatalogError> {
    BOOKS
        .iter()
        .find(|b| b.ordinal == number)
        .ok_or(CatalogError::UnknownBook(number))
}

/// Resolve every requested number, or report all unknown ones at once.
/// Order (and duplicates) of the request are preserved.
pub fn resolve_all(numbers: &[u32]) -> Result<Vec<&'static BookEntry>, CatalogError> {
    let mut books = Vec::with_capacity(numbers.len());
    let mut unknown = Vec::new();
    for &n in numbers {
        match lookup(n) {
            Ok(b) => books.push(b),
            Err(_) => unknown.push(n),
        }
    }
    if unknown.is_empty() {
        Ok(books)
    } else {
        Err(CatalogError::UnknownBooks { numbers: unknown })
    }
}

/// Replace spaces with dashes. Used for directory, chapter, and EPUB file names.
pub fn dashed(s: &str) -> String {
    s.trim().replace(' ', "-")
}

impl BookEntry {
    /// Per-book data directory name, e.g. `01_The-Eye-of-the-World`.
    pub fn dir_name(&self) -> String {
        format!("{:02}_{}", self.ordinal, dashed(self.title))
    }

    pub fn epub_file_name(&self) -> String {
        format!("{}.epub", dashed(self.title))
    }

    pub fn description(&self) -> String {
        format!(
            "Summary of Book {} of the Wheel of Time Series",
            self.ordinal
        )
    }
}
