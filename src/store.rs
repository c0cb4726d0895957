//! On-disk layout of saved chapters: file naming, fragment files, and the sidecar index.

use crate::catalog::dashed;
use crate::model::{BookIndex, ChapterEntry};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SIDECAR_FILE: &str = "index.json";
const CHAPTER_EXT: &str = "html";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed chapter file name '{name}': expected NN_Role_Title.html")]
    MalformedFileName { name: String },

    #[error("Invalid chapter index {path}: {source}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Chapter index lists {file}, but it is missing from {dir}")]
    MissingChapterFile { file: String, dir: PathBuf },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Characters that never appear in a name token: `_` separates tokens, path
/// separators would leave the directory, `?`, `#` and `%` break EPUB hrefs,
/// and the rest are rejected by Windows file systems.
const RESERVED: [char; 12] = ['_', '/', '\\', '?', '#', '%', ':', '*', '"', '<', '>', '|'];

/// Token used inside a chapter file name. Spaces and reserved characters become dashes.
fn name_token(s: &str) -> String {
    dashed(s).replace(RESERVED, "-")
}

/// `{ordinal:02}_{Role}_{Title}.html`, e.g. `03_Chapter-2_The-Strangers.html`.
pub fn chapter_file_name(ordinal: u32, role: &str, title: &str) -> String {
    format!(
        "{:02}_{}_{}.{}",
        ordinal,
        name_token(role),
        name_token(title),
        CHAPTER_EXT
    )
}

/// Decode `(ordinal, role, title)` from a chapter file name. Dashes read back
/// as spaces, so a literal dash in the original text is not recoverable.
pub fn parse_chapter_file_name(name: &str) -> Result<(u32, String, String), StoreError> {
    let malformed = || StoreError::MalformedFileName {
        name: name.to_string(),
    };
    let stem = name
        .strip_suffix(&format!(".{}", CHAPTER_EXT))
        .unwrap_or(name);
    let tokens: Vec<&str> = stem.split('_').collect();
    if tokens.len() != 3 {
        return Err(malformed());
    }
    let ordinal = tokens[0].parse::<u32>().map_err(|_| malformed())?;
    Ok((
        ordinal,
        tokens[1].replace('-', " "),
        tokens[2].replace('-', " "),
    ))
}

/// Write one chapter fragment. The file is flushed and closed before returning.
pub fn write_chapter(dir: &Path, file_name: &str, html: &str) -> Result<PathBuf, StoreError> {
    let path = dir.join(file_name);
    {
        let mut f = File::create(&path).map_err(io_err(&path))?;
        f.write_all(html.as_bytes()).map_err(io_err(&path))?;
        f.flush().map_err(io_err(&path))?;
    }
    log::debug!("wrote {}", path.display());
    Ok(path)
}

/// Delete a chapter fragment. A file that is already gone is not an error.
pub fn remove_chapter(dir: &Path, file_name: &str) -> Result<(), StoreError> {
    let path = dir.join(file_name);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            log::debug!("removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(&path)(e)),
    }
}

pub fn read_chapter(dir: &Path, file_name: &str) -> Result<String, StoreError> {
    let path = dir.join(file_name);
    if !path.is_file() {
        return Err(StoreError::MissingChapterFile {
            file: file_name.to_string(),
            dir: dir.to_path_buf(),
        });
    }
    std::fs::read_to_string(&path).map_err(io_err(&path))
}

/// All `*.html` file names in `dir`, in lexicographic (narrative) order.
pub fn list_chapter_files(dir: &Path) -> Result<Vec<String>, StoreError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
        let entry = entry.map_err(io_err(dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(CHAPTER_EXT) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Chapter entries decoded from file names alone (no sidecar present).
pub fn entries_from_file_names(dir: &Path) -> Result<Vec<ChapterEntry>, StoreError> {
    list_chapter_files(dir)?
        .into_iter()
        .map(|file| {
            let (ordinal, role, title) = parse_chapter_file_name(&file)?;
            Ok(ChapterEntry {
                ordinal,
                role,
                title,
                file,
            })
        })
        .collect()
}

/// Load the sidecar index. Missing file returns Ok(None).
pub fn load_index(dir: &Path) -> Result<Option<BookIndex>, StoreError> {
    let path = dir.join(SIDECAR_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let f = File::open(&path).map_err(io_err(&path))?;
    let index = serde_json::from_reader(std::io::BufReader::new(f))
        .map_err(|source| StoreError::Sidecar { path, source })?;
    Ok(Some(index))
}

pub fn save_index(dir: &Path, index: &BookIndex) -> Result<(), StoreError> {
    let path = dir.join(SIDECAR_FILE);
    let f = File::create(&path).map_err(io_err(&path))?;
    let mut w = std::io::BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, index).map_err(|source| StoreError::Sidecar {
        path: path.clone(),
        source,
    })?;
    w.flush().map_err(io_err(&path))?;
    Ok(())
}
