//! EPUB 3 writer (mimetype, container, OPF, nav, NCX, chapters) and the book assembler.

mod assemble;

pub use assemble::{assemble_epub, book_identifier, DEFAULT_AUTHOR, LANGUAGE};

use crate::store::StoreError;
use std::io::{Seek, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTAINER_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n  <rootfiles>\n    <rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/>\n  </rootfiles>\n</container>";

const MIMETYPE: &[u8] = b"application/epub+zip";
const OEBPS_PREFIX: &str = "OEBPS/";

/// In-memory EPUB: metadata plus chapters in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpubBook {
    pub identifier: String,
    pub title: String,
    pub language: String,
    pub author: String,
    pub description: Option<String>,
    pub chapters: Vec<ChapterItem>,
}

/// One content document. `content` is the saved chapter fragment, unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterItem {
    /// Name inside the OEBPS directory, e.g. `03_Chapter-2_Strangers.xhtml`.
    pub file_name: String,
    pub title: String,
    pub language: String,
    pub content: String,
}

/// Errors from assembling or writing an EPUB.
#[derive(Debug, Error)]
pub enum EpubError {
    #[error("Cannot write EPUB: book title is empty.")]
    EmptyTitle,

    #[error("Cannot write EPUB: book has no chapters.")]
    NoChapters,

    #[error("Failed to create EPUB file: {path}: {source}")]
    CreateFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write EPUB archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<std::io::Error> for EpubError {
    fn from(e: std::io::Error) -> Self {
        EpubError::Zip(zip::result::ZipError::Io(e))
    }
}

/// Write `book` to an EPUB 3 file at `path`.
///
/// The spine starts with the navigation document, followed by the chapters in
/// order. Both nav.xhtml and toc.ncx list every chapter.
pub fn write_epub(book: &EpubBook, path: &Path) -> Result<(), EpubError> {
    validate_book(book)?;

    let file = std::fs::File::create(path).map_err(|e| EpubError::CreateFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(file);

    let options_stored = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);
    let options_deflate = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    // Mimetype first, uncompressed
    zip.start_file("mimetype", options_stored)?;
    zip.write_all(MIMETYPE)?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML)?;

    write_opf(book, &mut zip, options_deflate)?;
    write_nav_xhtml(book, &mut zip, options_deflate)?;
    write_ncx(book, &mut zip, options_deflate)?;
    write_chapters(book, &mut zip, options_deflate)?;

    zip.finish()?;
    log::debug!(
        "wrote {} with {} chapter(s)",
        path.display(),
        book.chapters.len()
    );
    Ok(())
}

fn validate_book(book: &EpubBook) -> Result<(), EpubError> {
    if book.title.trim().is_empty() {
        return Err(EpubError::EmptyTitle);
    }
    if book.chapters.is_empty() {
        return Err(EpubError::NoChapters);
    }
    Ok(())
}

fn chapter_id(i: usize) -> String {
    format!("chapter_{}", i + 1)
}

fn write_opf(
    book: &EpubBook,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let mut manifest = String::from(
        r#"    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
"#,
    );
    let mut spine = String::from("    <itemref idref=\"nav\"/>\n");
    for (i, ch) in book.chapters.iter().enumerate() {
        manifest.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            chapter_id(i),
            xml_escape(&ch.file_name)
        ));
        spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", chapter_id(i)));
    }

    let description_el = book
        .description
        .as_deref()
        .map(|d| format!("\n    <dc:description>{}</dc:description>", xml_escape(d)))
        .unwrap_or_default();

    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="id" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="id">{id}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>{lang}</dc:language>
    <dc:creator id="creator">{creator}</dc:creator>{description_el}
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#,
        id = xml_escape(&book.identifier),
        title = xml_escape(&book.title),
        lang = xml_escape(&book.language),
        creator = xml_escape(&book.author),
        description_el = description_el,
        manifest = manifest,
        spine = spine,
    );

    zip.start_file(format!("{}content.opf", OEBPS_PREFIX), options)?;
    zip.write_all(opf.as_bytes())?;
    Ok(())
}

fn write_nav_xhtml(
    book: &EpubBook,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let mut nav_links = String::new();
    for ch in &book.chapters {
        nav_links.push_str(&format!(
            "      <li><a href=\"{}\">{}</a></li>\n",
            xml_escape(&ch.file_name),
            xml_escape(&ch.title)
        ));
    }
    let nav = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
</head>
<body>
  <nav epub:type="toc" id="id">
    <h2>{title}</h2>
    <ol>
{links}    </ol>
  </nav>
</body>
</html>
"#,
        lang = xml_escape(&book.language),
        title = xml_escape(&book.title),
        links = nav_links
    );
    zip.start_file(format!("{}nav.xhtml", OEBPS_PREFIX), options)?;
    zip.write_all(nav.as_bytes())?;
    Ok(())
}

fn write_ncx(
    book: &EpubBook,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let mut nav_points = String::new();
    for (i, ch) in book.chapters.iter().enumerate() {
        nav_points.push_str(&format!(
            r#"    <navPoint id="{}" playOrder="{}">
      <navLabel><text>{}</text></navLabel>
      <content src="{}"/>
    </navPoint>
"#,
            chapter_id(i),
            i + 1,
            xml_escape(&ch.title),
            xml_escape(&ch.file_name)
        ));
    }
    let ncx = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{}"/>
    <meta name="dtb:depth" content="1"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <navMap>
{}  </navMap>
</ncx>
"#,
        xml_escape(&book.identifier),
        xml_escape(&book.title),
        nav_points
    );
    zip.start_file(format!("{}toc.ncx", OEBPS_PREFIX), options)?;
    zip.write_all(ncx.as_bytes())?;
    Ok(())
}

fn write_chapters(
    book: &EpubBook,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    for ch in &book.chapters {
        let html = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
            lang = xml_escape(&ch.language),
            title = xml_escape(&ch.title),
            body = ch.content
        );
        zip.start_file(format!("{}{}", OEBPS_PREFIX, ch.file_name), options)?;
        zip.write_all(html.as_bytes())?;
    }
    Ok(())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::Read;
    use zip::read::ZipArchive;

    fn chapter(file_name: &str, title: &str) -> ChapterItem {
        ChapterItem {
            file_name: file_name.to_string(),
            title: title.to_string(),
            language: LANGUAGE.to_string(),
            content: format!("<h1>{}</h1>\n<p>Setting</p>", title),
        }
    }

    fn sample_book() -> EpubBook {
        EpubBook {
            identifier: book_identifier("The Great Hunt"),
            title: "The Great Hunt".to_string(),
            language: LANGUAGE.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            description: Some("Summary of Book 2 of the Wheel of Time Series".to_string()),
            chapters: vec![
                chapter("00_Prologue_In-the-Shadow.xhtml", "Prologue: In the Shadow"),
                chapter("01_Chapter-1_The-Flame-of-Tar-Valon.xhtml", "Chapter 1: The Flame of Tar Valon"),
            ],
        }
    }

    fn read_entry(zip: &mut ZipArchive<std::fs::File>, name: &str) -> Result<String, Box<dyn Error>> {
        let mut s = String::new();
        zip.by_name(name)?.read_to_string(&mut s)?;
        Ok(s)
    }

    #[test]
    fn rejects_empty_title() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let mut book = sample_book();
        book.title = "  ".to_string();
        let result = write_epub(&book, &dir.path().join("x.epub"));
        assert!(matches!(result, Err(EpubError::EmptyTitle)));
        Ok(())
    }

    #[test]
    fn rejects_book_without_chapters() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let mut book = sample_book();
        book.chapters.clear();
        let path = dir.path().join("x.epub");
        assert!(matches!(write_epub(&book, &path), Err(EpubError::NoChapters)));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn writes_expected_archive_entries() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("The-Great-Hunt.epub");
        write_epub(&sample_book(), &path)?;

        let mut zip = ZipArchive::new(std::fs::File::open(&path)?)?;
        assert_eq!(zip.by_index(0)?.name(), "mimetype");
        assert_eq!(read_entry(&mut zip, "mimetype")?, "application/epub+zip");
        let names: Vec<String> = zip.file_names().map(String::from).collect();
        for expected in [
            "META-INF/container.xml",
            "OEBPS/content.opf",
            "OEBPS/nav.xhtml",
            "OEBPS/toc.ncx",
            "OEBPS/00_Prologue_In-the-Shadow.xhtml",
            "OEBPS/01_Chapter-1_The-Flame-of-Tar-Valon.xhtml",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
        Ok(())
    }

    #[test]
    fn spine_starts_with_nav_then_chapters_in_order() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("book.epub");
        write_epub(&sample_book(), &path)?;
        let mut zip = ZipArchive::new(std::fs::File::open(&path)?)?;
        let opf = read_entry(&mut zip, "OEBPS/content.opf")?;

        let nav = opf.find(r#"<itemref idref="nav"/>"#).ok_or("no nav itemref")?;
        let first = opf.find(r#"<itemref idref="chapter_1"/>"#).ok_or("no chapter_1")?;
        let second = opf.find(r#"<itemref idref="chapter_2"/>"#).ok_or("no chapter_2")?;
        assert!(nav < first && first < second);
        assert!(opf.contains(&format!(
            "<dc:identifier id=\"id\">{}</dc:identifier>",
            book_identifier("The Great Hunt")
        )));
        assert!(opf.contains("<dc:language>en</dc:language>"));
        assert!(opf.contains("<dc:creator id=\"creator\">Wheel of Time WIKI</dc:creator>"));
        assert!(opf.contains("Summary of Book 2 of the Wheel of Time Series"));
        Ok(())
    }

    #[test]
    fn toc_lists_every_chapter_title() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("book.epub");
        write_epub(&sample_book(), &path)?;
        let mut zip = ZipArchive::new(std::fs::File::open(&path)?)?;
        let nav = read_entry(&mut zip, "OEBPS/nav.xhtml")?;
        let ncx = read_entry(&mut zip, "OEBPS/toc.ncx")?;
        for doc in [&nav, &ncx] {
            assert!(doc.contains("Prologue: In the Shadow"));
            assert!(doc.contains("Chapter 1: The Flame of Tar Valon"));
            assert!(doc.contains("01_Chapter-1_The-Flame-of-Tar-Valon.xhtml"));
        }
        Ok(())
    }

    #[test]
    fn chapter_document_embeds_content_unchanged() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("book.epub");
        let book = sample_book();
        write_epub(&book, &path)?;
        let mut zip = ZipArchive::new(std::fs::File::open(&path)?)?;
        let doc = read_entry(&mut zip, "OEBPS/00_Prologue_In-the-Shadow.xhtml")?;
        assert!(doc.contains(&book.chapters[0].content));
        assert!(doc.contains("<title>Prologue: In the Shadow</title>"));
        Ok(())
    }
}
