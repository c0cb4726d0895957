//! Chapter-index resolution and chapter-page extraction on top of a [PageTemplate].

use crate::model::ExtractedChapter;
use crate::scraper::{PageFetcher, PageTemplate, ScraperError};
use reqwest::Url;
use scraper::{ElementRef, Html, Node};

/// Footer block present on some pages that is not part of the summary.
const EXTERNAL_SUMMARY_MARKER: &str = "External summary";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Fetch a book's index page and return absolute chapter URLs in document order.
///
/// A failed fetch is returned as an error rather than an empty list. A missing
/// index region is [ScraperError::LayoutChanged].
pub fn resolve_chapter_urls(
    fetcher: &mut dyn PageFetcher,
    template: &dyn PageTemplate,
    index_url: &str,
) -> Result<Vec<String>, ScraperError> {
    let base = Url::parse(index_url).map_err(|e| ScraperError::InvalidUrl {
        input: index_url.to_string(),
        reason: e.to_string(),
    })?;
    let html = fetcher.fetch_page(index_url)?;
    let doc = Html::parse_document(&html);
    let mut urls = Vec::new();
    for href in template.chapter_links(&doc)? {
        match base.join(&href) {
            Ok(u) => urls.push(u.to_string()),
            Err(e) => log::warn!("ignoring chapter link {:?}: {}", href, e),
        }
    }
    Ok(urls)
}

/// Extract role, title, and summary HTML from a chapter page.
pub fn extract_chapter(
    template: &dyn PageTemplate,
    html: &str,
) -> Result<ExtractedChapter, ScraperError> {
    let doc = Html::parse_document(html);
    let role = template.role(&doc)?;
    let title = template.title(&doc)?;
    let setting = template.setting(&doc)?;
    let summary = template.summary_fragments(&doc)?;

    let mut parts = vec![
        format!("<h1>{}: {}</h1>", escape_text(&role), escape_text(&title)),
        format!("<p>{}</p>", setting),
    ];
    parts.extend(
        summary
            .into_iter()
            .filter(|f| !f.contains(EXTERNAL_SUMMARY_MARKER)),
    );
    if let Some(notes) = template.footnotes(&doc) {
        parts.push("<h2>Notes</h2>".to_string());
        parts.push(notes);
    }

    Ok(ExtractedChapter {
        role,
        title,
        html: parts.join("\n"),
    })
}

/// Serialize an element as XHTML-compatible markup with hyperlinks unwrapped:
/// `<a>` tags are dropped, their children kept. Comments are dropped.
pub(crate) fn render_unwrapped(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    render_into(el, &mut out);
    out
}

fn render_into(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    let keep_tag = name != "a";
    if keep_tag {
        out.push('<');
        out.push_str(name);
        for (key, value) in el.value().attrs() {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if VOID_ELEMENTS.contains(&name) {
            out.push_str("/>");
            return;
        }
        out.push('>');
    }
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(&escape_text(t)),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render_into(child_el, out);
                }
            }
            _ => {}
        }
    }
    if keep_tag {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
