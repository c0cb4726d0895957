//! Page template for the Wheel of Time Fandom wiki.
//!
//! All knowledge of the wiki's markup lives here. If the site changes its
//! layout, only these selector chains need updating.

use crate::scraper::extract::render_unwrapped;
use crate::scraper::{PageTemplate, ScraperError};
use scraper::{ElementRef, Html, Selector};

macro_rules! content_root {
    () => {
        "div.WikiaSiteWrapper div.WikiaPage div.WikiaPageContentWrapper div.article-with-rail \
         article#WikiaMainContent.WikiaMainContent \
         div#WikiaMainContentContainer.WikiaMainContentContainer \
         div#content.WikiaArticle div#mw-content-text.mw-content-ltr div.mw-parser-output"
    };
}

const CONTENT_ROOT: &str = content_root!();
const CHAPTER_INDEX: &str = concat!(
    content_root!(),
    " div.noprint table tbody tr td table.collapsible"
);
const INFO_TITLE: &str = concat!(content_root!(), " table tbody tr td strong big em");
const INFO_SETTING: &str = concat!(content_root!(), " table tbody tr td small");
const HEADING: &str = "h1#firstHeading";
const FOOTNOTES: &str = "span.references-small";
const LINK: &str = "a[href]";

fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::InvalidSelector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Selector chains for wot.fandom.com pages, compiled once.
#[derive(Debug, Clone)]
pub struct FandomWikiTemplate {
    content_root: Selector,
    chapter_index: Selector,
    info_title: Selector,
    info_setting: Selector,
    heading: Selector,
    footnotes: Selector,
    link: Selector,
}

impl FandomWikiTemplate {
    pub fn new() -> Result<Self, ScraperError> {
        Ok(Self {
            content_root: parse_selector(CONTENT_ROOT)?,
            chapter_index: parse_selector(CHAPTER_INDEX)?,
            info_title: parse_selector(INFO_TITLE)?,
            info_setting: parse_selector(INFO_SETTING)?,
            heading: parse_selector(HEADING)?,
            footnotes: parse_selector(FOOTNOTES)?,
            link: parse_selector(LINK)?,
        })
    }

    fn first<'a>(
        doc: &'a Html,
        sel: &Selector,
        field: &'static str,
    ) -> Result<ElementRef<'a>, ScraperError> {
        doc.select(sel)
            .next()
            .ok_or(ScraperError::LayoutChanged { field })
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

impl PageTemplate for FandomWikiTemplate {
    fn chapter_links(&self, doc: &Html) -> Result<Vec<String>, ScraperError> {
        let region = Self::first(doc, &self.chapter_index, "chapter index")?;
        Ok(region
            .select(&self.link)
            .filter_map(|a| a.value().attr("href"))
            .map(String::from)
            .collect())
    }

    /// Pages are titled `<Book>/<Role>`; the role is the tail.
    fn role(&self, doc: &Html) -> Result<String, ScraperError> {
        let heading = text_of(Self::first(doc, &self.heading, "page heading")?);
        Ok(heading
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn title(&self, doc: &Html) -> Result<String, ScraperError> {
        Ok(text_of(Self::first(doc, &self.info_title, "title")?))
    }

    fn setting(&self, doc: &Html) -> Result<String, ScraperError> {
        Ok(render_unwrapped(Self::first(
            doc,
            &self.info_setting,
            "setting",
        )?))
    }

    fn summary_fragments(&self, doc: &Html) -> Result<Vec<String>, ScraperError> {
        let root = Self::first(doc, &self.content_root, "summary region")?;
        Ok(root
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| matches!(el.value().name(), "p" | "dl"))
            .map(render_unwrapped)
            .collect())
    }

    fn footnotes(&self, doc: &Html) -> Option<String> {
        doc.select(&self.footnotes).next().map(render_unwrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::fixtures::{chapter_page, index_page_with_rows};

    #[test]
    fn all_selectors_compile() {
        assert!(FandomWikiTemplate::new().is_ok());
    }

    #[test]
    fn chapter_links_skip_anchors_without_href() -> Result<(), ScraperError> {
        let t = FandomWikiTemplate::new()?;
        let html = index_page_with_rows(
            r#"<tr><td><a href="/wiki/A">A</a></td></tr><tr><td><a name="x">x</a></td></tr>"#,
        );
        let doc = Html::parse_document(&html);
        assert_eq!(t.chapter_links(&doc)?, vec!["/wiki/A".to_string()]);
        Ok(())
    }

    #[test]
    fn role_is_tail_after_last_slash() -> Result<(), ScraperError> {
        let t = FandomWikiTemplate::new()?;
        let doc = Html::parse_document(&chapter_page(
            "The Fires of Heaven/Chapter 5",
            "Twisted Tales",
            "Cairhien",
            "<p>x</p>",
            None,
        ));
        assert_eq!(t.role(&doc)?, "Chapter 5");
        Ok(())
    }

    #[test]
    fn role_without_slash_is_whole_heading() -> Result<(), ScraperError> {
        let t = FandomWikiTemplate::new()?;
        let doc = Html::parse_document(r#"<h1 id="firstHeading"> Glossary </h1>"#);
        assert_eq!(t.role(&doc)?, "Glossary");
        Ok(())
    }

    #[test]
    fn missing_heading_is_layout_change() -> Result<(), ScraperError> {
        let t = FandomWikiTemplate::new()?;
        let doc = Html::parse_document("<p>no heading</p>");
        assert!(matches!(
            t.role(&doc),
            Err(ScraperError::LayoutChanged {
                field: "page heading"
            })
        ));
        Ok(())
    }

    #[test]
    fn footnotes_absent_is_none() -> Result<(), ScraperError> {
        let t = FandomWikiTemplate::new()?;
        let doc = Html::parse_document(&chapter_page("B/R", "T", "S", "<p>x</p>", None));
        assert!(t.footnotes(&doc).is_none());
        Ok(())
    }
}
