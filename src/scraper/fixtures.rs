//! Synthetic wiki pages and an in-memory fetcher for tests.

use crate::scraper::extract::escape_text;
use crate::scraper::{PageFetcher, ScraperError};
use std::collections::HashMap;

fn wiki_layout(heading: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>{heading}</title></head><body>
<div class="WikiaSiteWrapper"><div class="WikiaPage"><div class="WikiaPageContentWrapper"><div class="article-with-rail">
<article id="WikiaMainContent" class="WikiaMainContent"><div id="WikiaMainContentContainer" class="WikiaMainContentContainer">
<h1 id="firstHeading" class="page-header__title">{heading}</h1>
<div id="content" class="WikiaArticle"><div id="mw-content-text" class="mw-content-ltr"><div class="mw-parser-output">
{content}
</div></div></div>
</div></article>
</div></div></div></div>
</body></html>"#,
        heading = heading,
        content = content
    )
}

/// Index page whose chapter table contains the given raw `<tr>` rows.
pub fn index_page_with_rows(rows: &str) -> String {
    let content = format!(
        r#"<p>The first book of the series.</p>
<div class="noprint"><table><tbody><tr><td><table class="collapsible"><tbody>
<tr><th>Chapters</th></tr>
{}
</tbody></table></td></tr></tbody></table></div>"#,
        rows
    );
    wiki_layout("The Eye of the World", &content)
}

/// Index page linking to each href, one per row.
pub fn index_page(hrefs: &[&str]) -> String {
    let rows = hrefs
        .iter()
        .map(|h| format!(r#"<tr><td><a href="{}">{}</a></td></tr>"#, h, h))
        .collect::<String>();
    index_page_with_rows(&rows)
}

/// Chapter page with the info table, raw summary markup, and optional raw footnote markup.
pub fn chapter_page(
    heading: &str,
    title: &str,
    setting: &str,
    summary: &str,
    footnotes: Option<&str>,
) -> String {
    let notes = footnotes
        .map(|n| {
            format!(
                r#"<div class="references"><span class="references-small">{}</span></div>"#,
                n
            )
        })
        .unwrap_or_default();
    let content = format!(
        r#"<table class="infobox"><tbody><tr><td><strong><big><em>{title}</em></big></strong><br><small>{setting}</small></td></tr></tbody></table>
{summary}
<h2>References</h2>
{notes}"#,
        title = escape_text(title),
        setting = escape_text(setting),
        summary = summary,
        notes = notes
    );
    wiki_layout(&escape_text(heading), &content)
}

/// In-memory [PageFetcher]: serves pages or status codes by URL and records requests.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pages: HashMap<String, Result<String, u16>>,
    pub requested: Vec<String>,
}

impl FakeFetcher {
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Err(status));
        self
    }
}

impl PageFetcher for FakeFetcher {
    fn fetch_page(&mut self, url: &str) -> Result<String, ScraperError> {
        self.requested.push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(html)) => Ok(html.clone()),
            Some(Err(status)) => Err(ScraperError::HttpStatus {
                status: *status,
                url: url.to_string(),
            }),
            None => Err(ScraperError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}
