//! Sitemap documents and the fetcher that flattens them.
//!
//! A document is either a `<urlset>` of `<url><loc/><lastmod/></url>` entries
//! or a `<sitemapindex>` of `<sitemap><loc/></sitemap>` pointers. Indexes are
//! expanded one level: each listed sitemap is fetched and read as a urlset.
//!
//! Elements are matched by local name, so documents that omit the
//! `http://www.sitemaps.org/schemas/sitemap/0.9` namespace or bind it to a
//! prefix are read the same way.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{info, warn};

use crate::error::{LedgerError, Result};
use crate::fetch::Transport;

/// Namespace of the sitemap protocol.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// One `<url>` of a urlset, values taken verbatim from the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub url: String,
    pub raw_date: String,
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: the `<loc>` of each `<sitemap>` child, in document
    /// order. `None` marks a child without a usable `<loc>`.
    Index(Vec<Option<String>>),
    /// `<urlset>` (or any other root): its entries in document order.
    UrlSet(Vec<SitemapEntry>),
}

/// Minimal element tree; sitemaps are small enough to hold whole.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(local_name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(local_name).into_owned(),
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the named child, if present and non-empty.
    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
    }
}

/// Parse raw bytes fetched from `url` into a [`SitemapDocument`].
pub fn parse_document(url: &str, bytes: &[u8]) -> Result<SitemapDocument> {
    let root = parse_tree(url, bytes)?;

    if root.name == "sitemapindex" {
        let locs = root
            .children_named("sitemap")
            .map(|s| s.child_text("loc").map(str::to_string))
            .collect();
        return Ok(SitemapDocument::Index(locs));
    }

    let mut entries = Vec::new();
    for node in root.children_named("url") {
        let loc = node.child_text("loc").ok_or_else(|| missing(url, "loc"))?;
        let lastmod = node.child("lastmod").ok_or_else(|| missing(url, "lastmod"))?;
        entries.push(SitemapEntry {
            url: loc.to_string(),
            raw_date: lastmod.text.clone(),
        });
    }
    Ok(SitemapDocument::UrlSet(entries))
}

fn missing(url: &str, element: &'static str) -> LedgerError {
    LedgerError::MissingElement {
        url: url.to_string(),
        element,
    }
}

fn parse_tree(url: &str, bytes: &[u8]) -> Result<Element> {
    let parse_err = |reason: String| LedgerError::Parse {
        url: url.to_string(),
        reason,
    };

    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(parse_err(format!(
                    "{e} at byte {}",
                    reader.buffer_position()
                )))
            }
            Ok(Event::Start(e)) => {
                if root.is_some() {
                    return Err(parse_err("content after the document element".to_string()));
                }
                stack.push(Element::named(e.local_name().as_ref()));
            }
            Ok(Event::Empty(e)) => {
                if root.is_some() {
                    return Err(parse_err("content after the document element".to_string()));
                }
                close(&mut stack, &mut root, Element::named(e.local_name().as_ref()));
            }
            Ok(Event::End(_)) => {
                // quick-xml has already checked that the end tag matches.
                if let Some(element) = stack.pop() {
                    close(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| parse_err(e.to_string()))?;
                match stack.last_mut() {
                    Some(open) => open.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(parse_err("text outside the document element".to_string())),
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(String::from_utf8_lossy(&e).trim());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(parse_err("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| parse_err("no document element".to_string()))
}

/// Attach a finished element to its parent, or make it the root.
fn close(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Fetches sitemaps through a [`Transport`] and flattens them into entries.
pub struct SitemapFetcher<'a> {
    transport: &'a dyn Transport,
}

impl<'a> SitemapFetcher<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Fetch `url` and return every `(loc, lastmod)` pair it leads to.
    ///
    /// For a sitemap index only the first `limit` child sitemaps are fetched
    /// (all of them when `limit` is `None`); their entries are concatenated in
    /// index order. Any error aborts the whole fetch.
    pub async fn fetch(&self, url: &str, limit: Option<usize>) -> Result<Vec<SitemapEntry>> {
        match self.fetch_document(url).await? {
            SitemapDocument::Index(locs) => {
                let take = limit.unwrap_or(locs.len()).min(locs.len());
                info!(count = take, listed = locs.len(), url, "processing sitemap index");

                let mut all = Vec::new();
                for (i, loc) in locs.into_iter().take(take).enumerate() {
                    let loc = loc.ok_or_else(|| missing(url, "loc"))?;
                    info!(position = i + 1, total = take, url = %loc, "processing sitemap");
                    all.extend(self.fetch_urlset(&loc).await?);
                }
                Ok(all)
            }
            SitemapDocument::UrlSet(entries) => {
                info!(url, entries = entries.len(), "processing direct sitemap");
                Ok(entries)
            }
        }
    }

    async fn fetch_document(&self, url: &str) -> Result<SitemapDocument> {
        let bytes = self.transport.get(url).await?;
        parse_document(url, &bytes)
    }

    /// Fetch a sitemap listed by an index and read it as a urlset.
    ///
    /// A nested index has no `<url>` children, so it contributes nothing.
    async fn fetch_urlset(&self, url: &str) -> Result<Vec<SitemapEntry>> {
        match self.fetch_document(url).await? {
            SitemapDocument::UrlSet(entries) => Ok(entries),
            SitemapDocument::Index(locs) => {
                warn!(url, listed = locs.len(), "nested sitemap index is not expanded");
                Ok(Vec::new())
            }
        }
    }
}
