//! Homepage and sitemap generation.
//!
//! Both artifacts are caches of the content store: every run re-reads all
//! items and rewrites the files from scratch, so running twice with no store
//! changes gives the same output apart from the generation date.
//!
//! ## Homepage
//!
//! `index.html` is hand-maintained except for delimited regions that this
//! module owns:
//!
//! ```html
//! <div class="book-grid">
//!   <!-- library:start -->
//!   ...book cards, newest first...
//!   <!-- library:end -->
//! </div>
//! <section class="notes-section">
//!   <!-- notes:start -->
//!   ...notes grouped by section...
//!   <!-- notes:end -->
//! </section>
//! <!-- updated:start -->February 14, 2025<!-- updated:end -->
//! ```
//!
//! Older homepages carry single placeholder comments instead
//! (`<!-- Library items will be dynamically inserted here -->`). The first
//! run replaces each placeholder with a delimited region so later runs can
//! rewrite it in place. The `updated` region is optional.
//!
//! ## Sitemap
//!
//! One root entry (`weekly`, priority `1.0`) plus one entry per note file,
//! sorted by filename (`monthly`, `0.8`). `lastmod` is the generation date.

use crate::dates;
use crate::store::{self, ContentStore, StoreError};
use crate::types::{ContentItem, Kind};
use chrono::NaiveDate;
use maud::{Markup, html};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Homepage not found at {0}")]
    MissingHomepage(PathBuf),
    #[error("Homepage {path} has no `{region}` markers")]
    MissingMarker { path: PathBuf, region: &'static str },
}

/// A homepage region owned by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    /// Single placeholder comment used by older homepages.
    pub legacy: Option<&'static str>,
}

pub const LIBRARY_REGION: Region = Region {
    name: "library",
    start: "<!-- library:start -->",
    end: "<!-- library:end -->",
    legacy: Some("<!-- Library items will be dynamically inserted here -->"),
};

pub const NOTES_REGION: Region = Region {
    name: "notes",
    start: "<!-- notes:start -->",
    end: "<!-- notes:end -->",
    legacy: Some("<!-- Notes will be dynamically inserted here -->"),
};

pub const UPDATED_REGION: Region = Region {
    name: "updated",
    start: "<!-- updated:start -->",
    end: "<!-- updated:end -->",
    legacy: None,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomepageOutcome {
    pub path: PathBuf,
    pub books: usize,
    pub notes: usize,
    pub sections: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapOutcome {
    pub path: PathBuf,
    pub urls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegenerateOutcome {
    pub homepage: HomepageOutcome,
    pub sitemap: SitemapOutcome,
}

/// Rewrite homepage and sitemap from the current store contents.
pub fn regenerate(store: &ContentStore, today: NaiveDate) -> Result<RegenerateOutcome, GenerateError> {
    let homepage = update_homepage(store, today)?;
    let sitemap = update_sitemap(store, today)?;
    Ok(RegenerateOutcome { homepage, sitemap })
}

/// Rewrite the generated regions of the homepage.
pub fn update_homepage(store: &ContentStore, today: NaiveDate) -> Result<HomepageOutcome, GenerateError> {
    let path = store.paths().homepage.clone();
    if !path.is_file() {
        return Err(GenerateError::MissingHomepage(path));
    }
    let template = fs::read_to_string(&path)?;

    let mut items = store.read_all(today)?;
    store::sort_newest_first(&mut items);
    let (books, notes): (Vec<ContentItem>, Vec<ContentItem>) =
        items.into_iter().partition(|item| item.kind() == Kind::Book);
    let groups = group_by_section(&notes);

    let library_html = render_library_grid(&books).into_string();
    let notes_html = render_notes(&groups).into_string();

    let html = splice_region(&template, &LIBRARY_REGION, &library_html)
        .ok_or_else(|| missing(&path, &LIBRARY_REGION))?;
    let html = splice_region(&html, &NOTES_REGION, &notes_html)
        .ok_or_else(|| missing(&path, &NOTES_REGION))?;
    let html = splice_region(&html, &UPDATED_REGION, &dates::format_display_date(today))
        .unwrap_or(html);

    store.write_artifact(&path, &html)?;
    info!(
        path = %path.display(),
        books = books.len(),
        notes = notes.len(),
        "updated homepage"
    );

    Ok(HomepageOutcome {
        path,
        books: books.len(),
        notes: notes.len(),
        sections: groups.len(),
    })
}

fn missing(path: &std::path::Path, region: &Region) -> GenerateError {
    GenerateError::MissingMarker {
        path: path.to_path_buf(),
        region: region.name,
    }
}

/// Rewrite the sitemap.
pub fn update_sitemap(store: &ContentStore, today: NaiveDate) -> Result<SitemapOutcome, GenerateError> {
    let ids = store.list_ids(Kind::Note)?;
    let locations: Vec<String> = ids
        .iter()
        .map(|id| store.public_path(Kind::Note, id))
        .collect();
    let xml = render_sitemap(store.config().base_url(), &locations, today);

    let path = store.paths().sitemap.clone();
    store.write_artifact(&path, &xml)?;
    info!(path = %path.display(), urls = locations.len() + 1, "updated sitemap");

    Ok(SitemapOutcome {
        path,
        urls: locations.len() + 1,
    })
}

/// Replace a region's contents with `fragment`.
///
/// Returns `None` when the document has neither the delimiters nor the
/// legacy placeholder.
pub fn splice_region(doc: &str, region: &Region, fragment: &str) -> Option<String> {
    if let Some(start) = doc.find(region.start) {
        let inner_start = start + region.start.len();
        if let Some(end_rel) = doc[inner_start..].find(region.end) {
            let inner_end = inner_start + end_rel;
            return Some(format!(
                "{}\n{}\n{}",
                &doc[..inner_start],
                fragment,
                &doc[inner_end..]
            ));
        }
    }

    let legacy = region.legacy?;
    let pos = doc.find(legacy)?;
    Some(format!(
        "{}{}\n{}\n{}{}",
        &doc[..pos],
        region.start,
        fragment,
        region.end,
        &doc[pos + legacy.len()..]
    ))
}

/// Notes grouped by section.
///
/// Expects `notes` newest first. Sections are ordered by their newest item,
/// which is the order they first appear in.
pub fn group_by_section(notes: &[ContentItem]) -> Vec<(String, Vec<&ContentItem>)> {
    let mut groups: Vec<(String, Vec<&ContentItem>)> = Vec::new();
    for note in notes {
        let section = note.meta.section.trim();
        match groups.iter().position(|(name, _)| name == section) {
            Some(i) => groups[i].1.push(note),
            None => groups.push((section.to_string(), vec![note])),
        }
    }
    groups
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the library grid: one card per book
pub fn render_library_grid(books: &[ContentItem]) -> Markup {
    html! {
        @for book in books {
            @let cover = book.cover_image.as_deref().unwrap_or_default();
            a.book href=(book.path) {
                div.book-cover style={ "background-image: url('/" (cover.trim_start_matches('/')) "')" } {}
                div.book-info {
                    div.book-title { (book.meta.title) }
                    @if !book.meta.author.is_empty() {
                        div.book-author { "by " (book.meta.author) }
                    }
                }
            }
        }
    }
}

/// Renders notes as rows under one header per section
pub fn render_notes(groups: &[(String, Vec<&ContentItem>)]) -> Markup {
    html! {
        @for (section, notes) in groups {
            div.notes-group {
                h2.section-header { (section) }
                @for note in notes {
                    a.note-row href=(note.path) {
                        div.note-header {
                            time { (display_date(&note.meta.created)) }
                            h3 { (note.meta.title) }
                        }
                        p { (note.meta.description) }
                    }
                }
            }
        }
    }
}

/// Normalize a stored date for display, keeping unparsable values as written.
fn display_date(value: &str) -> String {
    dates::parse_display_date(value)
        .map(dates::format_display_date)
        .unwrap_or_else(|| value.trim().to_string())
}

// ============================================================================
// Sitemap
// ============================================================================

/// Render sitemap XML for the site root plus the given URL paths.
pub fn render_sitemap(base_url: &str, paths: &[String], today: NaiveDate) -> String {
    let lastmod = dates::iso_date(today);
    let base = base_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    push_url(&mut xml, &format!("{base}/"), &lastmod, "weekly", "1.0");
    for path in paths {
        push_url(&mut xml, &format!("{base}{path}"), &lastmod, "monthly", "0.8");
    }
    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str, lastmod: &str, changefreq: &str, priority: &str) {
    xml.push_str("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(loc)));
    xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
    xml.push_str(&format!("    <changefreq>{changefreq}</changefreq>\n"));
    xml.push_str(&format!("    <priority>{priority}</priority>\n"));
    xml.push_str("  </url>\n");
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
