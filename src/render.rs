//! Item document rendering.
//!
//! Turns a [`ContentItem`] into the complete HTML file that is stored on disk
//! and served as-is. There are two templates, picked by [`Kind`]:
//!
//! - **Note** (`posts/`): header with title, description, section and date,
//!   the body, a tag footer, and a back link.
//! - **Book** (`library/`): the same frame plus a cover image and a
//!   `by {author}` line.
//!
//! Every document starts with the front-matter block (one
//! `<!-- Key: value -->` line per field, see [`front_matter_block`]) so that
//! metadata is read back without touching the DOM. The body fragment is
//! written verbatim between the content markers.
//!
//! Rendering is total: empty fields render as empty elements, never as an
//! error.

use crate::config::SiteConfig;
use crate::metadata::{self, CONTENT_END, CONTENT_START};
use crate::types::{ContentItem, FrontMatter, Kind};
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Render the full stored document for an item.
pub fn render_document(item: &ContentItem, config: &SiteConfig) -> String {
    let page = match item.kind() {
        Kind::Note => render_note(item, config),
        Kind::Book => render_book(item, config),
    };
    format!("{}{}\n", front_matter_block(&item.meta), page.into_string())
}

/// Serialize front matter as leading comment lines.
///
/// `Author`, `Year` and `Cover` are only written when set.
pub fn front_matter_block(meta: &FrontMatter) -> String {
    let mut fields: Vec<(&str, &str)> = vec![
        ("Title", meta.title.as_str()),
        ("Description", meta.description.as_str()),
    ];
    if !meta.author.trim().is_empty() {
        fields.push(("Author", meta.author.as_str()));
    }
    if !meta.year.trim().is_empty() {
        fields.push(("Year", meta.year.as_str()));
    }
    fields.extend([
        ("Tags", meta.tags.as_str()),
        ("Created", meta.created.as_str()),
        ("Updated", meta.updated.as_str()),
        ("Section", meta.section.as_str()),
        ("Type", meta.kind.as_str()),
    ]);
    if let Some(cover) = meta.cover.as_deref().filter(|c| !c.trim().is_empty()) {
        fields.push(("Cover", cover));
    }

    fields
        .into_iter()
        .map(|(key, value)| format!("<!-- {key}: {} -->\n", metadata::escape_value(value)))
        .collect()
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the document head shared by both templates
fn document_head(meta: &FrontMatter, config: &SiteConfig) -> Markup {
    let page_title = format!("{} - {}", meta.title, config.author_name);
    html! {
        head {
            meta charset="UTF-8";
            meta name="viewport" content="width=device-width, initial-scale=1.0, viewport-fit=cover";
            meta name="description" content=(meta.description);
            meta name="keywords" content=(meta.tags);
            meta property="og:title" content=(page_title);
            meta property="og:type" content="article";
            link rel="apple-touch-icon" sizes="180x180" href="/images/apple-touch-icon.png";
            link rel="icon" type="image/png" sizes="32x32" href="/images/favicon-32x32.png";
            link rel="icon" type="image/png" sizes="16x16" href="/images/favicon-16x16.png";
            link rel="manifest" href="/site.webmanifest";
            title { (page_title) }
            link rel="stylesheet" href="/styles.css";
        }
    }
}

fn site_nav() -> Markup {
    html! {
        nav {
            a.logo href="/" { "Home" }
            div.nav-links {
                a href="/about.html" { "About" }
            }
        }
    }
}

/// Renders one span per non-empty tag
pub fn render_tags(tags: &str) -> Markup {
    html! {
        div.post-tags {
            @for tag in crate::types::split_tags(tags) {
                span.post-tag { (tag) }
            }
        }
    }
}

fn body_region(body: &str) -> Markup {
    PreEscaped(format!("{CONTENT_START}\n{body}\n{CONTENT_END}"))
}

/// Renders the footer, back link and closing structure shared by both templates
fn page_footer(meta: &FrontMatter) -> Markup {
    html! {
        footer.post-footer {
            (render_tags(&meta.tags))
            div.post-time {
                "Last updated: " time { (meta.updated) }
            }
        }
        div.back-button-container {
            a.back-button href="/" { "Back to home" }
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

fn render_note(item: &ContentItem, config: &SiteConfig) -> Markup {
    let meta = &item.meta;
    html! {
        (DOCTYPE)
        html lang="en" {
            (document_head(meta, config))
            body {
                div.container {
                    (site_nav())
                    header.post-heading {
                        h1 { (meta.title) }
                        p.post-description { (meta.description) }
                        div.post-metadata-header {
                            span { (meta.section.to_uppercase()) }
                            span { "•" }
                            time { (meta.created) }
                        }
                    }
                    main {
                        div.post-content {
                            (body_region(&item.body))
                        }
                        (page_footer(meta))
                    }
                }
            }
        }
    }
}

fn render_book(item: &ContentItem, config: &SiteConfig) -> Markup {
    let meta = &item.meta;
    let cover_src = item.cover_image.as_deref().map(|p| format!("/{}", p.trim_start_matches('/')));
    html! {
        (DOCTYPE)
        html lang="en" {
            (document_head(meta, config))
            body {
                div.container {
                    (site_nav())
                    header.post-heading {
                        h1 { (meta.title) }
                        p.post-description { (meta.description) }
                        div.post-metadata-header {
                            span { (meta.section.to_uppercase()) }
                            span { "•" }
                            span { (meta.author) }
                            @if !meta.year.trim().is_empty() {
                                span { "•" }
                                span.book-year { (meta.year) }
                            }
                            span { "•" }
                            time { (meta.created) }
                        }
                    }
                    main {
                        div.book-cover-container {
                            @if let Some(src) = &cover_src {
                                img.book-cover src=(src) alt={ "Cover of " (meta.title) };
                            }
                        }
                        h2.book-author { "by " (meta.author) }
                        div.post-content {
                            (body_region(&item.body))
                        }
                        (page_footer(meta))
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
