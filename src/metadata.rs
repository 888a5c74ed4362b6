//! Metadata extraction from stored HTML documents.
//!
//! Every field is resolved independently from a list of sources, first
//! non-empty value wins. Extraction never fails: malformed or foreign HTML
//! degrades to defaults.
//!
//! ## Sources, in priority order
//!
//! - **Front matter**: `<!-- Key: value -->` comments. Files written by this
//!   crate carry one per field at the very top of the document.
//! - **Document fallbacks** for hand-written or older files, read with
//!   `scraper`:
//!
//! | Field | Fallbacks after the comment |
//! |---|---|
//! | title | `<title>` minus the ` - {author_name}` suffix → first `<h1>` → title-cased id |
//! | description | `<meta name="description">` |
//! | tags | `<meta name="keywords">` |
//! | section | `<meta name="section">` → library section for books → `default_section` |
//! | created | `Date` comment → first `<time>` → `Updated` comment → today |
//! | updated | resolved `created` |
//! | author | `<h2 class="book-author">by …</h2>` |
//! | kind | book markers (`.book-cover-container`, `h2.book-author`) → section equals the library section → note |
//!
//! ## Body
//!
//! Files written by [`render`](crate::render) wrap the body in
//! `<!-- content:start -->` / `<!-- content:end -->`, which makes the body
//! recoverable byte for byte. Older files fall back to DOM extraction, see
//! [`extract_body`].

use crate::config::SiteConfig;
use crate::dates;
use crate::naming;
use crate::types::{FrontMatter, Kind};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::cell::OnceCell;
use std::collections::HashMap;

pub const CONTENT_START: &str = "<!-- content:start -->";
pub const CONTENT_END: &str = "<!-- content:end -->";

/// Front-matter keys, as written.
const KEYS: &[&str] = &[
    "Title",
    "Description",
    "Author",
    "Year",
    "Tags",
    "Created",
    "Date",
    "Updated",
    "Section",
    "Type",
    "Cover",
];

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value (trimmed).
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Parse the leading `<!-- Key: value -->` comments with a known key.
///
/// Only the run of comments at the top of the document counts, optionally
/// after a `<!DOCTYPE>`. Scanning stops at the first other markup, so
/// comments inside the page or its body never become front matter. Keys are
/// matched case-insensitively and returned lowercased. The first occurrence
/// of a key wins.
pub fn parse_comment_block(html: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let mut rest = skip_doctype(html.trim_start_matches('\u{feff}').trim_start()).trim_start();
    while let Some(after) = rest.strip_prefix("<!--") {
        let Some(end) = after.find("-->") else {
            break;
        };
        let inner = after[..end].trim();
        rest = after[end + 3..].trim_start();

        let Some((key, value)) = inner.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if !KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
            continue;
        }
        fields
            .entry(key.to_ascii_lowercase())
            .or_insert_with(|| unescape_value(value.trim()));
    }
    fields
}

fn skip_doctype(html: &str) -> &str {
    let is_doctype = html
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
    match html.find('>') {
        Some(end) if is_doctype => &html[end + 1..],
        _ => html,
    }
}

/// Make a value safe to embed in a single-line HTML comment.
pub fn escape_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("-->", "--&gt;")
}

fn unescape_value(value: &str) -> String {
    value.replace("--&gt;", "-->")
}

/// Reads [`FrontMatter`] out of stored documents using the site's labels.
#[derive(Debug, Clone)]
pub struct Extractor {
    default_section: String,
    library_section: String,
    title_suffix: String,
}

impl Extractor {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            default_section: config.default_section.clone(),
            library_section: config.library_section.clone(),
            title_suffix: format!(" - {}", config.author_name),
        }
    }

    /// Extract metadata from a document.
    ///
    /// `id` is the file stem, used as the last-resort title. `today` fills in
    /// missing dates.
    pub fn extract(&self, html: &str, id: Option<&str>, today: NaiveDate) -> FrontMatter {
        let comments = parse_comment_block(html);
        let comment = |key: &str| comments.get(key).map(String::as_str);

        // Parsed on first use only; files this crate wrote never need it.
        let dom: OnceCell<Html> = OnceCell::new();
        let doc = || dom.get_or_init(|| Html::parse_document(html));

        let title = resolve(&[comment("title")]).or_else(|| {
            let from_title = first_text(doc(), "title").map(|t| self.strip_title_suffix(&t));
            let id_title = id.map(naming::title_from_id);
            resolve(&[
                from_title.as_deref(),
                first_text(doc(), "h1").as_deref(),
                id_title.as_deref(),
            ])
        });

        let description = resolve(&[comment("description")])
            .or_else(|| meta_content(doc(), "description"));
        let tags = resolve(&[comment("tags")]).or_else(|| meta_content(doc(), "keywords"));
        let explicit_section =
            resolve(&[comment("section")]).or_else(|| meta_content(doc(), "section"));

        let author = resolve(&[comment("author")]).or_else(|| book_author(doc()));

        let kind = comment("type")
            .and_then(Kind::parse)
            .or_else(|| has_book_markers(doc()).then_some(Kind::Book))
            .or_else(|| {
                explicit_section
                    .as_deref()
                    .filter(|s| s.trim().eq_ignore_ascii_case(self.library_section.trim()))
                    .map(|_| Kind::Book)
            })
            .unwrap_or(Kind::Note);

        let section = explicit_section.unwrap_or_else(|| match kind {
            Kind::Book => self.library_section.clone(),
            Kind::Note => self.default_section.clone(),
        });

        let created = resolve(&[comment("created"), comment("date")])
            .or_else(|| first_text(doc(), "time"))
            .or_else(|| resolve(&[comment("updated")]))
            .unwrap_or_else(|| dates::format_display_date(today));
        let updated = resolve(&[comment("updated")]).unwrap_or_else(|| created.clone());

        FrontMatter {
            title: title.unwrap_or_default(),
            description: description.unwrap_or_default(),
            author: author.unwrap_or_default(),
            year: resolve(&[comment("year")]).unwrap_or_default(),
            tags: tags.unwrap_or_default(),
            created,
            updated,
            section,
            kind,
            cover: resolve(&[comment("cover")]),
        }
    }

    fn strip_title_suffix(&self, title: &str) -> String {
        title
            .trim()
            .strip_suffix(self.title_suffix.as_str())
            .unwrap_or(title.trim())
            .to_string()
    }
}

/// Extract the body fragment from a stored document.
///
/// Priority:
/// 1. Text between the content markers, trimmed
/// 2. Inner HTML of `div.post-content` or `div.book-content`
/// 3. First `<div>` inside `<main>` that isn't navigation or a cover
/// 4. `<body>` children minus `<header>`, `<nav>` and the back button
/// 5. Empty string
pub fn extract_body(html: &str) -> String {
    if let Some(start) = html.find(CONTENT_START) {
        let after = &html[start + CONTENT_START.len()..];
        if let Some(end) = after.rfind(CONTENT_END) {
            return after[..end].trim().to_string();
        }
    }

    let doc = Html::parse_document(html);

    if let Some(el) = select_first(&doc, "div.post-content, div.book-content") {
        return el.inner_html().trim().to_string();
    }

    if let Some(el) = select_first(
        &doc,
        "main > div:not(.back-button-container):not(.book-cover-container)",
    ) {
        return el.inner_html().trim().to_string();
    }

    if let Some(body) = select_first(&doc, "body") {
        let mut out = String::new();
        for child in body.children() {
            if let Some(el) = ElementRef::wrap(child) {
                let name = el.value().name();
                let is_chrome = name == "header"
                    || name == "nav"
                    || el.value().classes().any(|c| c == "back-button-container");
                if !is_chrome {
                    out.push_str(&el.html());
                }
            } else if let Some(text) = child.value().as_text() {
                out.push_str(text);
            }
        }
        return out.trim().to_string();
    }

    String::new()
}

fn select_first<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector).next()
}

/// Collapsed text of the first element matching `selector`, if non-empty.
fn first_text(doc: &Html, selector: &str) -> Option<String> {
    select_first(doc, selector)
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

fn meta_content(doc: &Html, name: &str) -> Option<String> {
    let selector = format!(r#"meta[name="{name}"]"#);
    select_first(doc, &selector)
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn book_author(doc: &Html) -> Option<String> {
    let text = first_text(doc, "h2.book-author")?;
    let author = text
        .strip_prefix("by ")
        .or_else(|| text.strip_prefix("By "))
        .unwrap_or(&text)
        .trim()
        .to_string();
    (!author.is_empty()).then_some(author)
}

fn has_book_markers(doc: &Html) -> bool {
    select_first(doc, ".book-cover-container, h2.book-author").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(&SiteConfig::default())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
    }

    // =========================================================================
    // resolve() tests
    // =========================================================================

    #[test]
    fn resolve_picks_first_non_empty() {
        assert_eq!(resolve(&[None, Some("  "), Some(" b ")]), Some("b".to_string()));
        assert_eq!(resolve(&[None, None]), None);
    }

    // =========================================================================
    // Comment block tests
    // =========================================================================

    #[test]
    fn comment_block_reads_known_keys() {
        let html = "<!-- Title: Hello -->\n<!-- tags: a, b -->\n<!DOCTYPE html>";
        let fields = parse_comment_block(html);
        assert_eq!(fields.get("title").map(String::as_str), Some("Hello"));
        assert_eq!(fields.get("tags").map(String::as_str), Some("a, b"));
    }

    #[test]
    fn comment_block_ignores_unknown_keys_and_plain_comments() {
        let html = "<!-- Metadata -->\n<!-- Note: nope -->\n<!-- content:start -->";
        assert!(parse_comment_block(html).is_empty());
    }

    #[test]
    fn comment_block_first_occurrence_wins() {
        let html = "<!-- Title: First -->\n<!-- Title: Second -->";
        assert_eq!(parse_comment_block(html)["title"], "First");
    }

    #[test]
    fn comments_after_page_markup_are_not_front_matter() {
        let html = format!(
            "<!-- Title: Plain -->\n<!-- Section: Work -->\n<!DOCTYPE html><html><body>\
             {CONTENT_START}<p>hi</p><!-- Author: Mallory --><!-- Year: 1999 -->{CONTENT_END}\
             </body></html>"
        );
        let fields = parse_comment_block(&html);
        assert_eq!(fields["title"], "Plain");
        assert!(!fields.contains_key("author"));
        assert!(!fields.contains_key("year"));

        let meta = extractor().extract(&html, Some("plain"), today());
        assert_eq!(meta.author, "");
        assert_eq!(meta.year, "");
        assert_eq!(meta.kind, Kind::Note);
    }

    #[test]
    fn comments_after_doctype_still_count() {
        let html = "<!DOCTYPE html>\n<!-- Title: Late Start -->\n<html></html>";
        assert_eq!(parse_comment_block(html)["title"], "Late Start");
    }

    #[test]
    fn comment_value_may_contain_colons() {
        let html = "<!-- Title: Rust: The Good Parts -->";
        assert_eq!(parse_comment_block(html)["title"], "Rust: The Good Parts");
    }

    #[test]
    fn unterminated_comment_is_ignored() {
        let html = "<!-- Title: Fine -->\n<!-- Description: never closed";
        let fields = parse_comment_block(html);
        assert_eq!(fields["title"], "Fine");
        assert!(!fields.contains_key("description"));
    }

    #[test]
    fn escaped_values_round_trip() {
        let raw = "arrows --> and\nnewlines";
        let html = format!("<!-- Description: {} -->", escape_value(raw));
        assert_eq!(
            parse_comment_block(&html)["description"],
            "arrows --> and newlines"
        );
    }

    // =========================================================================
    // Extractor tests
    // =========================================================================

    #[test]
    fn extracts_front_matter() {
        let html = r#"<!-- Title: My First Post -->
<!-- Description: Intro -->
<!-- Tags: a, b -->
<!-- Created: March 3, 2024 -->
<!-- Updated: March 5, 2024 -->
<!-- Section: Technology -->
<!-- Type: note -->
<!DOCTYPE html><html><head><title>Other</title></head><body></body></html>"#;
        let meta = extractor().extract(html, Some("my-first-post"), today());
        assert_eq!(meta.title, "My First Post");
        assert_eq!(meta.description, "Intro");
        assert_eq!(meta.tags, "a, b");
        assert_eq!(meta.created, "March 3, 2024");
        assert_eq!(meta.updated, "March 5, 2024");
        assert_eq!(meta.section, "Technology");
        assert_eq!(meta.kind, Kind::Note);
    }

    #[test]
    fn falls_back_to_meta_tags_and_title_element() {
        let html = r#"<!DOCTYPE html><html><head>
<meta name="description" content="From meta">
<meta name="keywords" content="x, y">
<meta name="section" content="Work">
<title>Legacy Post - Site Author</title>
</head><body><header><h1>Heading</h1><time>January 5, 2023</time></header></body></html>"#;
        let meta = extractor().extract(html, Some("legacy-post"), today());
        assert_eq!(meta.title, "Legacy Post");
        assert_eq!(meta.description, "From meta");
        assert_eq!(meta.tags, "x, y");
        assert_eq!(meta.section, "Work");
        assert_eq!(meta.created, "January 5, 2023");
        assert_eq!(meta.updated, "January 5, 2023");
    }

    #[test]
    fn title_falls_back_to_heading_then_id() {
        let with_h1 = "<html><body><h1>Only Heading</h1></body></html>";
        assert_eq!(
            extractor().extract(with_h1, Some("x"), today()).title,
            "Only Heading"
        );

        let bare = "<html><body><p>text</p></body></html>";
        assert_eq!(
            extractor().extract(bare, Some("some-old-note"), today()).title,
            "Some Old Note"
        );
    }

    #[test]
    fn missing_dates_default_to_today() {
        let meta = extractor().extract("<p>nothing</p>", None, today());
        assert_eq!(meta.created, "February 14, 2025");
        assert_eq!(meta.updated, "February 14, 2025");
    }

    #[test]
    fn legacy_date_comment_fills_created() {
        let html = "<!-- Date: June 1, 2022 -->";
        let meta = extractor().extract(html, None, today());
        assert_eq!(meta.created, "June 1, 2022");
        assert_eq!(meta.updated, "June 1, 2022");
    }

    #[test]
    fn created_falls_back_to_updated() {
        let html = "<!-- Updated: June 9, 2022 -->";
        let meta = extractor().extract(html, None, today());
        assert_eq!(meta.created, "June 9, 2022");
    }

    #[test]
    fn missing_section_defaults_to_placeholder() {
        let meta = extractor().extract("<!-- Title: T -->", None, today());
        assert_eq!(meta.section, "Uncategorized");
        assert_eq!(meta.kind, Kind::Note);
    }

    #[test]
    fn book_markers_infer_book_kind_and_author() {
        let html = r#"<html><body><div class="book-cover-container"></div>
<h2 class="book-author">by Ursula K. Le Guin</h2></body></html>"#;
        let meta = extractor().extract(html, Some("earthsea"), today());
        assert_eq!(meta.kind, Kind::Book);
        assert_eq!(meta.author, "Ursula K. Le Guin");
        assert_eq!(meta.section, "Library");
    }

    #[test]
    fn library_section_infers_book_kind() {
        let meta = extractor().extract("<!-- Section: Library -->", None, today());
        assert_eq!(meta.kind, Kind::Book);
    }

    #[test]
    fn explicit_type_wins_over_markers() {
        let html = r#"<!-- Type: note --><div class="book-cover-container"></div>"#;
        assert_eq!(extractor().extract(html, None, today()).kind, Kind::Note);
    }

    #[test]
    fn malformed_html_still_extracts() {
        let html = "<!-- Title: Broken --><div><p>unclosed <b>tags";
        let meta = extractor().extract(html, None, today());
        assert_eq!(meta.title, "Broken");
        assert!(extract_body(html).contains("unclosed <b>tags</b>"));
    }

    // =========================================================================
    // Body extraction tests
    // =========================================================================

    #[test]
    fn body_between_markers_is_verbatim() {
        let html = format!(
            "<main><div class=\"post-content\">{CONTENT_START}\n<p>hi</p>  <br>\n{CONTENT_END}</div></main>"
        );
        assert_eq!(extract_body(&html), "<p>hi</p>  <br>");
    }

    #[test]
    fn body_may_mention_the_end_marker() {
        let html = format!(
            "<div class=\"post-content\">{CONTENT_START}\n<p>Bodies end at <code>{CONTENT_END}</code></p>\n{CONTENT_END}</div>"
        );
        assert_eq!(
            extract_body(&html),
            format!("<p>Bodies end at <code>{CONTENT_END}</code></p>")
        );
    }

    #[test]
    fn body_from_post_content_div() {
        let html = r#"<html><body><main><div class="post-content"><p>legacy</p></div>
<div class="back-button-container"><a href="/">Back</a></div></main></body></html>"#;
        assert_eq!(extract_body(html), "<p>legacy</p>");
    }

    #[test]
    fn body_from_first_main_div() {
        let html = r#"<html><body><main><div><p>old style</p></div>
<div class="back-button-container"><a href="/">Back</a></div></main></body></html>"#;
        assert_eq!(extract_body(html), "<p>old style</p>");
    }

    #[test]
    fn body_from_body_without_header_and_back_button() {
        let html = r#"<html><body><header><h1>T</h1></header><p>loose</p>
<div class="back-button-container"><a href="/">Back</a></div></body></html>"#;
        assert_eq!(extract_body(html), "<p>loose</p>");
    }
}
