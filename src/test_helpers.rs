//! Shared test utilities for the folio test suite.
//!
//! Provides an isolated copy of the fixture site, a pinned date, and lookup
//! helpers that panic with the available ids on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (_tmp, site) = setup_fixtures();
//! let store = ContentStore::new(&site, SiteConfig::default());
//! let items = store.read_all(fixed_date()).unwrap();
//!
//! let dune = find_item(&items, "dune");
//! assert_eq!(dune.meta.author, "Frank Herbert");
//! ```

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::types::ContentItem;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory.
///
/// Returns the guard and the copied site root. Tests get an isolated copy
/// they can mutate without affecting other tests or the source fixtures.
pub fn setup_fixtures() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    let site = tmp.path().join("site");
    copy_dir_recursive(&fixtures, &site).unwrap();
    (tmp, site)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::other)?;
        let rel = entry.path().strip_prefix(src).map_err(std::io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// The date every test clock is pinned to: June 15, 2024.
pub fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find an item by id. Panics if not found.
pub fn find_item<'a>(items: &'a [ContentItem], id: &str) -> &'a ContentItem {
    items.iter().find(|i| i.id == id).unwrap_or_else(|| {
        let ids = item_ids(items);
        panic!("item '{id}' not found. Available: {ids:?}")
    })
}

/// All item ids in order.
pub fn item_ids(items: &[ContentItem]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::store::ContentStore;
    use crate::types::Kind;

    #[test]
    fn fixture_site_has_both_kinds() {
        let (_tmp, site) = setup_fixtures();
        let store = ContentStore::new(&site, SiteConfig::default());
        let items = store.read_all(fixed_date()).unwrap();

        assert_eq!(find_item(&items, "dune").kind(), Kind::Book);
        assert_eq!(find_item(&items, "hello-world").kind(), Kind::Note);
        assert!(site.join("index.html").is_file());
    }

    #[test]
    fn legacy_fixture_reads_through_fallbacks() {
        let (_tmp, site) = setup_fixtures();
        let store = ContentStore::new(&site, SiteConfig::default());
        let items = store.read_all(fixed_date()).unwrap();

        let legacy = find_item(&items, "legacy-notes");
        assert_eq!(legacy.meta.title, "Legacy Notes");
        assert_eq!(legacy.meta.description, "Written before front matter existed");
        assert_eq!(legacy.meta.section, "Musings");
        assert_eq!(legacy.meta.created, "November 2, 2022");
        assert_eq!(legacy.body, "<p>Old words.</p>");

        let dune = find_item(&items, "dune");
        assert_eq!(dune.meta.author, "Frank Herbert");
        assert_eq!(dune.cover_image.as_deref(), Some("images/books/dune.jpg"));
    }

    #[test]
    #[should_panic(expected = "Available")]
    fn find_item_panics_with_ids() {
        find_item(&[], "missing");
    }
}
