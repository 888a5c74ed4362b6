//! The flat-file content store.
//!
//! Every item is one `{id}.html` file. Notes live in the posts directory,
//! books in the library directory, and the directory a file sits in decides
//! its [`Kind`] regardless of what its front matter says.
//!
//! ```text
//! site/
//! ├── posts/
//! │   ├── my-first-post.html     # note
//! │   └── index.html             # ignored, never an item
//! ├── library/
//! │   └── dune.html              # book
//! └── images/books/
//!     └── dune.jpg               # cover, found by id
//! ```
//!
//! The store knows where files go and how to read them back. It does not
//! decide *what* to write; that is [`authoring`](crate::authoring)'s job.

use crate::config::{SiteConfig, SitePaths};
use crate::dates;
use crate::metadata::{self, Extractor};
use crate::naming;
use crate::render;
use crate::types::{ContentItem, Kind};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Cover extensions tried during discovery, in order.
pub const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Unsafe item id: {0:?}")]
    UnsafeId(String),
}

#[derive(Debug, Clone)]
pub struct ContentStore {
    paths: SitePaths,
    config: SiteConfig,
    extractor: Extractor,
}

impl ContentStore {
    pub fn new(root: &Path, config: SiteConfig) -> Self {
        let paths = SitePaths::resolve(root, &config.paths);
        let extractor = Extractor::new(&config);
        Self {
            paths,
            config,
            extractor,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    pub fn dir_for(&self, kind: Kind) -> &Path {
        match kind {
            Kind::Note => &self.paths.posts,
            Kind::Book => &self.paths.library,
        }
    }

    /// Path of an item's file, whether or not it exists.
    pub fn file_path(&self, kind: Kind, id: &str) -> PathBuf {
        self.dir_for(kind).join(naming::filename_for(id))
    }

    /// Public URL path, e.g. `/posts/my-first-post.html`.
    pub fn public_path(&self, kind: Kind, id: &str) -> String {
        let dir = match kind {
            Kind::Note => &self.config.paths.posts,
            Kind::Book => &self.config.paths.library,
        };
        format!("/{}/{}", dir.trim_matches('/'), naming::filename_for(id))
    }

    /// Item ids in one directory, sorted by filename. A missing directory is empty.
    pub fn list_ids(&self, kind: Kind) -> Result<Vec<String>, StoreError> {
        let dir = self.dir_for(kind);
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "content directory missing, treating as empty");
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if let Some(id) = naming::id_from_filename(&name) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    /// Find an item's file. Posts are checked before the library.
    pub fn locate(&self, id: &str) -> Option<(Kind, PathBuf)> {
        if !naming::is_safe_id(id) {
            return None;
        }
        [Kind::Note, Kind::Book]
            .into_iter()
            .map(|kind| (kind, self.file_path(kind, id)))
            .find(|(_, path)| path.is_file())
    }

    pub fn exists(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    /// Read an item by id. `Ok(None)` when no file matches.
    pub fn read(&self, id: &str, today: NaiveDate) -> Result<Option<ContentItem>, StoreError> {
        match self.locate(id) {
            Some((kind, _)) => self.read_at(kind, id, today).map(Some),
            None => Ok(None),
        }
    }

    /// Read the item stored as `id` in `kind`'s directory.
    pub fn read_at(&self, kind: Kind, id: &str, today: NaiveDate) -> Result<ContentItem, StoreError> {
        let path = self.file_path(kind, id);
        let html = fs::read_to_string(&path)?;
        Ok(self.parse(kind, id, &html, today))
    }

    /// Build an item from document text. Never fails.
    pub fn parse(&self, kind: Kind, id: &str, html: &str, today: NaiveDate) -> ContentItem {
        let mut meta = self.extractor.extract(html, Some(id), today);
        meta.kind = kind;
        let cover_image = match kind {
            Kind::Book => Some(self.discover_cover(id, meta.cover.as_deref())),
            Kind::Note => None,
        };
        ContentItem {
            id: id.to_string(),
            meta,
            body: metadata::extract_body(html),
            path: self.public_path(kind, id),
            cover_image,
        }
    }

    /// Every item in both directories, notes first, each directory in filename order.
    ///
    /// Files that can't be read are skipped with a warning so one bad file
    /// doesn't hide the rest of the site.
    pub fn read_all(&self, today: NaiveDate) -> Result<Vec<ContentItem>, StoreError> {
        let mut items = Vec::new();
        for kind in [Kind::Note, Kind::Book] {
            for id in self.list_ids(kind)? {
                match self.read_at(kind, &id, today) {
                    Ok(item) => items.push(item),
                    Err(e) => warn!(id = %id, error = %e, "skipping unreadable item"),
                }
            }
        }
        debug!(count = items.len(), "scanned content store");
        Ok(items)
    }

    /// Render and write an item to its kind's directory.
    ///
    /// If a file with the same id exists in the other directory it is removed
    /// after the new one is in place, so exactly one copy remains.
    pub fn write(&self, item: &ContentItem) -> Result<PathBuf, StoreError> {
        if !naming::is_safe_id(&item.id) {
            return Err(StoreError::UnsafeId(item.id.clone()));
        }
        let kind = item.kind();
        let target = self.file_path(kind, &item.id);
        let document = render::render_document(item, &self.config);
        write_atomic(&target, &document)?;

        let other = match kind {
            Kind::Note => Kind::Book,
            Kind::Book => Kind::Note,
        };
        let stale = self.file_path(other, &item.id);
        if stale.is_file() {
            fs::remove_file(&stale)?;
            info!(id = %item.id, from = %stale.display(), to = %target.display(), "relocated item");
        }
        Ok(target)
    }

    /// Cover path relative to the site root.
    ///
    /// Explicit value first, then the first existing `{id}.{ext}` in the
    /// covers directory, then `{id}.jpg`.
    pub fn discover_cover(&self, id: &str, explicit: Option<&str>) -> String {
        if let Some(cover) = explicit.map(str::trim).filter(|c| !c.is_empty()) {
            return cover.trim_start_matches('/').to_string();
        }
        let rel_dir = self.config.paths.covers.trim_matches('/');
        COVER_EXTENSIONS
            .iter()
            .find(|ext| self.paths.covers.join(format!("{id}.{ext}")).is_file())
            .map(|ext| format!("{rel_dir}/{id}.{ext}"))
            .unwrap_or_else(|| format!("{rel_dir}/{id}.jpg"))
    }

    /// Where a freshly processed cover for `id` is written.
    pub fn cover_output(&self, id: &str) -> PathBuf {
        self.paths.covers.join(format!("{id}.jpg"))
    }

    /// Remove covers for `id` in any extension other than `.jpg`.
    pub fn remove_stale_covers(&self, id: &str) -> Result<(), StoreError> {
        for ext in COVER_EXTENSIONS.iter().filter(|ext| **ext != "jpg") {
            let path = self.paths.covers.join(format!("{id}.{ext}"));
            if path.is_file() {
                fs::remove_file(&path)?;
                debug!(path = %path.display(), "removed stale cover");
            }
        }
        Ok(())
    }

    /// Write a derived artifact (homepage, sitemap) in place.
    pub fn write_artifact(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        write_atomic(path, contents)
    }
}

/// Sort newest first by parsed `created`, ties broken by id.
///
/// Unparsable dates sort as the epoch, i.e. last.
pub fn sort_newest_first(items: &mut [ContentItem]) {
    items.sort_by(|a, b| {
        dates::sort_key(&b.meta.created)
            .cmp(&dates::sort_key(&a.meta.created))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Write via a sibling temp file and rename, so readers never see half a file.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
