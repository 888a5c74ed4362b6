//! Authoring operations: list, get, create, update, rerender, regenerate.
//!
//! [`Authoring`] composes the [`ContentStore`], an [`ImageBackend`] for cover
//! uploads, a [`Clock`] and the post-write hooks. It is the only writer of
//! the store; the HTTP server and the CLI both go through it.
//!
//! ## Writes
//!
//! All mutations (create, update, rerender, regenerate) run under one
//! process-wide lock so that two edits can't interleave their reads and
//! writes, and regeneration never sees a half-finished edit. Reads don't
//! take the lock.
//!
//! After a successful mutation every [`PostWriteHook`] runs in order. A hook
//! failure never fails the mutation: it is logged and reported back in the
//! outcome's `warnings`. The default hook regenerates homepage and sitemap.
//!
//! ## Dates
//!
//! Create stamps `created` and `updated` with today's date. Update keeps
//! `created` as stored and sets `updated` to today.

use crate::config::SiteConfig;
use crate::dates::{self, Clock, SystemClock};
use crate::generate::{self, GenerateError, RegenerateOutcome};
use crate::imaging::{self, BackendError, ImageBackend, RustBackend};
use crate::naming;
use crate::store::{self, ContentStore, StoreError};
use crate::types::{
    ContentItem, CoverUpload, FrontMatter, ItemDetail, ItemInput, ItemSummary, Kind, WriteOutcome,
};
use chrono::NaiveDate;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AuthoringError {
    #[error("No item with id {0:?}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An item with id {0:?} already exists")]
    Conflict(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Image error: {0}")]
    Image(#[from] BackendError),
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),
}

/// Error type returned by hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Runs after every successful store mutation, while the write lock is held.
pub trait PostWriteHook: Send + Sync {
    /// Short label used in logs and warnings.
    fn name(&self) -> &str;

    fn after_write(&self, store: &ContentStore, today: NaiveDate) -> Result<(), HookError>;
}

/// Regenerates homepage and sitemap.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegenerateHook;

impl PostWriteHook for RegenerateHook {
    fn name(&self) -> &str {
        "regenerate"
    }

    fn after_write(&self, store: &ContentStore, today: NaiveDate) -> Result<(), HookError> {
        generate::regenerate(store, today)?;
        Ok(())
    }
}

/// Result of re-rendering the whole store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerenderOutcome {
    pub rendered: usize,
    pub warnings: Vec<String>,
}

pub struct Authoring {
    store: ContentStore,
    backend: Box<dyn ImageBackend>,
    clock: Box<dyn Clock>,
    hooks: Vec<Box<dyn PostWriteHook>>,
    write_lock: Mutex<()>,
}

impl Authoring {
    /// Production wiring: pure Rust image backend, system clock, regeneration hook.
    pub fn new(store: ContentStore) -> Self {
        Self {
            store,
            backend: Box::new(RustBackend::new()),
            clock: Box::new(SystemClock),
            hooks: vec![Box::new(RegenerateHook)],
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_backend(mut self, backend: impl ImageBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_hooks(mut self, hooks: Vec<Box<dyn PostWriteHook>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn config(&self) -> &SiteConfig {
        self.store.config()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Every item, newest first.
    pub fn list_items(&self) -> Result<Vec<ContentItem>, AuthoringError> {
        let mut items = self.store.read_all(self.today())?;
        store::sort_newest_first(&mut items);
        Ok(items)
    }

    pub fn list(&self) -> Result<Vec<ItemSummary>, AuthoringError> {
        Ok(self.list_items()?.iter().map(ContentItem::summary).collect())
    }

    pub fn get(&self, id: &str) -> Result<ItemDetail, AuthoringError> {
        self.store
            .read(id, self.today())?
            .map(|item| item.detail())
            .ok_or_else(|| AuthoringError::NotFound(id.to_string()))
    }

    /// Suggested section labels for the editor.
    pub fn sections(&self) -> Vec<String> {
        self.config().sections.clone()
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    pub fn create(
        &self,
        input: ItemInput,
        cover: Option<CoverUpload>,
    ) -> Result<WriteOutcome, AuthoringError> {
        let title = input
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthoringError::InvalidInput("title is required".into()))?
            .to_string();
        let id = naming::slugify(&title);
        if id.is_empty() {
            return Err(AuthoringError::InvalidInput(format!(
                "title {title:?} has no characters usable in an id"
            )));
        }
        if !naming::is_safe_id(&id) {
            return Err(AuthoringError::InvalidInput(format!(
                "title {title:?} maps to the reserved id {id:?}"
            )));
        }

        let _guard = self.lock();
        if self.store.exists(&id) {
            return Err(AuthoringError::Conflict(id));
        }

        let today = dates::format_display_date(self.today());
        let section = input
            .section
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.config().default_section.as_str())
            .to_string();
        let kind = self.kind_for_section(&section);

        let meta = FrontMatter {
            title,
            description: input.description.unwrap_or_default(),
            author: input.author.unwrap_or_default(),
            year: input.year.unwrap_or_default(),
            tags: input.tags.unwrap_or_default(),
            created: today.clone(),
            updated: today,
            section,
            kind,
            cover: None,
        };

        if let Some(upload) = &cover {
            self.store_cover(&id, kind, upload)?;
        }

        let item = self.new_item(id, meta, input.content.unwrap_or_default());
        let path = self.store.write(&item)?;
        info!(id = %item.id, kind = kind.as_str(), path = %path.display(), "created item");

        let warnings = self.run_hooks();
        Ok(self.outcome(&item, warnings))
    }

    pub fn update(
        &self,
        id: &str,
        input: ItemInput,
        cover: Option<CoverUpload>,
    ) -> Result<WriteOutcome, AuthoringError> {
        let _guard = self.lock();
        let mut item = self
            .store
            .read(id, self.today())?
            .ok_or_else(|| AuthoringError::NotFound(id.to_string()))?;
        let previous_kind = item.kind();

        if let Some(title) = input.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AuthoringError::InvalidInput("title must not be empty".into()));
            }
            item.meta.title = title;
        }
        if let Some(section) = input.section {
            let section = section.trim();
            item.meta.section = if section.is_empty() {
                self.config().default_section.clone()
            } else {
                section.to_string()
            };
            item.meta.kind = self.kind_for_section(&item.meta.section);
        }
        merge(&mut item.meta.description, input.description);
        merge(&mut item.meta.tags, input.tags);
        merge(&mut item.meta.author, input.author);
        merge(&mut item.meta.year, input.year);
        merge(&mut item.body, input.content);
        item.meta.updated = dates::format_display_date(self.today());

        let kind = item.kind();
        if let Some(upload) = &cover {
            self.store_cover(&item.id, kind, upload)?;
            item.meta.cover = None;
        }
        if kind == Kind::Note {
            item.meta.cover = None;
        }

        item.path = self.store.public_path(kind, &item.id);
        item.cover_image = match kind {
            Kind::Book => Some(self.store.discover_cover(&item.id, item.meta.cover.as_deref())),
            Kind::Note => None,
        };
        let path = self.store.write(&item)?;
        if kind != previous_kind {
            info!(id = %item.id, from = previous_kind.as_str(), to = kind.as_str(), "changed kind");
        }
        info!(id = %item.id, path = %path.display(), "updated item");

        let warnings = self.run_hooks();
        Ok(self.outcome(&item, warnings))
    }

    /// Re-render every stored item through the current templates.
    pub fn rerender(&self) -> Result<RerenderOutcome, AuthoringError> {
        let _guard = self.lock();
        let items = self.store.read_all(self.today())?;
        for item in &items {
            self.store.write(item)?;
        }
        info!(count = items.len(), "re-rendered items");
        let warnings = self.run_hooks();
        Ok(RerenderOutcome {
            rendered: items.len(),
            warnings,
        })
    }

    /// Regenerate homepage and sitemap now. Unlike the hook, failures are errors.
    pub fn regenerate(&self) -> Result<RegenerateOutcome, AuthoringError> {
        let _guard = self.lock();
        Ok(generate::regenerate(&self.store, self.today())?)
    }

    /// Homepage only.
    pub fn update_homepage(&self) -> Result<generate::HomepageOutcome, AuthoringError> {
        let _guard = self.lock();
        Ok(generate::update_homepage(&self.store, self.today())?)
    }

    /// Sitemap only.
    pub fn update_sitemap(&self) -> Result<generate::SitemapOutcome, AuthoringError> {
        let _guard = self.lock();
        Ok(generate::update_sitemap(&self.store, self.today())?)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn kind_for_section(&self, section: &str) -> Kind {
        if self.config().is_library_section(section) {
            Kind::Book
        } else {
            Kind::Note
        }
    }

    fn new_item(&self, id: String, meta: FrontMatter, body: String) -> ContentItem {
        let kind = meta.kind;
        let cover_image = match kind {
            Kind::Book => Some(self.store.discover_cover(&id, None)),
            Kind::Note => None,
        };
        ContentItem {
            path: self.store.public_path(kind, &id),
            id,
            meta,
            body,
            cover_image,
        }
    }

    /// Decode, crop and store an uploaded cover as `{id}.jpg`.
    fn store_cover(&self, id: &str, kind: Kind, upload: &CoverUpload) -> Result<(), AuthoringError> {
        if kind != Kind::Book {
            return Err(AuthoringError::InvalidInput(format!(
                "cover images are only accepted for items in the {} section",
                self.config().library_section
            )));
        }
        let output = self.store.cover_output(id);
        imaging::create_cover(
            self.backend.as_ref(),
            &upload.bytes,
            &output,
            &self.config().covers,
        )
        .map_err(|e| match e {
            BackendError::ProcessingFailed(msg) => {
                AuthoringError::InvalidInput(format!("unreadable cover image: {msg}"))
            }
            other => AuthoringError::Image(other),
        })?;
        self.store.remove_stale_covers(id)?;
        Ok(())
    }

    fn run_hooks(&self) -> Vec<String> {
        let today = self.today();
        let mut warnings = Vec::new();
        for hook in &self.hooks {
            if let Err(e) = hook.after_write(&self.store, today) {
                warn!(hook = hook.name(), error = %e, "post-write hook failed");
                warnings.push(format!("{} failed: {e}", hook.name()));
            }
        }
        warnings
    }

    fn outcome(&self, item: &ContentItem, warnings: Vec<String>) -> WriteOutcome {
        WriteOutcome {
            success: true,
            id: item.id.clone(),
            filename: item.filename(),
            path: item.path.clone(),
            kind: item.kind(),
            warnings,
        }
    }
}

fn merge(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}
