//! # Folio
//!
//! A local authoring server and page generator for a hand-built personal
//! site. The site directory is the data source: every note and book is a
//! standalone HTML page, and its metadata lives in HTML comments at the top
//! of the file.
//!
//! # Architecture
//!
//! ```text
//! editor / CLI  →  authoring  →  store  →  posts/*.html, library/*.html
//!                      │
//!                      └─ post-write hooks → generate → index.html, sitemap.xml
//! ```
//!
//! Every page can be read back into the same [`types::FrontMatter`] it was
//! written from. Pages that predate front matter are read through their
//! `<title>`, meta tags and markup instead, and gain front matter the next
//! time they are saved.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `site.toml` loading, validation and merging over stock defaults |
//! | [`types`] | Content items, front matter and the JSON shapes the API exchanges |
//! | [`naming`] | Title → id slugs and id → filename mapping |
//! | [`dates`] | Display dates (`March 3, 2024`), sort keys and the injectable clock |
//! | [`metadata`] | Front matter parsing and the legacy-markup fallbacks |
//! | [`render`] | Full page rendering for notes and books using Maud |
//! | [`store`] | Filesystem-backed item storage with atomic writes |
//! | [`imaging`] | Book cover decoding, cropping and JPEG encoding |
//! | [`authoring`] | Create, update, list and re-render; runs post-write hooks |
//! | [`generate`] | Homepage region splicing and sitemap generation |
//! | [`server`] | The axum editor API and static file server |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## HTML Is the Database
//!
//! There is no index file or database. Listing the site means reading every
//! page in `posts/` and `library/`. The directory an item lives in decides
//! whether it is a note or a book.
//!
//! ## Generated Regions
//!
//! The homepage is hand-written except for regions bounded by marker
//! comments. [`generate`] replaces what sits between the markers and leaves
//! everything else byte-for-byte intact.
//!
//! ## Maud Over Template Engines
//!
//! Pages and homepage fragments are built with [Maud](https://maud.lambda.xyz/):
//! malformed markup is a build error and all interpolation is escaped.

pub mod authoring;
pub mod config;
pub mod dates;
pub mod generate;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod render;
pub mod server;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
