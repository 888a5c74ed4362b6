//! CLI output formatting for every command.
//!
//! Output leads with what an item *is* (index, title, section) and shows
//! file paths as indented context lines:
//!
//! ```text
//! Notes
//! 001 Hello World [Technology]
//!     Path: /posts/hello-world.html
//!     Created: March 3, 2024
//!
//! Books
//! 001 Dune by Frank Herbert [Library]
//!     Path: /library/dune.html
//! ```
//!
//! Each command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes to stdout. Format functions do no I/O.

use crate::authoring::RerenderOutcome;
use crate::generate::RegenerateOutcome;
use crate::types::{ItemSummary, Kind, WriteOutcome};

// ============================================================================
// Shared helpers
// ============================================================================

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `001 Title [Section]`, with `by Author` for books that name one.
fn entity_header(index: usize, item: &ItemSummary) -> String {
    let title = match item.author.as_deref() {
        Some(author) if !author.is_empty() => format!("{} by {}", item.title, author),
        _ => item.title.clone(),
    };
    format!("{} {} [{}]", format_index(index), title, item.section)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// list
// ============================================================================

/// Format the item inventory, notes first, each group in the given order.
pub fn format_list_output(items: &[ItemSummary]) -> Vec<String> {
    let mut lines = Vec::new();

    for (heading, kind) in [("Notes", Kind::Note), ("Books", Kind::Book)] {
        let group: Vec<&ItemSummary> = items.iter().filter(|i| i.kind == kind).collect();
        if group.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(heading.to_string());
        for (i, item) in group.iter().enumerate() {
            lines.push(entity_header(i + 1, item));
            lines.push(format!("{}Path: {}", indent(1), item.path));
            if !item.created.is_empty() {
                lines.push(format!("{}Created: {}", indent(1), item.created));
            }
            if !item.updated.is_empty() && item.updated != item.created {
                lines.push(format!("{}Updated: {}", indent(1), item.updated));
            }
        }
    }

    if lines.is_empty() {
        lines.push("No content yet".to_string());
    }
    lines
}

pub fn print_list_output(items: &[ItemSummary]) {
    for line in format_list_output(items) {
        println!("{}", line);
    }
}

// ============================================================================
// new / write
// ============================================================================

pub fn format_write_outcome(outcome: &WriteOutcome) -> Vec<String> {
    let mut lines = vec![format!("Wrote {} {} → {}", outcome.kind.as_str(), outcome.id, outcome.path)];
    lines.extend(
        outcome
            .warnings
            .iter()
            .map(|w| format!("{}Warning: {}", indent(1), w)),
    );
    lines
}

pub fn print_write_outcome(outcome: &WriteOutcome) {
    for line in format_write_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// regenerate / homepage / sitemap
// ============================================================================

pub fn format_homepage_outcome(outcome: &crate::generate::HomepageOutcome) -> Vec<String> {
    vec![
        format!("Homepage → {}", outcome.path.display()),
        format!(
            "{}{}, {} in {}",
            indent(1),
            plural(outcome.books, "book", "books"),
            plural(outcome.notes, "note", "notes"),
            plural(outcome.sections, "section", "sections"),
        ),
    ]
}

pub fn format_sitemap_outcome(outcome: &crate::generate::SitemapOutcome) -> Vec<String> {
    vec![
        format!("Sitemap → {}", outcome.path.display()),
        format!("{}{}", indent(1), plural(outcome.urls, "url", "urls")),
    ]
}

pub fn format_regenerate_outcome(outcome: &RegenerateOutcome) -> Vec<String> {
    let mut lines = format_homepage_outcome(&outcome.homepage);
    lines.extend(format_sitemap_outcome(&outcome.sitemap));
    lines
}

pub fn print_regenerate_outcome(outcome: &RegenerateOutcome) {
    for line in format_regenerate_outcome(outcome) {
        println!("{}", line);
    }
}

pub fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// rerender
// ============================================================================

pub fn format_rerender_outcome(outcome: &RerenderOutcome) -> Vec<String> {
    let mut lines = vec![format!("Re-rendered {}", plural(outcome.rendered, "item", "items"))];
    lines.extend(
        outcome
            .warnings
            .iter()
            .map(|w| format!("{}Warning: {}", indent(1), w)),
    );
    lines
}

pub fn print_rerender_outcome(outcome: &RerenderOutcome) {
    for line in format_rerender_outcome(outcome) {
        println!("{}", line);
    }
}
