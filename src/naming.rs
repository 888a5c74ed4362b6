//! Item ids and the filenames derived from them.
//!
//! An item's id is a slug of its title, and its file is always `{id}.html`.
//! The same slug is used in URLs, so it is restricted to lowercase ASCII
//! letters, digits and single dashes:
//!
//! - `"My First Post"` → `my-first-post`
//! - `"C++ & Rust: Notes"` → `c-rust-notes`
//! - `"Don't Panic"` → `dont-panic` (apostrophes are dropped, not dashed)

const MAX_SLUG_LEN: usize = 80;

/// Derive an item id from a title.
///
/// - Lowercases ASCII letters
/// - Drops apostrophes
/// - Replaces every other non-alphanumeric character with a dash
/// - Collapses consecutive dashes and strips leading/trailing ones
/// - Truncates to `MAX_SLUG_LEN` characters, breaking at the last dash before the limit
///
/// Returns an empty string when the title has no usable characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_dash = false;
    for c in title.chars() {
        if c == '\'' || c == '\u{2019}' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }

    let trimmed = slug.trim_matches('-');
    if trimmed.len() <= MAX_SLUG_LEN {
        trimmed.to_string()
    } else {
        let truncated = &trimmed[..MAX_SLUG_LEN];
        match truncated.rfind('-') {
            Some(pos) => truncated[..pos].to_string(),
            None => truncated.to_string(),
        }
    }
}

/// Whether a string is already a valid id (what `slugify` would produce for itself).
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && slugify(id) == id
}

/// Whether an id can be joined onto a content directory without escaping it
/// and names a file the store lists as an item.
///
/// Looser than [`is_valid_id`]: hand-written files may use ids `slugify`
/// would never produce, and those must stay reachable. Reserved names such
/// as `index` are rejected.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\', '\0'])
        && !id.contains("..")
        && id_from_filename(&filename_for(id)).is_some()
}

/// `my-first-post` → `my-first-post.html`
pub fn filename_for(id: &str) -> String {
    format!("{id}.html")
}

/// The id encoded in a content filename, if it is one.
///
/// `index.html` is never an item: older sites kept a listing page inside `posts/`.
pub fn id_from_filename(filename: &str) -> Option<&str> {
    let stem = filename.strip_suffix(".html")?;
    if stem.is_empty() || stem == "index" {
        return None;
    }
    Some(stem)
}

/// Display title for an item that has none: `my-first-post` → `My First Post`.
pub fn title_from_id(id: &str) -> String {
    id.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
