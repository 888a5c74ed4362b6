//! Shared types for the content store, the authoring operations and the API.
//!
//! A content item is one HTML file. Its metadata lives in a [`FrontMatter`]
//! record at the top of the file, and its body is an opaque HTML fragment.

use serde::{Deserialize, Deserializer, Serialize};

/// Which template renders an item, and which directory stores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    Note,
    Book,
}

impl Kind {
    /// Parse a `Type` value. Accepts the older `post` and `library` spellings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "note" | "post" => Some(Self::Note),
            "book" | "library" => Some(Self::Book),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Book => "book",
        }
    }
}

/// Structured metadata stored in an item's leading comment block.
///
/// Every field degrades to an empty string; `kind` defaults to [`Kind::Note`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub description: String,
    /// Book author. Empty for notes.
    pub author: String,
    /// Publication year of a book. Empty for notes.
    pub year: String,
    /// Comma-separated tag list, as typed by the author.
    pub tags: String,
    /// Display-formatted creation date, e.g. `March 3, 2024`.
    pub created: String,
    /// Display-formatted last-update date.
    pub updated: String,
    pub section: String,
    pub kind: Kind,
    /// Explicit cover path relative to the site root. Books only.
    pub cover: Option<String>,
}

impl FrontMatter {
    /// Trimmed, non-empty tags in order.
    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(&self.tags)
    }
}

/// Split a comma-separated tag string into trimmed, non-empty tags.
pub fn split_tags(tags: &str) -> Vec<&str> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// One stored content item, read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Slug, equal to the file stem.
    pub id: String,
    pub meta: FrontMatter,
    /// Verbatim HTML body fragment.
    pub body: String,
    /// Public URL path, e.g. `/posts/my-first-post.html`.
    pub path: String,
    /// Resolved cover path relative to the site root (books only).
    pub cover_image: Option<String>,
}

impl ContentItem {
    pub fn kind(&self) -> Kind {
        self.meta.kind
    }

    pub fn filename(&self) -> String {
        format!("{}.html", self.id)
    }

    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id.clone(),
            title: self.meta.title.clone(),
            description: self.meta.description.clone(),
            tags: self.meta.tags.clone(),
            section: self.meta.section.clone(),
            kind: self.meta.kind,
            created: self.meta.created.clone(),
            updated: self.meta.updated.clone(),
            author: non_empty(&self.meta.author),
            path: self.path.clone(),
        }
    }

    pub fn detail(&self) -> ItemDetail {
        ItemDetail {
            summary: self.summary(),
            content: self.body.clone(),
            year: non_empty(&self.meta.year),
            cover: self.cover_image.clone(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// List entry returned by `GET /api/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub section: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub created: String,
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub path: String,
}

/// Single item returned by `GET /api/posts/:id`, body included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub summary: ItemSummary,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

/// Fields accepted by create and update. Absent fields keep their current
/// value on update and default to empty on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub section: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    /// Accepts `"1965"` or `1965`.
    #[serde(deserialize_with = "text_or_number")]
    pub year: Option<String>,
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Integer(n) => n.to_string(),
        TextOrNumber::Float(n) => n.to_string(),
    }))
}

/// An uploaded cover image, still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverUpload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

/// Result of a successful create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub success: bool,
    pub id: String,
    pub filename: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    /// Post-write hook failures. The write itself succeeded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_current_and_legacy_names() {
        assert_eq!(Kind::parse("note"), Some(Kind::Note));
        assert_eq!(Kind::parse("post"), Some(Kind::Note));
        assert_eq!(Kind::parse("Book"), Some(Kind::Book));
        assert_eq!(Kind::parse(" library "), Some(Kind::Book));
        assert_eq!(Kind::parse("podcast"), None);
    }

    #[test]
    fn split_tags_trims_and_drops_empties() {
        assert_eq!(split_tags("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_tags(" , ,"), Vec::<&str>::new());
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn summary_serializes_type_field_and_skips_missing_author() {
        let item = ContentItem {
            id: "hello".to_string(),
            meta: FrontMatter {
                title: "Hello".to_string(),
                ..FrontMatter::default()
            },
            body: "<p>hi</p>".to_string(),
            path: "/posts/hello.html".to_string(),
            cover_image: None,
        };
        let json = serde_json::to_value(item.summary()).unwrap();
        assert_eq!(json["type"], "note");
        assert!(json.get("author").is_none());
    }

    #[test]
    fn detail_flattens_summary_fields() {
        let item = ContentItem {
            id: "dune".to_string(),
            meta: FrontMatter {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                year: "1965".to_string(),
                kind: Kind::Book,
                ..FrontMatter::default()
            },
            body: "<p>spice</p>".to_string(),
            path: "/library/dune.html".to_string(),
            cover_image: Some("images/books/dune.jpg".to_string()),
        };
        let json = serde_json::to_value(item.detail()).unwrap();
        assert_eq!(json["id"], "dune");
        assert_eq!(json["type"], "book");
        assert_eq!(json["author"], "Frank Herbert");
        assert_eq!(json["content"], "<p>spice</p>");
        assert_eq!(json["year"], "1965");
        assert_eq!(json["cover"], "images/books/dune.jpg");
    }

    #[test]
    fn item_input_accepts_partial_json() {
        let input: ItemInput = serde_json::from_str(r#"{"title": "T"}"#).unwrap();
        assert_eq!(input.title.as_deref(), Some("T"));
        assert!(input.section.is_none());
    }

    #[test]
    fn input_year_accepts_numbers_and_strings() {
        let numeric: ItemInput = serde_json::from_str(r#"{"title": "Dune", "year": 1965}"#).unwrap();
        assert_eq!(numeric.year.as_deref(), Some("1965"));

        let text: ItemInput = serde_json::from_str(r#"{"year": "1965"}"#).unwrap();
        assert_eq!(text.year.as_deref(), Some("1965"));

        let null: ItemInput = serde_json::from_str(r#"{"year": null}"#).unwrap();
        assert!(null.year.is_none());

        let missing: ItemInput = serde_json::from_str(r#"{"title": "Dune"}"#).unwrap();
        assert!(missing.year.is_none());
    }
}
