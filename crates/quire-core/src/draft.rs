//! Post metadata that travels alongside the document.
//!
//! ## Learning: Enums for Closed Sets of Updates
//!
//! Each widget of the post form edits exactly one field. [`DraftField`]
//! makes "one field and its value" a single value, so an update can never
//! touch a sibling field by accident, and the compiler checks that every
//! field has a setter.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::assets::LocalFile;

/// A post as stored by the persistence service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedPost {
    pub title: String,
    /// Serialized document markup
    pub content: String,
    pub meta: String,
    pub slug: String,
    pub tags: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// The post thumbnail.
///
/// Either a gallery URL or a local file the user picked but has not
/// uploaded yet. Uploading before submit is up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Thumbnail {
    #[default]
    None,
    Remote(String),
    Pending(LocalFile),
}

impl Thumbnail {
    pub fn is_pending(&self) -> bool {
        matches!(self, Thumbnail::Pending(_))
    }

    fn from_saved(src: Option<String>) -> Self {
        match src {
            Some(src) if !src.trim().is_empty() => Thumbnail::Remote(src),
            _ => Thumbnail::None,
        }
    }
}

/// Names of the metadata fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Title,
    Slug,
    Meta,
    Tags,
    Thumbnail,
}

impl FieldName {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(FieldName::Title),
            "slug" => Some(FieldName::Slug),
            "meta" => Some(FieldName::Meta),
            "tags" => Some(FieldName::Tags),
            "thumbnail" => Some(FieldName::Thumbnail),
            _ => None,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldName::Title => "title",
            FieldName::Slug => "slug",
            FieldName::Meta => "meta",
            FieldName::Tags => "tags",
            FieldName::Thumbnail => "thumbnail",
        };
        f.write_str(name)
    }
}

/// A single field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    Title(String),
    Slug(String),
    Meta(String),
    Tags(String),
    Thumbnail(Thumbnail),
}

impl DraftField {
    pub fn name(&self) -> FieldName {
        match self {
            DraftField::Title(_) => FieldName::Title,
            DraftField::Slug(_) => FieldName::Slug,
            DraftField::Meta(_) => FieldName::Meta,
            DraftField::Tags(_) => FieldName::Tags,
            DraftField::Thumbnail(_) => FieldName::Thumbnail,
        }
    }

    /// Builds an update from a string-keyed widget.
    ///
    /// A thumbnail given as text is a gallery URL; an empty string clears it.
    pub fn from_named(name: FieldName, value: impl Into<String>) -> Self {
        let value = value.into();
        match name {
            FieldName::Title => DraftField::Title(value),
            FieldName::Slug => DraftField::Slug(value),
            FieldName::Meta => DraftField::Meta(value),
            FieldName::Tags => DraftField::Tags(value),
            FieldName::Thumbnail if value.trim().is_empty() => {
                DraftField::Thumbnail(Thumbnail::None)
            }
            FieldName::Thumbnail => DraftField::Thumbnail(Thumbnail::Remote(value)),
        }
    }
}

/// The metadata fields of a post being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftFields {
    pub title: String,
    pub slug: String,
    pub meta: String,
    pub tags: String,
    pub thumbnail: Thumbnail,
}

impl DraftFields {
    /// Copies every metadata field of a saved post.
    pub fn from_saved(post: &SavedPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            meta: post.meta.clone(),
            tags: post.tags.clone(),
            thumbnail: Thumbnail::from_saved(post.thumbnail.clone()),
        }
    }

    /// Sets one field and leaves the others alone.
    pub fn apply(&mut self, field: DraftField) {
        match field {
            DraftField::Title(v) => self.title = v,
            DraftField::Slug(v) => self.slug = v,
            DraftField::Meta(v) => self.meta = v,
            DraftField::Tags(v) => self.tags = v,
            DraftField::Thumbnail(v) => self.thumbnail = v,
        }
    }

    /// Tags split on commas, trimmed, empties dropped.
    pub fn tag_list(&self) -> Vec<String> {
        tag_list(&self.tags)
    }
}

/// The thumbnail as it leaves the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DraftThumbnail {
    Remote { src: String },
    Pending {
        name: String,
        #[serde(rename = "contentType")]
        content_type: String,
        size: usize,
    },
}

/// The finalized post handed to the persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub meta: String,
    pub slug: String,
    pub tags: String,
    pub thumbnail: Option<DraftThumbnail>,
    /// The picked file, when the thumbnail is still local
    #[serde(skip)]
    pub pending_thumbnail: Option<LocalFile>,
}

impl PostDraft {
    pub(crate) fn new(fields: &DraftFields, content: String) -> Self {
        let (thumbnail, pending_thumbnail) = match &fields.thumbnail {
            Thumbnail::None => (None, None),
            Thumbnail::Remote(src) => (Some(DraftThumbnail::Remote { src: src.clone() }), None),
            Thumbnail::Pending(file) => (
                Some(DraftThumbnail::Pending {
                    name: file.name.clone(),
                    content_type: file.content_type.clone(),
                    size: file.len(),
                }),
                Some(file.clone()),
            ),
        };
        Self {
            title: fields.title.clone(),
            content,
            meta: fields.meta.clone(),
            slug: fields.slug.clone(),
            tags: fields.tags.clone(),
            thumbnail,
            pending_thumbnail,
        }
    }

    /// Returns true if the thumbnail must be uploaded before submitting.
    pub fn needs_thumbnail_upload(&self) -> bool {
        self.pending_thumbnail.is_some()
    }

    /// The JSON body sent to the persistence service.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ==================== Helpers ====================

/// Turns a title into a URL slug.
///
/// Words are found with Unicode word segmentation, lowercased and joined
/// with hyphens; punctuation disappears.
pub fn slugify(title: &str) -> String {
    title
        .unicode_words()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Splits a comma-separated tag string.
pub fn tag_list(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Counts words in plain text.
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_touches_one_field() {
        let mut fields = DraftFields {
            meta: "m".into(),
            thumbnail: Thumbnail::Remote("/t.png".into()),
            ..Default::default()
        };
        fields.apply(DraftField::Title("X".into()));
        fields.apply(DraftField::Slug("y".into()));
        assert_eq!(fields.title, "X");
        assert_eq!(fields.slug, "y");
        assert_eq!(fields.meta, "m");
        assert_eq!(fields.thumbnail, Thumbnail::Remote("/t.png".into()));
    }

    #[test]
    fn test_field_names() {
        for name in ["title", "slug", "meta", "tags", "thumbnail"] {
            assert_eq!(FieldName::from_name(name).unwrap().to_string(), name);
        }
        assert_eq!(FieldName::from_name("content"), None);
        assert_eq!(
            DraftField::from_named(FieldName::Thumbnail, " "),
            DraftField::Thumbnail(Thumbnail::None)
        );
    }

    #[test]
    fn test_saved_post_defaults() {
        let post: SavedPost = serde_json::from_str(r#"{"title":"Hi"}"#).unwrap();
        assert_eq!(post.title, "Hi");
        assert_eq!(post.content, "");
        assert_eq!(post.thumbnail, None);
        assert_eq!(DraftFields::from_saved(&post).thumbnail, Thumbnail::None);
    }

    #[test]
    fn test_post_draft_serializes_pending_thumbnail() {
        let fields = DraftFields {
            title: "Hi".into(),
            thumbnail: Thumbnail::Pending(LocalFile::new("t.png", "image/png", vec![0; 3])),
            ..Default::default()
        };
        let draft = PostDraft::new(&fields, "<p></p>".into());
        assert!(draft.needs_thumbnail_upload());

        let json: serde_json::Value = serde_json::from_str(&draft.to_json().unwrap()).unwrap();
        assert_eq!(json["thumbnail"]["kind"], "pending");
        assert_eq!(json["thumbnail"]["contentType"], "image/png");
        assert_eq!(json["thumbnail"]["size"], 3);
        assert!(json.get("pending_thumbnail").is_none());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust's   2024 edition "), "rusts-2024-edition");
        assert_eq!(slugify("Ünïcödé Títle"), "ünïcödé-títle");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_tag_list() {
        assert_eq!(tag_list("rust, web ,, cms"), vec!["rust", "web", "cms"]);
        assert!(tag_list("  ").is_empty());
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("Hello brave new world."), 4);
        assert_eq!(word_count(""), 0);
    }
}
