//! Identifier and filename conventions for inline media
//!
//! Every element this crate inserts carries an id of the form
//! `im-media-<uuid>`, and the file backing it is stored as
//! `_im-media-<uuid>.<ext>`. The reconciliation sweep has no other record of
//! which media files belong to us, so these patterns must stay stable.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of every inline media element id.
pub const MEDIA_ID_PREFIX: &str = "im-media-";

/// Prefix of the temporary caret marker nodes.
pub const MARKER_ID_PREFIX: &str = "im-tmp-";

/// Regex fragment matching a media identifier (no anchors).
pub const MEDIA_ID_PATTERN: &str =
    r"im-media-[0-9a-z]{8}-[0-9a-z]{4}-[0-9a-z]{4}-[0-9a-z]{4}-[0-9a-z]{12}";

static MEDIA_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{MEDIA_ID_PATTERN}$")).expect("valid media id regex"));

static MEDIA_FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^_{MEDIA_ID_PATTERN}\.[0-9a-z]*$")).expect("valid media filename regex")
});

static MEDIA_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"src="(_{MEDIA_ID_PATTERN}\.[0-9a-z]*)""#))
        .expect("valid media reference regex")
});

/// Which element an ingestion request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Lowercase tag name, also used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    /// Map a DOM `tagName` (upper case in HTML documents) to a kind.
    ///
    /// Anything that is not a video element is edited as audio.
    pub fn from_tag_name(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("video") {
            MediaKind::Video
        } else {
            MediaKind::Audio
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique id of one inserted media element (`im-media-<uuid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaIdentifier(String);

impl MediaIdentifier {
    /// Generate a fresh identifier. Identifiers are never reused.
    pub fn generate() -> Self {
        Self(format!("{MEDIA_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Accept an existing identifier string if it has the exact expected shape.
    pub fn parse(value: &str) -> Option<Self> {
        is_media_id(value).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename of the asset backing this element: `_<id>.<ext>`.
    pub fn filename(&self, extension: &str) -> String {
        format!("_{}.{}", self.0, extension)
    }
}

impl fmt::Display for MediaIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a caret marker id (`im-tmp-<uuid>`).
pub fn marker_id() -> String {
    format!("{MARKER_ID_PREFIX}{}", Uuid::new_v4())
}

/// True when `value` is exactly a media identifier.
pub fn is_media_id(value: &str) -> bool {
    MEDIA_ID_RE.is_match(value)
}

/// True when `name` is a file name this crate could have created.
pub fn is_media_filename(name: &str) -> bool {
    MEDIA_FILENAME_RE.is_match(name)
}

/// All inline media file names referenced through `src="..."` in `text`.
pub fn referenced_filenames(text: &str) -> impl Iterator<Item = &str> {
    MEDIA_REFERENCE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Lowercase extension of `path` without the leading dot; empty when absent.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_identifier_shape() {
        let id = MediaIdentifier::generate();
        assert!(id.as_str().starts_with(MEDIA_ID_PREFIX));
        assert!(is_media_id(id.as_str()));
        assert!(is_media_filename(&id.filename("ogg")));
        assert_ne!(id, MediaIdentifier::generate());
    }

    #[test]
    fn test_parse_rejects_other_strings() {
        assert!(MediaIdentifier::parse("im-media-123").is_none());
        assert!(MediaIdentifier::parse("pycmd").is_none());
        let id = MediaIdentifier::generate();
        assert_eq!(MediaIdentifier::parse(id.as_str()), Some(id.clone()));
        // Anchored on both ends
        assert!(MediaIdentifier::parse(&format!(" {id}")).is_none());
    }

    #[test]
    fn test_media_filename_convention() {
        let name = "_im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a.ogg";
        assert!(is_media_filename(name));
        assert!(!is_media_filename("im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a.ogg"));
        assert!(!is_media_filename("_im-media-0b6c2f1e.ogg"));
        assert!(!is_media_filename("_im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a.OGG"));
        assert!(!is_media_filename("picture.png"));
    }

    #[test]
    fn test_referenced_filenames() {
        let field = concat!(
            r#"&nbsp;<audio id="im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a" "#,
            r#"src="_im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a.ogg" controls></audio>"#,
            r#"<img src="_im-media-bad.png"><img src="cat.jpg">"#,
        );
        let found: Vec<&str> = referenced_filenames(field).collect();
        assert_eq!(found, vec!["_im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a.ogg"]);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("/tmp/Clip.MP4")), "mp4");
        assert_eq!(extension_of(Path::new("noext")), "");
        assert_eq!(MediaKind::from_tag_name("VIDEO"), MediaKind::Video);
        assert_eq!(MediaKind::from_tag_name("AUDIO"), MediaKind::Audio);
    }
}
