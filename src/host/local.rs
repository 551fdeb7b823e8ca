//! Filesystem-backed collection
//!
//! A directory laid out like a flashcard profile:
//!
//! ```text
//! <root>/collection.media/   media store
//! <root>/media.trash/        where reconciled orphans are moved
//! <root>/notes.json          {"<note id>": {"<field>": "<html>"}}
//! ```
//!
//! Used by the command line front end and by tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{MediaStore, NoteFields, NoteId, NoteStore};
use crate::error::HostError;

pub const MEDIA_DIR: &str = "collection.media";
pub const NOTES_FILE: &str = "notes.json";

/// Media directory and notes of a local collection
pub struct LocalCollection {
    root: PathBuf,
    notes: RwLock<BTreeMap<NoteId, NoteFields>>,
}

impl LocalCollection {
    /// Open (creating the media directory if needed) a collection at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(MEDIA_DIR))
            .with_context(|| format!("Failed to create media directory under {}", root.display()))?;

        let notes_path = root.join(NOTES_FILE);
        let notes = if notes_path.exists() {
            let raw = fs::read_to_string(&notes_path)
                .with_context(|| format!("Failed to read {}", notes_path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", notes_path.display()))?
        } else {
            BTreeMap::new()
        };

        info!(root = %root.display(), notes = notes.len(), "Opened local collection");
        Ok(Self {
            root,
            notes: RwLock::new(notes),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add a note and persist the notes file. Returns the new note id.
    pub fn add_note(&self, fields: NoteFields) -> Result<NoteId> {
        let id = {
            let mut notes = self.notes.write();
            let id = notes.keys().next_back().map_or(1, |last| last + 1);
            notes.insert(id, fields);
            id
        };
        self.save()?;
        Ok(id)
    }

    /// Replace the fields of an existing note and persist.
    pub fn update_note(&self, id: NoteId, fields: NoteFields) -> Result<()> {
        {
            let mut notes = self.notes.write();
            let note = notes.get_mut(&id).context("Note not found")?;
            *note = fields;
        }
        self.save()
    }

    fn save(&self) -> Result<()> {
        let path = self.root.join(NOTES_FILE);
        let raw = serde_json::to_string_pretty(&*self.notes.read())?;
        fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))
    }
}

impl MediaStore for LocalCollection {
    fn add_file(&self, path: &Path) -> Result<String, HostError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(sanitize_filename::sanitize)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                HostError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("unusable media file name: {}", path.display()),
                ))
            })?;

        let data = fs::read(path)?;
        let media_dir = self.media_root();
        let mut stored = name.clone();
        let target = media_dir.join(&stored);

        if target.exists() {
            if fs::read(&target)? == data {
                debug!(name = %stored, "Identical media already stored");
                return Ok(stored);
            }
            stored = with_hash_suffix(&name, &data);
            debug!(original = %name, renamed = %stored, "Renamed media on collision");
        }

        fs::write(media_dir.join(&stored), &data)?;
        Ok(stored)
    }

    fn media_root(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }
}

/// `stem-<first 8 hex chars of sha256>.ext`
fn with_hash_suffix(name: &str, data: &[u8]) -> String {
    let hash = format!("{:x}", Sha256::digest(data));
    let short_hash = &hash[..8];
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{short_hash}.{ext}"),
        _ => format!("{name}-{short_hash}"),
    }
}

impl NoteStore for LocalCollection {
    fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, HostError> {
        let terms = parse_query(query)?;
        let notes = self.notes.read();
        Ok(notes
            .iter()
            .filter(|(_, fields)| {
                fields
                    .values()
                    .any(|text| terms.iter().any(|term| term.is_match(text)))
            })
            .map(|(id, _)| *id)
            .collect())
    }

    fn get_note(&self, id: NoteId) -> Result<NoteFields, HostError> {
        self.notes
            .read()
            .get(&id)
            .cloned()
            .ok_or(HostError::NoteNotFound(id))
    }
}

/// Compile a search of the form `"term" OR "term"`. Inside a term `*`
/// matches anything and `\"` is a literal quote; matching is a case
/// insensitive substring search.
fn parse_query(query: &str) -> Result<Vec<Regex>, HostError> {
    query
        .split(" OR ")
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .map(|term| {
            let term = term
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(term)
                .replace("\\\"", "\"");
            let pattern = term
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            Regex::new(&format!("(?is){pattern}"))
                .map_err(|e| HostError::Script(format!("invalid search term: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reconcile::NOTE_QUERY;

    fn note(front: &str) -> NoteFields {
        BTreeMap::from([
            ("Front".to_string(), front.to_string()),
            ("Back".to_string(), String::new()),
        ])
    }

    #[test]
    fn test_add_file_keeps_name_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LocalCollection::open(dir.path()).unwrap();
        let staged = dir.path().join("clip.ogg");

        fs::write(&staged, b"one").unwrap();
        assert_eq!(collection.add_file(&staged).unwrap(), "clip.ogg");
        // Same content, same name
        assert_eq!(collection.add_file(&staged).unwrap(), "clip.ogg");

        fs::write(&staged, b"two").unwrap();
        let renamed = collection.add_file(&staged).unwrap();
        assert_ne!(renamed, "clip.ogg");
        assert!(renamed.starts_with("clip-") && renamed.ends_with(".ogg"));
        assert_eq!(fs::read(collection.media_root().join(&renamed)).unwrap(), b"two");
    }

    #[test]
    fn test_notes_persist() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LocalCollection::open(dir.path()).unwrap();
        let id = collection.add_note(note("hello")).unwrap();

        let reopened = LocalCollection::open(dir.path()).unwrap();
        assert_eq!(reopened.get_note(id).unwrap()["Front"], "hello");
        assert!(matches!(reopened.get_note(99), Err(HostError::NoteNotFound(99))));
    }

    #[test]
    fn test_sweep_query_matches_inline_media() {
        let dir = tempfile::tempdir().unwrap();
        let collection = LocalCollection::open(dir.path()).unwrap();
        let audio = collection
            .add_note(note(r#"<audio id="x" src="_im-media-a.ogg"></audio>"#))
            .unwrap();
        let video = collection
            .add_note(note(r#"<VIDEO class="inline-media" src="_im-media-b.webm"></VIDEO>"#))
            .unwrap();
        collection.add_note(note(r#"<img src="_im-media-c.png">"#)).unwrap();
        collection.add_note(note(r#"<audio src="other.ogg"></audio>"#)).unwrap();

        assert_eq!(collection.find_notes(NOTE_QUERY).unwrap(), vec![audio, video]);
    }
}
