//! Orphan reconciliation
//!
//! Cross-references the inline media files in the media directory against
//! the `src="..."` references found in note fields. Files nobody references
//! are orphans and can be moved to the trash directory next to the media
//! directory. The file name convention is the only record of which files
//! belong to inline media.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::host::NoteStore;
use crate::media::naming;

/// Note search for fields that embed an inline audio or video element.
pub const NOTE_QUERY: &str = r#""<audio *src=\"_im-media-" OR "<video *src=\"_im-media-""#;

/// Name of the trash directory created beside the media directory.
pub const TRASH_DIR: &str = "media.trash";

/// Result of one sweep. Never cached; each sweep recomputes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanReport {
    /// Orphaned file names, sorted
    pub orphans: Vec<String>,
    /// Distinct inline media files referenced by notes
    pub referenced: usize,
    /// Inline media files present on disk
    pub on_disk: usize,
}

impl OrphanReport {
    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
    }

    /// Text shown in the confirmation dialog.
    pub fn confirmation_text(&self) -> String {
        format!(
            "Found the following orphaned files:\n{}\n\nDelete these files?",
            self.orphans.join("\n")
        )
    }
}

/// Result of moving orphans to the trash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrashOutcome {
    pub moved: usize,
    pub failed: Vec<String>,
}

/// Every inline media file name referenced by any note matching [`NOTE_QUERY`].
pub fn collect_references(notes: &dyn NoteStore) -> Result<HashSet<String>> {
    let ids = notes
        .find_notes(NOTE_QUERY)
        .context("Failed to search notes for inline media")?;

    let mut refs = HashSet::new();
    for id in &ids {
        let fields = notes
            .get_note(*id)
            .with_context(|| format!("Failed to load note {id}"))?;
        for text in fields.values() {
            refs.extend(naming::referenced_filenames(text).map(str::to_string));
        }
    }

    debug!(notes = ids.len(), references = refs.len(), "Collected inline media references");
    Ok(refs)
}

/// Inline media files directly inside `media_root`, sorted by name.
pub fn list_media_files(media_root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(media_root).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list {}", media_root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if naming::is_media_filename(name) {
                files.push(name.to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Files on disk with no reference.
pub fn find_orphans(references: &HashSet<String>, files: &[String]) -> Vec<String> {
    files
        .iter()
        .filter(|name| !references.contains(*name))
        .cloned()
        .collect()
}

/// Run a full sweep: references, files, difference.
pub fn scan(notes: &dyn NoteStore, media_root: &Path) -> Result<OrphanReport> {
    let references = collect_references(notes)?;
    let files = list_media_files(media_root)?;
    let orphans = find_orphans(&references, &files);

    info!(
        media_root = %media_root.display(),
        referenced = references.len(),
        on_disk = files.len(),
        orphans = orphans.len(),
        "Inline media check complete"
    );

    Ok(OrphanReport {
        orphans,
        referenced: references.len(),
        on_disk: files.len(),
    })
}

/// Trash directory for `media_root`: a sibling named [`TRASH_DIR`].
pub fn trash_dir(media_root: &Path) -> PathBuf {
    media_root
        .parent()
        .unwrap_or(media_root)
        .join(TRASH_DIR)
}

/// Move `orphans` from `media_root` into the trash directory, counting the
/// files actually moved. Names outside the inline media convention are
/// refused.
pub fn trash_orphans(media_root: &Path, orphans: &[String]) -> Result<TrashOutcome> {
    let trash = trash_dir(media_root);
    fs::create_dir_all(&trash)
        .with_context(|| format!("Failed to create trash directory {}", trash.display()))?;

    let mut outcome = TrashOutcome::default();
    for name in orphans {
        if !naming::is_media_filename(name) {
            warn!(name = %name, "Refusing to trash a file outside the inline media convention");
            outcome.failed.push(name.clone());
            continue;
        }

        let from = media_root.join(name);
        match move_file(&from, &trash.join(name)) {
            Ok(()) => outcome.moved += 1,
            Err(e) => {
                warn!(path = %from.display(), error = %e, "Failed to move orphan to trash");
                outcome.failed.push(name.clone());
            }
        }
    }

    info!(
        trash = %trash.display(),
        moved = outcome.moved,
        failed = outcome.failed.len(),
        "Moved orphaned inline media to trash"
    );
    Ok(outcome)
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !from.is_file() {
                return Err(rename_err);
            }
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const A: &str = "_im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a.ogg";
    const B: &str = "_im-media-7d1e0f2a-9b3c-4d5e-8f60-718293a4b5c6.ogg";

    #[test]
    fn test_find_orphans() {
        let refs = HashSet::from([A.to_string()]);
        let files = vec![A.to_string(), B.to_string()];
        assert_eq!(find_orphans(&refs, &files), vec![B.to_string()]);
        assert!(find_orphans(&refs, &[A.to_string()]).is_empty());
    }

    #[test]
    fn test_list_media_files_filters_convention() {
        let dir = tempfile::tempdir().unwrap();
        for name in [B, A, "picture.png", "_im-media-short.ogg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("_im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a.dir")).unwrap();

        assert_eq!(list_media_files(dir.path()).unwrap(), vec![A.to_string(), B.to_string()]);
    }

    #[test]
    fn test_trash_orphans_moves_into_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("collection.media");
        fs::create_dir(&media).unwrap();
        fs::write(media.join(B), b"orphan").unwrap();

        let outcome = trash_orphans(&media, &[B.to_string(), "../notes.json".to_string()]).unwrap();

        assert_eq!(outcome.moved, 1);
        assert_eq!(outcome.failed, vec!["../notes.json".to_string()]);
        assert!(!media.join(B).exists());
        assert_eq!(fs::read(dir.path().join(TRASH_DIR).join(B)).unwrap(), b"orphan");
    }

    #[test]
    fn test_trash_counts_only_successes() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("collection.media");
        fs::create_dir(&media).unwrap();

        let outcome = trash_orphans(&media, &[A.to_string()]).unwrap();
        assert_eq!(outcome.moved, 0);
        assert_eq!(outcome.failed, vec![A.to_string()]);
    }

    #[test]
    fn test_confirmation_text_lists_every_orphan() {
        let report = OrphanReport {
            orphans: vec![A.to_string(), B.to_string()],
            referenced: 0,
            on_disk: 2,
        };
        let text = report.confirmation_text();
        assert!(text.contains(A) && text.contains(B));
        assert!(text.ends_with("Delete these files?"));
    }
}
