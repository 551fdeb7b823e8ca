//! Capabilities the host application provides
//!
//! The pipelines never talk to the host's widgets or storage directly. They go
//! through these traits so they can run against a real editor, the local
//! collection used by the command line, or test fakes.
//!
//! - [`EditorHost`] is UI-thread only and deliberately not `Send`.
//! - [`MediaStore`] and [`NoteStore`] are collection-level and are handed to
//!   background tasks.

pub mod local;
pub mod terminal;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::HostError;
use crate::media::markup;

pub use local::LocalCollection;
pub use terminal::TerminalHost;

/// Note id as used by the host's note store.
pub type NoteId = i64;

/// Field name to field text.
pub type NoteFields = BTreeMap<String, String>;

/// Tag name and attributes of an element found in the editing surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSnapshot {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
}

impl ElementSnapshot {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Decode the value returned by [`markup::query_element_script`]:
    /// `null` when the element is missing, otherwise
    /// `[tagName, auto_front, auto_back, loop, mute, height, width]`
    /// with `null` for absent attributes.
    pub fn from_script_value(value: &serde_json::Value) -> Option<Self> {
        let items = value.as_array()?;
        let tag_name = items.first()?.as_str()?.to_string();

        let mut attributes = BTreeMap::new();
        for (name, item) in markup::QUERIED_ATTRIBUTES.iter().zip(items.iter().skip(1)) {
            let text = match item {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            attributes.insert((*name).to_string(), text);
        }

        Some(Self {
            tag_name,
            attributes,
        })
    }
}

/// UI-side capabilities of the editor the extension is attached to.
pub trait EditorHost {
    /// Run a script in the editor document and return its JSON result.
    fn evaluate_script(&self, script: &str) -> Result<serde_json::Value, HostError>;

    /// Look up an inline media element by id across all editing surfaces.
    fn query_element(&self, element_id: &str) -> Option<ElementSnapshot> {
        match self.evaluate_script(&markup::query_element_script(element_id)) {
            Ok(value) => ElementSnapshot::from_script_value(&value),
            Err(e) => {
                tracing::warn!(element_id = %element_id, error = %e, "Element query failed");
                None
            }
        }
    }

    /// Transient, non-modal notification.
    fn show_notification(&self, message: &str);

    /// Modal yes/no gate. Only used before destructive actions.
    fn confirm(&self, title: &str, message: &str) -> bool;
}

/// The host's content-addressed media store.
pub trait MediaStore: Send + Sync {
    /// Copy `path` into the store. The returned name is authoritative; the
    /// store may rename on collision.
    fn add_file(&self, path: &Path) -> Result<String, HostError>;

    /// Directory the store keeps its files in.
    fn media_root(&self) -> PathBuf;
}

/// Read access to the host's notes.
pub trait NoteStore: Send + Sync {
    fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, HostError>;

    fn get_note(&self, id: NoteId) -> Result<NoteFields, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_script_value() {
        let value = json!(["VIDEO", "true", null, "true", null, "240", null]);
        let snapshot = ElementSnapshot::from_script_value(&value).unwrap();
        assert_eq!(snapshot.tag_name, "VIDEO");
        assert!(snapshot.has_attribute("auto_front"));
        assert!(!snapshot.has_attribute("auto_back"));
        assert!(snapshot.has_attribute("loop"));
        assert_eq!(snapshot.attribute("height"), Some("240"));
        assert_eq!(snapshot.attribute("width"), None);
    }

    #[test]
    fn test_snapshot_missing_element() {
        assert!(ElementSnapshot::from_script_value(&serde_json::Value::Null).is_none());
        assert!(ElementSnapshot::from_script_value(&json!([])).is_none());
    }
}
