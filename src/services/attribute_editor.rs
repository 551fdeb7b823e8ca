//! Attribute editor for an existing inline media element
//!
//! Closed until the context menu's "edit" action opens it on an element id.
//! Opening reads the element's current attributes; accept writes them back,
//! delete removes the element, reject discards the changes. All three return
//! the editor to closed. An element that can no longer be found turns the
//! action into a logged no-op.

use tracing::{debug, info, warn};

use crate::host::{EditorHost, ElementSnapshot};
use crate::media::markup::{self, BOOLEAN_ATTRIBUTES};
use crate::media::naming::MediaKind;
use crate::services::context_menu::ElementRequest;

/// Editable attributes of one media element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttributes {
    pub kind: MediaKind,
    pub auto_front: bool,
    pub auto_back: bool,
    pub loop_playback: bool,
    pub mute: bool,
    /// Video only
    pub height: Option<u32>,
    /// Video only
    pub width: Option<u32>,
}

impl MediaAttributes {
    /// Boolean attributes count as set when present, whatever their value.
    /// Dimensions that are not positive count as unset.
    pub fn from_snapshot(snapshot: &ElementSnapshot) -> Self {
        let dimension = |name: &str| {
            snapshot
                .attribute(name)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v > 0)
                .and_then(|v| u32::try_from(v).ok())
        };
        Self {
            kind: MediaKind::from_tag_name(&snapshot.tag_name),
            auto_front: snapshot.has_attribute("auto_front"),
            auto_back: snapshot.has_attribute("auto_back"),
            loop_playback: snapshot.has_attribute("loop"),
            mute: snapshot.has_attribute("mute"),
            height: dimension("height"),
            width: dimension("width"),
        }
    }

    fn flags(&self) -> [bool; 4] {
        [self.auto_front, self.auto_back, self.loop_playback, self.mute]
    }
}

/// One attribute change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOp {
    Set(&'static str, String),
    Remove(&'static str),
}

/// A change to apply to an element in the editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementEdit {
    Update {
        element_id: String,
        ops: Vec<AttributeOp>,
    },
    Delete {
        element_id: String,
    },
}

impl ElementEdit {
    /// Write back `attrs`: the four flags always, dimensions only for video.
    pub fn update(element_id: &str, attrs: &MediaAttributes) -> Self {
        let mut ops: Vec<AttributeOp> = BOOLEAN_ATTRIBUTES
            .into_iter()
            .zip(attrs.flags())
            .map(|(name, enabled)| {
                if enabled {
                    AttributeOp::Set(name, "true".to_string())
                } else {
                    AttributeOp::Remove(name)
                }
            })
            .collect();

        if attrs.kind == MediaKind::Video {
            for (name, value) in [("height", attrs.height), ("width", attrs.width)] {
                ops.push(match value {
                    Some(v) => AttributeOp::Set(name, v.to_string()),
                    None => AttributeOp::Remove(name),
                });
            }
        }

        ElementEdit::Update {
            element_id: element_id.to_string(),
            ops,
        }
    }

    pub fn element_id(&self) -> &str {
        match self {
            ElementEdit::Update { element_id, .. } | ElementEdit::Delete { element_id } => element_id,
        }
    }

    /// Script performing the edit; evaluates to `false` when the element is gone.
    pub fn to_script(&self) -> String {
        let statements = match self {
            ElementEdit::Update { ops, .. } => ops
                .iter()
                .map(|op| match op {
                    AttributeOp::Set(name, value) => {
                        format!("el.setAttribute('{name}', {});", markup::js_string(value))
                    }
                    AttributeOp::Remove(name) => format!("el.removeAttribute('{name}');"),
                })
                .collect::<Vec<_>>()
                .join("\n    "),
            ElementEdit::Delete { .. } => "el.remove();".to_string(),
        };
        markup::with_element_script(self.element_id(), &statements)
    }

    /// Apply an update to a snapshot, mirroring what [`ElementEdit::to_script`]
    /// does in the document.
    #[cfg(test)]
    fn apply(&self, snapshot: &mut ElementSnapshot) {
        if let ElementEdit::Update { ops, .. } = self {
            for op in ops {
                match op {
                    AttributeOp::Set(name, value) => {
                        snapshot.attributes.insert((*name).to_string(), value.clone());
                    }
                    AttributeOp::Remove(name) => {
                        snapshot.attributes.remove(*name);
                    }
                }
            }
        }
    }
}

/// Result of a terminal editor action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    NotFound,
    /// The editor was not open
    Ignored,
}

/// An open editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub element_id: String,
    pub original: MediaAttributes,
    pub attributes: MediaAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Closed,
    Open(EditSession),
}

/// The attribute editor state machine
#[derive(Debug, Default)]
pub struct AttributeEditor {
    state: EditorState,
}

impl AttributeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, EditorState::Open(_))
    }

    /// Open on the requested element. Returns `false` (staying closed) when
    /// the element cannot be found.
    pub fn open(&mut self, host: &dyn EditorHost, request: ElementRequest) -> bool {
        if let EditorState::Open(session) = &self.state {
            debug!(element_id = %session.element_id, "Discarding open edit session");
        }
        self.state = EditorState::Closed;

        let Some(snapshot) = host.query_element(request.element_id()) else {
            warn!(element_id = %request.element_id(), "Unable to find media element in document");
            return false;
        };

        let attributes = MediaAttributes::from_snapshot(&snapshot);
        debug!(element_id = %request.element_id(), attributes = ?attributes, "Opened attribute editor");
        self.state = EditorState::Open(EditSession {
            element_id: request.element_id().to_string(),
            original: attributes.clone(),
            attributes,
        });
        true
    }

    /// Attributes being edited, if open.
    pub fn attributes(&self) -> Option<&MediaAttributes> {
        match &self.state {
            EditorState::Open(session) => Some(&session.attributes),
            EditorState::Closed => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut MediaAttributes> {
        match &mut self.state {
            EditorState::Open(session) => Some(&mut session.attributes),
            EditorState::Closed => None,
        }
    }

    /// Write the edited attributes back to the element and close.
    pub fn accept(&mut self, host: &dyn EditorHost) -> EditOutcome {
        let EditorState::Open(session) = std::mem::take(&mut self.state) else {
            return EditOutcome::Ignored;
        };
        let edit = ElementEdit::update(&session.element_id, &session.attributes);
        run_edit(host, &edit)
    }

    /// Remove the element from the document and close.
    pub fn delete(&mut self, host: &dyn EditorHost) -> EditOutcome {
        let EditorState::Open(session) = std::mem::take(&mut self.state) else {
            return EditOutcome::Ignored;
        };
        let edit = ElementEdit::Delete {
            element_id: session.element_id,
        };
        run_edit(host, &edit)
    }

    /// Discard the edits and close.
    pub fn reject(&mut self) -> EditOutcome {
        match std::mem::take(&mut self.state) {
            EditorState::Open(session) => {
                debug!(element_id = %session.element_id, "Attribute edits discarded");
                EditOutcome::Applied
            }
            EditorState::Closed => EditOutcome::Ignored,
        }
    }
}

fn run_edit(host: &dyn EditorHost, edit: &ElementEdit) -> EditOutcome {
    match host.evaluate_script(&edit.to_script()) {
        Ok(serde_json::Value::Bool(true)) => {
            info!(element_id = %edit.element_id(), edit = ?edit, "Media element updated");
            EditOutcome::Applied
        }
        Ok(_) => {
            warn!(element_id = %edit.element_id(), "Unable to find media element in document");
            EditOutcome::NotFound
        }
        Err(e) => {
            warn!(element_id = %edit.element_id(), error = %e, "Failed to update media element");
            EditOutcome::NotFound
        }
    }
}
