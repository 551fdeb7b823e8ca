//! Context menu entries and element requests
//!
//! Right-clicking an inline media element makes its `oncontextmenu` handler
//! send the element id to the host. That message becomes an
//! [`ElementRequest`] which the host passes straight into
//! [`build_context_menu`] for the menu being opened; nothing is stored in
//! between, so overlapping menus cannot pick up each other's element.

use crate::config::MediaConfig;
use crate::media::naming::{MediaIdentifier, MediaKind};
use crate::services::clipboard::MediaSource;

/// "Edit this element", produced from a context menu message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRequest {
    element_id: MediaIdentifier,
}

impl ElementRequest {
    pub fn new(element_id: MediaIdentifier) -> Self {
        Self { element_id }
    }

    pub fn element_id(&self) -> &str {
        self.element_id.as_str()
    }
}

/// Interpret a message from the editor document. Only a bare media
/// identifier is ours; anything else is left for other handlers.
pub fn parse_element_message(message: &str) -> Option<ElementRequest> {
    MediaIdentifier::parse(message).map(ElementRequest::new)
}

/// What a menu entry does when triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Insert(MediaKind),
    Edit(ElementRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    /// Shortcut hint shown next to the label
    pub shortcut: Option<String>,
    pub action: MenuAction,
}

/// Entries to append to the editor's context menu. Empty when there is
/// nothing to insert and no element was clicked.
pub fn build_context_menu(
    sources: &[MediaSource],
    request: Option<ElementRequest>,
    config: &MediaConfig,
) -> Vec<MenuEntry> {
    let mut entries = Vec::new();

    if !sources.is_empty() {
        for (label, kind) in [
            ("Insert clipboard as audio", MediaKind::Audio),
            ("Insert clipboard as video", MediaKind::Video),
        ] {
            entries.push(MenuEntry {
                label,
                shortcut: config.shortcut(kind).map(str::to_string),
                action: MenuAction::Insert(kind),
            });
        }
    }

    if let Some(request) = request {
        entries.push(MenuEntry {
            label: "Edit media element",
            shortcut: None,
            action: MenuAction::Edit(request),
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_element_message() {
        let id = MediaIdentifier::generate();
        let request = parse_element_message(id.as_str()).unwrap();
        assert_eq!(request.element_id(), id.as_str());

        assert!(parse_element_message("edit").is_none());
        assert!(parse_element_message(&format!("key:{id}")).is_none());
    }

    #[test]
    fn test_menu_without_anything() {
        assert!(build_context_menu(&[], None, &MediaConfig::default()).is_empty());
    }

    #[test]
    fn test_menu_with_sources_and_request() {
        let config = MediaConfig {
            audio_shortcut: Some("Ctrl+Shift+A".to_string()),
            ..MediaConfig::default()
        };
        let request = ElementRequest::new(MediaIdentifier::generate());
        let entries = build_context_menu(
            &[MediaSource::from_path("/tmp/a.wav")],
            Some(request.clone()),
            &config,
        );

        let labels: Vec<&str> = entries.iter().map(|e| e.label).collect();
        assert_eq!(
            labels,
            vec!["Insert clipboard as audio", "Insert clipboard as video", "Edit media element"]
        );
        assert_eq!(entries[0].shortcut.as_deref(), Some("Ctrl+Shift+A"));
        assert_eq!(entries[1].shortcut, None);
        assert_eq!(entries[2].action, MenuAction::Edit(request));
    }

    #[test]
    fn test_menu_with_request_only() {
        let request = ElementRequest::new(MediaIdentifier::generate());
        let entries = build_context_menu(&[], Some(request), &MediaConfig::default());
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].action, MenuAction::Edit(_)));
    }
}
