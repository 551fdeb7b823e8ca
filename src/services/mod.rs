//! Ingestion, editing and reconciliation services

pub mod attribute_editor;
pub mod clipboard;
pub mod context_menu;
pub mod converter;
pub mod fetch;
pub mod insertion;
pub mod reconcile;

pub use attribute_editor::{AttributeEditor, EditOutcome, ElementEdit, MediaAttributes};
pub use clipboard::{ClipboardContents, MediaSource, resolve_sources};
pub use context_menu::{ElementRequest, MenuAction, MenuEntry, build_context_menu, parse_element_message};
pub use converter::{ConversionBatch, ConversionEngine, ConvertedMedia};
pub use fetch::Fetcher;
pub use insertion::{InsertionMarker, finish_insertion};
pub use reconcile::{OrphanReport, TrashOutcome};
