//! Insertion of converted media into the editor
//!
//! The caret position is pinned with a marker node before the conversion
//! starts. When the batch comes back, the elements are spliced in front of the
//! marker and the marker is removed. Several batches may be in flight at
//! once, each with its own marker.

use tracing::{debug, warn};

use crate::host::EditorHost;
use crate::media::markup;
use crate::media::naming;
use crate::services::converter::ConversionBatch;

/// Placeholder node recording where converted media should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionMarker {
    id: String,
}

impl InsertionMarker {
    /// Insert a marker at the end of the current selection.
    pub fn create(host: &dyn EditorHost) -> Self {
        let marker = Self {
            id: naming::marker_id(),
        };
        match host.evaluate_script(&markup::create_marker_script(&marker.id)) {
            Ok(serde_json::Value::Bool(true)) => debug!(marker = %marker.id, "Placed insertion marker"),
            Ok(_) => debug!(marker = %marker.id, "No focused editing surface for insertion marker"),
            Err(e) => warn!(marker = %marker.id, error = %e, "Failed to place insertion marker"),
        }
        marker
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Put a finished batch into the document and report failures.
///
/// Only this batch's marker is touched. When the marker is gone (the note was
/// closed or switched) the stored files are reported instead of inserted.
pub fn finish_insertion(host: &dyn EditorHost, marker: &InsertionMarker, batch: &ConversionBatch) {
    let mut spliced = false;
    if !batch.wins.is_empty() {
        let html = markup::insertion_html(&batch.fragments());
        match host.evaluate_script(&markup::splice_at_marker_script(marker.id(), &html)) {
            Ok(serde_json::Value::Bool(true)) => {
                debug!(marker = %marker.id(), count = batch.wins.len(), "Inserted inline media");
                spliced = true;
            }
            Ok(_) => warn!(marker = %marker.id(), "Insertion marker is gone; media not inserted"),
            Err(e) => warn!(marker = %marker.id(), error = %e, "Failed to insert inline media"),
        }

        if !spliced {
            let stored: Vec<&str> = batch.wins.iter().map(|m| m.stored_name.as_str()).collect();
            host.show_notification(&format!(
                "Could not insert {} into the note. The files were added to the media collection.",
                stored.join(", ")
            ));
        }
    }

    if !spliced {
        if let Err(e) = host.evaluate_script(&markup::remove_marker_script(marker.id())) {
            warn!(marker = %marker.id(), error = %e, "Failed to remove insertion marker");
        }
    }

    if !batch.fails.is_empty() {
        host.show_notification(&format!("Failed to insert {}.", batch.fails.join(", ")));
    }
}
