//! Inline media check: scan for orphans, confirm, move them to the trash
//!
//! Both the scan and the move run as background tasks. The confirmation
//! dialog in between is the only modal step in the crate and gates every
//! destructive action.

use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info};

use crate::host::{EditorHost, NoteStore};
use crate::jobs::dispatcher::{BackgroundTask, UiDispatcher};
use crate::services::reconcile::{self, OrphanReport, TrashOutcome};

pub const DIALOG_TITLE: &str = "Check Inline Media";

/// Compute the orphan set from the notes and the media directory.
pub struct ScanTask {
    pub notes: Arc<dyn NoteStore>,
    pub media_root: PathBuf,
}

impl BackgroundTask for ScanTask {
    type Output = Result<OrphanReport>;
    const NAME: &'static str = "media-check-scan";

    fn execute(self) -> impl Future<Output = Self::Output> + Send {
        async move {
            tokio::task::spawn_blocking(move || reconcile::scan(&*self.notes, &self.media_root))
                .await?
        }
    }
}

/// Move confirmed orphans into the trash directory.
pub struct TrashTask {
    pub media_root: PathBuf,
    pub orphans: Vec<String>,
}

impl BackgroundTask for TrashTask {
    type Output = Result<TrashOutcome>;
    const NAME: &'static str = "media-check-trash";

    fn execute(self) -> impl Future<Output = Self::Output> + Send {
        async move {
            tokio::task::spawn_blocking(move || reconcile::trash_orphans(&self.media_root, &self.orphans))
                .await?
        }
    }
}

/// Start a media check. The report, the dialog and the final count are
/// handled on the UI thread as each background phase completes.
pub fn check_media<H>(
    dispatcher: &mut UiDispatcher,
    host: Rc<H>,
    notes: Arc<dyn NoteStore>,
    media_root: PathBuf,
) where
    H: EditorHost + 'static,
{
    info!(media_root = %media_root.display(), "Checking inline media");

    let scan = ScanTask {
        notes,
        media_root: media_root.clone(),
    };
    dispatcher.submit(scan, move |report, dispatcher| {
        match report.map_err(anyhow::Error::from).and_then(|report| report) {
            Err(e) => {
                error!(error = %e, "Inline media check failed");
                host.show_notification(&format!("Inline media check failed: {e}"));
            }
            Ok(report) if report.is_empty() => {
                host.show_notification("No orphaned inline media files found.");
            }
            Ok(report) => {
                if !host.confirm(DIALOG_TITLE, &report.confirmation_text()) {
                    debug!(orphans = report.orphans.len(), "Orphan deletion cancelled");
                    return;
                }
                let trash = TrashTask {
                    media_root,
                    orphans: report.orphans,
                };
                dispatcher.submit(trash, move |outcome, _| {
                    match outcome.map_err(anyhow::Error::from).and_then(|outcome| outcome) {
                        Ok(outcome) => host.show_notification(&format!(
                            "Deleted {} orphaned inline media files.",
                            outcome.moved
                        )),
                        Err(e) => {
                            error!(error = %e, "Failed to move orphans to trash");
                            host.show_notification(&format!("Failed to delete orphaned inline media: {e}"));
                        }
                    }
                });
            }
        }
    });
}
