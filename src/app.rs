//! The extension object the host wires its hooks to.
//!
//! Owns the UI-side state (dispatcher, attribute editor) and the shared
//! collaborators handed to background tasks.

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::MediaError;
use crate::host::{EditorHost, MediaStore, NoteStore};
use crate::jobs::{self, ConvertTask, UiDispatcher};
use crate::media::naming::MediaKind;
use crate::media::transcoder::{Transcoder, UnavailableTranscoder};
use crate::services::attribute_editor::{AttributeEditor, EditOutcome};
use crate::services::clipboard::{self, ClipboardContents, MediaSource};
use crate::services::context_menu::{self, ElementRequest, MenuAction, MenuEntry};
use crate::services::converter::{ConversionBatch, ConversionEngine};
use crate::services::insertion::{self, InsertionMarker};

pub const MISSING_TRANSCODER_WARNING: &str = "Inline media depends on ffmpeg (https://ffmpeg.org/) for media conversion and was unable to find it. Please install ffmpeg and make sure it is on the system path.";

/// Collaborators supplied by the host at load time.
pub struct HostServices {
    pub media: Arc<dyn MediaStore>,
    pub notes: Arc<dyn NoteStore>,
    /// `None` when no transcoder was found
    pub transcoder: Option<Arc<dyn Transcoder>>,
    pub runtime: Handle,
}

/// Inline media extension for one editor host
pub struct InlineMedia<H: EditorHost + 'static> {
    host: Rc<H>,
    config: Arc<MediaConfig>,
    engine: Arc<ConversionEngine>,
    notes: Arc<dyn NoteStore>,
    media_root: PathBuf,
    dispatcher: UiDispatcher,
    editor: AttributeEditor,
}

impl<H: EditorHost + 'static> InlineMedia<H> {
    /// Set up the extension. A missing transcoder is reported once, here.
    pub fn load(host: Rc<H>, config: MediaConfig, services: HostServices) -> Result<Self, MediaError> {
        let transcoder = match services.transcoder {
            Some(transcoder) => transcoder,
            None => {
                warn!("No transcoder found; conversions will fail");
                host.show_notification(MISSING_TRANSCODER_WARNING);
                Arc::new(UnavailableTranscoder)
            }
        };

        let media_root = services.media.media_root();
        info!(
            media_root = %media_root.display(),
            audio_ext = %config.audio_ext,
            video_ext = %config.video_ext,
            "Inline media loaded"
        );

        let engine = ConversionEngine::new(transcoder, services.media)?;
        Ok(Self {
            host,
            config: Arc::new(config),
            engine: Arc::new(engine),
            notes: services.notes,
            media_root,
            dispatcher: UiDispatcher::new(services.runtime),
            editor: AttributeEditor::new(),
        })
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn dispatcher(&mut self) -> &mut UiDispatcher {
        &mut self.dispatcher
    }

    pub fn editor(&self) -> &AttributeEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut AttributeEditor {
        &mut self.editor
    }

    /// Run finalize callbacks of finished background tasks. Call from the
    /// host's UI loop.
    pub fn pump(&mut self) -> usize {
        self.dispatcher.pump()
    }

    /// Message hook: a bare media id means that element was right-clicked.
    pub fn on_js_message(&self, message: &str) -> Option<ElementRequest> {
        context_menu::parse_element_message(message)
    }

    /// Entries for the context menu being built.
    pub fn context_menu(&self, clipboard: &ClipboardContents, request: Option<ElementRequest>) -> Vec<MenuEntry> {
        let sources = clipboard::resolve_sources(clipboard);
        context_menu::build_context_menu(&sources, request, &self.config)
    }

    /// Carry out a triggered menu entry.
    pub fn run_menu_action(&mut self, action: MenuAction, clipboard: &ClipboardContents) {
        match action {
            MenuAction::Insert(kind) => {
                self.insert_clipboard(kind, clipboard);
            }
            MenuAction::Edit(request) => {
                self.edit_element(request);
            }
        }
    }

    /// Shortcut path: resolve the clipboard and insert as `kind`.
    pub fn insert_clipboard(&mut self, kind: MediaKind, clipboard: &ClipboardContents) -> Option<Uuid> {
        self.insert(kind, clipboard::resolve_sources(clipboard))
    }

    /// Convert `sources` in the background and insert the result at the
    /// current caret position. Returns `None` when there is nothing to insert.
    pub fn insert(&mut self, kind: MediaKind, sources: Vec<MediaSource>) -> Option<Uuid> {
        if sources.is_empty() {
            debug!(kind = %kind, "Nothing to insert");
            return None;
        }

        let marker = InsertionMarker::create(&*self.host);
        let host = self.host.clone();
        Some(self.convert(kind, sources, move |batch| {
            insertion::finish_insertion(&*host, &marker, &batch);
        }))
    }

    /// Convert `sources` in the background and hand the batch to `on_done`
    /// on the UI thread, without touching the document.
    pub fn convert<F>(&mut self, kind: MediaKind, sources: Vec<MediaSource>, on_done: F) -> Uuid
    where
        F: FnOnce(ConversionBatch) + 'static,
    {
        // Reported as failed in full if the task dies before returning a batch.
        let origins: Vec<String> = sources.iter().map(MediaSource::origin).collect();
        let task = ConvertTask {
            engine: self.engine.clone(),
            kind,
            sources,
            config: self.config.clone(),
        };
        self.dispatcher.submit(task, move |batch, _| {
            let batch = batch.unwrap_or_else(|e| {
                warn!(error = %e, sources = origins.len(), "Conversion batch lost");
                ConversionBatch {
                    wins: Vec::new(),
                    fails: origins,
                }
            });
            on_done(batch)
        })
    }

    /// Open the attribute editor on the requested element.
    pub fn edit_element(&mut self, request: ElementRequest) -> bool {
        self.editor.open(&*self.host, request)
    }

    pub fn accept_edit(&mut self) -> EditOutcome {
        self.editor.accept(&*self.host)
    }

    pub fn delete_element(&mut self) -> EditOutcome {
        self.editor.delete(&*self.host)
    }

    pub fn reject_edit(&mut self) -> EditOutcome {
        self.editor.reject()
    }

    /// Start the orphan check (scan, confirm, trash).
    pub fn check_media(&mut self) {
        jobs::check_media(
            &mut self.dispatcher,
            self.host.clone(),
            self.notes.clone(),
            self.media_root.clone(),
        );
    }
}
