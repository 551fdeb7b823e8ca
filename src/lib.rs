//! Inline media for flashcard note editors
//!
//! Two pipelines make up the core:
//!
//! - **Ingestion**: clipboard → [`MediaSource`]s → fetch/copy/transcode →
//!   media store → `<audio>`/`<video>` elements spliced in at the caret.
//! - **Reconciliation**: note references vs. `_im-media-*` files on disk →
//!   orphans → confirmed move to the trash directory.
//!
//! Heavy work runs on background tasks; everything touching the editor runs
//! on the UI thread through [`jobs::UiDispatcher`].

pub mod app;
pub mod config;
pub mod error;
pub mod host;
pub mod jobs;
pub mod media;
pub mod services;

pub use app::{HostServices, InlineMedia};
pub use config::{AppConfig, MediaConfig};
pub use error::{HostError, MediaError, TaskFailed};
pub use host::{EditorHost, ElementSnapshot, LocalCollection, MediaStore, NoteStore};
pub use media::{MediaIdentifier, MediaKind};
pub use services::{ClipboardContents, ConversionBatch, ConversionEngine, MediaSource};
