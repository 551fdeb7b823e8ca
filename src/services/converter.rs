//! Conversion engine
//!
//! Turns an ordered batch of [`MediaSource`]s into inline media elements:
//! fetch remote sources, copy files already in the target format, transcode
//! everything else, and hand the result to the host's media store.
//!
//! Runs on a background task and never touches UI state. A failing item is
//! recorded and the batch moves on; every source yields exactly one outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::MediaConfig;
use crate::error::MediaError;
use crate::host::MediaStore;
use crate::media::markup;
use crate::media::naming::{self, MediaIdentifier, MediaKind};
use crate::media::transcoder::Transcoder;
use crate::services::clipboard::MediaSource;
use crate::services::fetch::Fetcher;

/// A successfully stored media file and the element that shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedMedia {
    pub id: MediaIdentifier,
    pub stored_name: String,
    pub html: String,
}

/// Outcome of one conversion batch.
///
/// `wins` keeps the input order of the sources that succeeded; `fails` holds
/// the original path or URL of every source that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionBatch {
    pub wins: Vec<ConvertedMedia>,
    pub fails: Vec<String>,
}

impl ConversionBatch {
    /// HTML fragments of the successful items, in input order.
    pub fn fragments(&self) -> Vec<String> {
        self.wins.iter().map(|m| m.html.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.wins.len() + self.fails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts media sources and registers them with the media store
pub struct ConversionEngine {
    transcoder: Arc<dyn Transcoder>,
    store: Arc<dyn MediaStore>,
    fetcher: Fetcher,
}

impl ConversionEngine {
    pub fn new(transcoder: Arc<dyn Transcoder>, store: Arc<dyn MediaStore>) -> Result<Self, MediaError> {
        Ok(Self {
            transcoder,
            store,
            fetcher: Fetcher::new()?,
        })
    }

    /// Convert `sources` in order.
    ///
    /// Fetched files and transcoder output live in a scratch directory that
    /// is removed when the batch finishes, whatever the outcome.
    pub async fn convert(
        &self,
        kind: MediaKind,
        sources: Vec<MediaSource>,
        config: &MediaConfig,
    ) -> ConversionBatch {
        let mut batch = ConversionBatch::default();

        let scratch = match tempfile::Builder::new().prefix("inline-media-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                error!(error = %e, "Failed to create scratch directory");
                batch.fails = sources.iter().map(MediaSource::origin).collect();
                return batch;
            }
        };

        info!(
            kind = %kind,
            sources = sources.len(),
            scratch = %scratch.path().display(),
            "Starting conversion batch"
        );

        for source in sources {
            match self.convert_one(kind, &source, config, scratch.path()).await {
                Ok(media) => {
                    debug!(id = %media.id, stored = %media.stored_name, "Media converted");
                    batch.wins.push(media);
                }
                Err(e) => {
                    warn!(source = %source.origin(), error = %e, "Media conversion failed");
                    batch.fails.push(source.origin());
                }
            }
        }

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(path = %scratch_path.display(), error = %e, "Failed to remove scratch directory");
        }

        info!(
            kind = %kind,
            wins = batch.wins.len(),
            fails = batch.fails.len(),
            "Conversion batch complete"
        );
        batch
    }

    async fn convert_one(
        &self,
        kind: MediaKind,
        source: &MediaSource,
        config: &MediaConfig,
        scratch: &Path,
    ) -> Result<ConvertedMedia, MediaError> {
        let path = match (&source.path, &source.url) {
            (Some(path), _) => path.clone(),
            (None, Some(url)) => self.fetcher.fetch(url, scratch).await?,
            (None, None) => return Err(MediaError::EmptySource),
        };

        let ext = naming::extension_of(&path);
        let id = MediaIdentifier::generate();
        let target_ext = config.target_extension(kind);

        let dest = if ext == target_ext {
            copy_verbatim(&path, &id, &ext).await?
        } else {
            let dest = scratch.join(id.filename(target_ext));
            if let Err(e) = self.transcoder.transcode(&path, &dest, kind).await {
                warn!(input = %path.display(), error = %e, "Transcoder invocation failed");
            }
            dest
        };

        if !tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            return Err(MediaError::NoOutput { input: path });
        }

        let stored_name = self.ingest(&dest).await;
        if let Err(e) = tokio::fs::remove_file(&dest).await {
            warn!(path = %dest.display(), error = %e, "Failed to remove staged media file");
        }
        let stored_name = stored_name?;

        let html = markup::media_element(kind, &id, &stored_name, config);
        Ok(ConvertedMedia {
            id,
            stored_name,
            html,
        })
    }

    /// Hand a staged file to the media store off the async workers.
    async fn ingest(&self, staged: &Path) -> Result<String, MediaError> {
        let store = self.store.clone();
        let path = staged.to_path_buf();
        tokio::task::spawn_blocking(move || {
            store.add_file(&path).map_err(|e| MediaError::Store {
                path: path.clone(),
                reason: e.to_string(),
            })
        })
        .await
        .map_err(|e| MediaError::Task(e.to_string()))?
    }
}

/// The source is already in the target format: copy it next to itself
/// under the inline media name, without re-encoding.
async fn copy_verbatim(path: &Path, id: &MediaIdentifier, ext: &str) -> Result<PathBuf, MediaError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let dest = dir.join(id.filename(ext));
    debug!(source = %path.display(), dest = %dest.display(), "Copying media without transcoding");

    if let Err(e) = tokio::fs::copy(path, &dest).await {
        let _ = tokio::fs::remove_file(&dest).await;
        return Err(MediaError::io("Failed to copy media", path, e));
    }
    Ok(dest)
}
