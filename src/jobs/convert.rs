//! Background conversion of a clipboard batch

use std::future::Future;
use std::sync::Arc;

use crate::config::MediaConfig;
use crate::jobs::dispatcher::BackgroundTask;
use crate::media::naming::MediaKind;
use crate::services::clipboard::MediaSource;
use crate::services::converter::{ConversionBatch, ConversionEngine};

/// Convert `sources` to `kind` with the engine's transcoder and media store.
pub struct ConvertTask {
    pub engine: Arc<ConversionEngine>,
    pub kind: MediaKind,
    pub sources: Vec<MediaSource>,
    pub config: Arc<MediaConfig>,
}

impl BackgroundTask for ConvertTask {
    type Output = ConversionBatch;
    const NAME: &'static str = "convert";

    fn execute(self) -> impl Future<Output = ConversionBatch> + Send {
        async move {
            self.engine
                .convert(self.kind, self.sources, &self.config)
                .await
        }
    }
}
