//! Remote source download into a batch's scratch directory

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::error::MediaError;

/// Name used when a URL has no usable last path segment.
const FALLBACK_FILENAME: &str = "download";

/// Downloads remote media sources
#[derive(Clone)]
pub struct Fetcher {
    http_client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, MediaError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(MediaError::HttpClient)?;
        Ok(Self { http_client })
    }

    /// Download `url` into `dir`, named after the URL's last path segment.
    pub async fn fetch(&self, url: &str, dir: &Path) -> Result<PathBuf, MediaError> {
        let dest = dir.join(filename_from_url(url));
        info!(url = %url, dest = %dest.display(), "Fetching remote media");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|source| MediaError::Fetch {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(MediaError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let bytes = response.bytes().await.map_err(|source| MediaError::Fetch {
            url: url.to_string(),
            source,
        })?;

        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| MediaError::io("Failed to write fetched media", &dest, e))?;

        debug!(url = %url, size = bytes.len(), "Fetched remote media");
        Ok(dest)
    }
}

/// Percent-decoded last path segment of `url`, made safe as a file name.
pub fn filename_from_url(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => url.rsplit('/').next().unwrap_or_default().to_string(),
    };

    let decoded = urlencoding::decode(&segment)
        .map(|s| s.into_owned())
        .unwrap_or(segment);
    let name = sanitize_filename::sanitize(decoded);

    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("https://example.com/media/clip.mp3"), "clip.mp3");
        assert_eq!(filename_from_url("https://example.com/My%20Song.ogg?x=1"), "My Song.ogg");
        assert_eq!(filename_from_url("https://example.com/a%2Fb.wav"), "ab.wav");
        assert_eq!(filename_from_url("https://example.com/"), FALLBACK_FILENAME);
        assert_eq!(filename_from_url("https://example.com"), FALLBACK_FILENAME);
    }

    #[tokio::test]
    async fn test_unreachable_url_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Fetcher::new()
            .unwrap()
            .fetch("http://127.0.0.1:1/clip.mp3", dir.path())
            .await;
        assert_matches!(result, Err(MediaError::Fetch { .. }));
        assert!(!dir.path().join("clip.mp3").exists());
    }
}
