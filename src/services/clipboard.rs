//! Clipboard source resolution
//!
//! Turns what the user copied into an ordered list of [`MediaSource`]s.
//! File URIs win over text; text is read line by line.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Absolute http(s)/ftp(s) URL with a domain, `localhost` or IPv4 host,
/// optional port and optional path/query.
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:http|ftp)s?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("valid url regex")
});

/// One candidate media input. After fetching, `path` is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
}

impl MediaSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            url: None,
            path: Some(path.into()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            path: None,
        }
    }

    /// What the user supplied: the URL for remote sources, else the path.
    pub fn origin(&self) -> String {
        match (&self.url, &self.path) {
            (Some(url), _) => url.clone(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => String::new(),
        }
    }
}

/// What the host read from the system clipboard.
#[derive(Debug, Clone, Default)]
pub struct ClipboardContents {
    /// URIs from the clipboard's URL list (`file://...`, `https://...`)
    pub uris: Vec<String>,
    /// Plain text, if any
    pub text: Option<String>,
}

/// Check whether a line is a well-formed absolute media URL.
pub fn is_media_url(line: &str) -> bool {
    URL_RE.is_match(line)
}

/// Resolve clipboard contents into media sources, preserving order.
///
/// An empty result means there is nothing to insert.
pub fn resolve_sources(clipboard: &ClipboardContents) -> Vec<MediaSource> {
    let mut sources: Vec<MediaSource> = clipboard
        .uris
        .iter()
        .filter_map(|uri| source_from_uri(uri))
        .collect();

    if sources.is_empty() {
        if let Some(text) = &clipboard.text {
            sources = text.split('\n').filter_map(source_from_line).collect();
        }
    }

    debug!(count = sources.len(), "Resolved clipboard sources");
    sources
}

fn source_from_uri(uri: &str) -> Option<MediaSource> {
    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => match url.to_file_path() {
            Ok(path) => Some(MediaSource::from_path(path)),
            Err(()) => {
                debug!(uri = %uri, "Ignoring file URI without a local path");
                None
            }
        },
        Ok(url) => Some(MediaSource::from_url(url.to_string())),
        Err(e) => {
            debug!(uri = %uri, error = %e, "Ignoring unparseable clipboard URI");
            None
        }
    }
}

fn source_from_line(line: &str) -> Option<MediaSource> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if is_media_url(line) {
        Some(MediaSource::from_url(line))
    } else if Path::new(line).exists() {
        Some(MediaSource::from_path(line))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_classification() {
        assert!(is_media_url("https://example.com/clip.mp3"));
        assert!(is_media_url("HTTP://EXAMPLE.COM"));
        assert!(is_media_url("ftp://files.example.org:2121/a/b.wav"));
        assert!(is_media_url("http://localhost:8080/x.ogg?dl=1"));
        assert!(is_media_url("http://192.168.1.10/x.mp4"));
        assert!(!is_media_url("file:///tmp/x.mp3"));
        assert!(!is_media_url("example.com/clip.mp3"));
        assert!(!is_media_url("https://example.com/has space.mp3"));
        assert!(!is_media_url("gopher://example.com/x"));
    }

    #[test]
    fn test_file_uris_take_priority() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.wav");
        std::fs::write(&file, b"x").unwrap();

        let clipboard = ClipboardContents {
            uris: vec![Url::from_file_path(&file).unwrap().to_string()],
            text: Some("https://example.com/ignored.mp3".to_string()),
        };
        let sources = resolve_sources(&clipboard);
        assert_eq!(sources, vec![MediaSource::from_path(file)]);
    }

    #[test]
    fn test_remote_uris_become_url_sources() {
        let clipboard = ClipboardContents {
            uris: vec!["https://example.com/a.mp3".to_string()],
            text: None,
        };
        assert_eq!(
            resolve_sources(&clipboard),
            vec![MediaSource::from_url("https://example.com/a.mp3")]
        );
    }

    #[test]
    fn test_text_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("b.mp4");
        std::fs::write(&file, b"x").unwrap();

        let text = format!(
            "https://example.com/a.mp3\r\nnot a thing\n\n{}\nhttp://localhost/c.ogg",
            file.display()
        );
        let clipboard = ClipboardContents {
            uris: vec![],
            text: Some(text),
        };
        assert_eq!(
            resolve_sources(&clipboard),
            vec![
                MediaSource::from_url("https://example.com/a.mp3"),
                MediaSource::from_path(file.display().to_string()),
                MediaSource::from_url("http://localhost/c.ogg"),
            ]
        );
    }

    #[test]
    fn test_nothing_qualifies() {
        let clipboard = ClipboardContents {
            uris: vec![],
            text: Some("hello\nworld".to_string()),
        };
        assert!(resolve_sources(&clipboard).is_empty());
        assert!(resolve_sources(&ClipboardContents::default()).is_empty());
    }

    #[test]
    fn test_origin_prefers_url() {
        let mut source = MediaSource::from_url("https://example.com/a.mp3");
        source.path = Some(PathBuf::from("/tmp/a.mp3"));
        assert_eq!(source.origin(), "https://example.com/a.mp3");
        assert_eq!(MediaSource::from_path("/x/y.wav").origin(), "/x/y.wav");
    }
}
