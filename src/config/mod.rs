//! Configuration management
//!
//! [`MediaConfig`] is the add-on configuration persisted by the host as a JSON
//! object with human readable keys. [`AppConfig`] holds the process settings
//! used by the command-line front end, loaded from environment variables.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::media::naming::MediaKind;

pub const DEFAULT_AUDIO_EXT: &str = "ogg";
pub const DEFAULT_VIDEO_EXT: &str = "webm";

/// Sentinel for "no dimension configured".
pub const UNSET_DIMENSION: i32 = -1;

/// Format and default attribute configuration for inserted media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Target container/extension for audio conversions
    #[serde(rename = "Audio format", default = "default_audio_ext")]
    pub audio_ext: String,

    /// Target container/extension for video conversions
    #[serde(rename = "Video format", default = "default_video_ext")]
    pub video_ext: String,

    /// Default video height in pixels (-1 = unset)
    #[serde(rename = "Height", default = "unset_dimension")]
    pub video_height: i32,

    /// Default video width in pixels (-1 = unset)
    #[serde(rename = "Width", default = "unset_dimension")]
    pub video_width: i32,

    #[serde(rename = "Autoplay (front)", default)]
    pub auto_front: bool,

    #[serde(rename = "Autoplay (back)", default)]
    pub auto_back: bool,

    #[serde(rename = "Loop", default)]
    pub loop_playback: bool,

    #[serde(rename = "Mute", default)]
    pub mute: bool,

    /// The host stores `0` when no shortcut is bound
    #[serde(rename = "Audio shortcut", default, deserialize_with = "shortcut")]
    pub audio_shortcut: Option<String>,

    #[serde(rename = "Video shortcut", default, deserialize_with = "shortcut")]
    pub video_shortcut: Option<String>,
}

fn default_audio_ext() -> String {
    DEFAULT_AUDIO_EXT.to_string()
}

fn default_video_ext() -> String {
    DEFAULT_VIDEO_EXT.to_string()
}

fn unset_dimension() -> i32 {
    UNSET_DIMENSION
}

fn shortcut<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            audio_ext: default_audio_ext(),
            video_ext: default_video_ext(),
            video_height: UNSET_DIMENSION,
            video_width: UNSET_DIMENSION,
            auto_front: false,
            auto_back: false,
            loop_playback: false,
            mute: false,
            audio_shortcut: None,
            video_shortcut: None,
        }
    }
}

impl MediaConfig {
    /// Build from the host's stored JSON object and normalize it.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: MediaConfig =
            serde_json::from_value(value).context("Invalid inline media configuration")?;
        Ok(config.normalized())
    }

    /// Load from a JSON file on disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Self::from_value(value)
    }

    /// Apply the fallbacks the host relies on: empty formats get the defaults,
    /// extensions are lowercase without a leading dot, and a zero or negative
    /// dimension means unset.
    pub fn normalized(mut self) -> Self {
        self.audio_ext = normalize_ext(&self.audio_ext, DEFAULT_AUDIO_EXT);
        self.video_ext = normalize_ext(&self.video_ext, DEFAULT_VIDEO_EXT);
        if self.video_height <= 0 {
            self.video_height = UNSET_DIMENSION;
        }
        if self.video_width <= 0 {
            self.video_width = UNSET_DIMENSION;
        }
        self
    }

    /// Extension conversions of `kind` are written with.
    pub fn target_extension(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Audio => &self.audio_ext,
            MediaKind::Video => &self.video_ext,
        }
    }

    pub fn height(&self) -> Option<u32> {
        u32::try_from(self.video_height).ok()
    }

    pub fn width(&self) -> Option<u32> {
        u32::try_from(self.video_width).ok()
    }

    pub fn shortcut(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Audio => self.audio_shortcut.as_deref(),
            MediaKind::Video => self.video_shortcut.as_deref(),
        }
    }

    /// Literal boolean attributes every new element starts with,
    /// e.g. ` auto_front="true" loop="true"`.
    pub fn default_attributes(&self) -> String {
        let mut attribs = String::new();
        for (enabled, name) in [
            (self.auto_front, "auto_front"),
            (self.auto_back, "auto_back"),
            (self.loop_playback, "loop"),
            (self.mute, "mute"),
        ] {
            if enabled {
                attribs.push_str(&format!(r#" {name}="true""#));
            }
        }
        attribs
    }
}

fn normalize_ext(ext: &str, fallback: &str) -> String {
    let ext = ext.trim().trim_start_matches('.').to_lowercase();
    if ext.is_empty() {
        fallback.to_string()
    } else {
        ext
    }
}

/// Process configuration for the command-line front end
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Collection directory (contains `collection.media/` and `notes.json`)
    pub collection_path: PathBuf,

    /// Optional JSON file holding a [`MediaConfig`]
    pub media_config_path: Option<PathBuf>,

    /// Explicit transcoder executable, bypassing discovery
    pub ffmpeg_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            collection_path: env::var("INLINE_MEDIA_COLLECTION")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./collection")),

            media_config_path: env::var("INLINE_MEDIA_CONFIG").ok().map(PathBuf::from),

            ffmpeg_path: env::var("INLINE_MEDIA_FFMPEG").ok().map(PathBuf::from),
        })
    }

    /// The media configuration named by [`AppConfig::media_config_path`], or defaults.
    pub fn media_config(&self) -> Result<MediaConfig> {
        match &self.media_config_path {
            Some(path) => MediaConfig::from_file(path),
            None => Ok(MediaConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = MediaConfig::from_value(json!({})).unwrap();
        assert_eq!(config, MediaConfig::default());
        assert_eq!(config.audio_ext, "ogg");
        assert_eq!(config.video_ext, "webm");
        assert_eq!(config.height(), None);
        assert_eq!(config.width(), None);
        assert_eq!(config.default_attributes(), "");
    }

    #[test]
    fn test_host_values_are_normalized() {
        let config = MediaConfig::from_value(json!({
            "Audio format": ".MP3",
            "Video format": "",
            "Height": 240,
            "Width": 0,
            "Autoplay (front)": true,
            "Loop": true,
            "Audio shortcut": "Ctrl+Shift+A",
            "Video shortcut": 0
        }))
        .unwrap();

        assert_eq!(config.audio_ext, "mp3");
        assert_eq!(config.video_ext, "webm");
        assert_eq!(config.height(), Some(240));
        assert_eq!(config.width(), None);
        assert_eq!(config.shortcut(MediaKind::Audio), Some("Ctrl+Shift+A"));
        assert_eq!(config.shortcut(MediaKind::Video), None);
        assert_eq!(config.default_attributes(), r#" auto_front="true" loop="true""#);
    }

    #[test]
    fn test_target_extension() {
        let config = MediaConfig::default();
        assert_eq!(config.target_extension(MediaKind::Audio), "ogg");
        assert_eq!(config.target_extension(MediaKind::Video), "webm");
    }

    #[test]
    fn test_invalid_types_are_rejected() {
        assert!(MediaConfig::from_value(json!({"Height": "tall"})).is_err());
    }
}
