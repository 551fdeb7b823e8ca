//! FFmpeg-based transcoding
//!
//! The transcoder is an opaque external tool invoked once per source as
//! `ffmpeg -i <input> [-vn] <output>`. Its exit status is not trusted; the
//! conversion engine checks for the output file instead.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::media::naming::MediaKind;

/// Converts one input file into `output`, choosing streams by `kind`.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Run the conversion to completion. An `Ok` return says nothing about
    /// whether `output` was written.
    async fn transcode(&self, input: &Path, output: &Path, kind: MediaKind) -> Result<()>;
}

/// Transcoder backed by the `ffmpeg` command line tool
pub struct FfmpegTranscoder {
    /// Path to the ffmpeg executable
    ffmpeg_path: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Locate ffmpeg: explicit override first, then `PATH`, then a bundled
    /// `ffmpeg/` directory next to the running executable.
    pub fn locate(explicit: Option<&Path>) -> Option<Self> {
        if let Some(path) = explicit {
            return path.is_file().then(|| Self::new(path.to_path_buf()));
        }

        let name = executable_name();
        let on_path = env::var_os("PATH").and_then(|paths| {
            env::split_paths(&paths)
                .map(|dir| dir.join(&name))
                .find(|candidate| candidate.is_file())
        });
        if let Some(path) = on_path {
            debug!(path = %path.display(), "Found ffmpeg on PATH");
            return Some(Self::new(path));
        }

        let bundled = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("ffmpeg").join(&name)))
            .filter(|candidate| candidate.is_file());
        if let Some(path) = &bundled {
            debug!(path = %path.display(), "Using bundled ffmpeg");
        }
        bundled.map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Arguments for one conversion. Audio drops any video stream.
    pub fn build_args(input: &Path, output: &Path, kind: MediaKind) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-i".into(), input.into()];
        if kind == MediaKind::Audio {
            args.push("-vn".into());
        }
        args.push(output.into());
        args
    }
}

fn executable_name() -> String {
    if cfg!(windows) {
        "ffmpeg.exe".to_string()
    } else {
        "ffmpeg".to_string()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, kind: MediaKind) -> Result<()> {
        info!(
            input = %input.display(),
            output = %output.display(),
            kind = %kind,
            "Transcoding media"
        );

        let result = Command::new(&self.ffmpeg_path)
            .args(Self::build_args(input, output, kind))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to execute ffmpeg for '{}'", input.display()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            debug!(
                input = %input.display(),
                exit_code = ?result.status.code(),
                stderr = %stderr.trim(),
                "ffmpeg exited with failure status"
            );
        }

        Ok(())
    }
}

/// Stands in when no transcoder could be located at load time. Every
/// conversion that needs it then fails for lack of output.
pub struct UnavailableTranscoder;

#[async_trait]
impl Transcoder for UnavailableTranscoder {
    async fn transcode(&self, input: &Path, _output: &Path, _kind: MediaKind) -> Result<()> {
        anyhow::bail!("no transcoder available to convert '{}'", input.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_args_drop_video() {
        let args = FfmpegTranscoder::build_args(
            Path::new("/in/clip.mp4"),
            Path::new("/out/_im-media-x.ogg"),
            MediaKind::Audio,
        );
        assert_eq!(args, vec![
            OsString::from("-i"),
            OsString::from("/in/clip.mp4"),
            OsString::from("-vn"),
            OsString::from("/out/_im-media-x.ogg"),
        ]);
    }

    #[test]
    fn test_video_args() {
        let args = FfmpegTranscoder::build_args(
            Path::new("foo.mp4"),
            Path::new("_im-media-x.webm"),
            MediaKind::Video,
        );
        assert_eq!(args, vec![
            OsString::from("-i"),
            OsString::from("foo.mp4"),
            OsString::from("_im-media-x.webm"),
        ]);
    }

    #[test]
    fn test_locate_rejects_missing_override() {
        assert!(FfmpegTranscoder::locate(Some(Path::new("/definitely/not/ffmpeg"))).is_none());
    }

    #[tokio::test]
    async fn test_missing_executable_is_an_error() {
        let transcoder = FfmpegTranscoder::new(PathBuf::from("/definitely/not/ffmpeg"));
        let dir = tempfile::tempdir().unwrap();
        let result = transcoder
            .transcode(&dir.path().join("in.wav"), &dir.path().join("out.ogg"), MediaKind::Audio)
            .await;
        assert!(result.is_err());
        assert!(!dir.path().join("out.ogg").exists());
    }
}
