//! Media naming, markup and transcoding

pub mod markup;
pub mod naming;
pub mod transcoder;

pub use naming::{MediaIdentifier, MediaKind};
pub use transcoder::{FfmpegTranscoder, Transcoder, UnavailableTranscoder};
