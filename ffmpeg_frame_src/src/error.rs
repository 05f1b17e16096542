use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure causes for ffmpeg/ffprobe operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FfmpegError {
    /// The ffmpeg/ffprobe executable was not found on the command line.
    #[error("ffmpeg/ffprobe not found. Make sure both are installed and visible on the command line")]
    FfmpegNotFound,

    /// Io error while executing an ffmpeg/ffprobe command.
    #[error("ffmpeg IO error: {0}")]
    Io(String),

    /// Nonzero exit code. The string holds the first few hundred characters
    /// of stderr (ffmpeg error messages can run very long).
    #[error("internal ffmpeg failure: {0}")]
    FfmpegInternal(String),

    /// Output from ffprobe was not valid utf8.
    #[error("utf8 parsing/conversion failure")]
    Utf8Conversion,

    /// ffprobe reported a zero X or Y dimension for the video stream. This
    /// sometimes happens when probing an audio-only file.
    #[error("video stream has an invalid resolution")]
    InvalidResolution,

    /// ffprobe output was missing an expected field or failed to parse.
    #[error("failed to parse video properties: {0}")]
    Probe(String),
}
