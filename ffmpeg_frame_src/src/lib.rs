#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![allow(clippy::doc_markdown)]

//! Frame extraction for the scene-duplicate finder, implemented by shelling
//! out to the `ffmpeg` and `ffprobe` command line tools.
//!
//! No bindings are linked: ffmpeg is spawned with `-c:v rawvideo -f
//! image2pipe` and fixed-size RGB frames are read back from its stdout.
//! Both tools must be visible on `PATH`.

mod error;
mod frame_iter;
mod probe;

pub use error::FfmpegError;
pub use frame_iter::{FfmpegFrameIterRgb, FrameReaderBuilder};
pub use probe::VideoInfo;

use std::ffi::OsStr;

/// Check that both `ffmpeg` and `ffprobe` can be executed. Call this once at
/// startup so a missing installation fails fast instead of per-file.
pub fn ffmpeg_and_ffprobe_are_callable() -> bool {
    frame_iter::run_command(frame_iter::CommandName::Ffprobe, &[OsStr::new("-version")]).is_ok()
        && frame_iter::run_command(frame_iter::CommandName::Ffmpeg, &[OsStr::new("-version")])
            .is_ok()
}
