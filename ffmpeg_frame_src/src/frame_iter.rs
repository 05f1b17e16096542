use std::{
    ffi::OsStr,
    io::prelude::*,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    time::{Duration, SystemTime},
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use image::RgbImage;

use crate::{error::FfmpegError, probe::VideoInfo};

const FFPROBE_TIMEOUT_SECS: u64 = 60;

/// Builder for a raw-frame decode of a whole video.
///
/// Frames are delivered at the stream's native rate in rgb24. The iterator
/// ends early (rather than erroring) if ffmpeg stops producing data, so a
/// partially-corrupt file yields the decodable prefix.
#[derive(Clone, Debug)]
pub struct FrameReaderBuilder {
    src_path: PathBuf,
    timeout_secs: Option<u64>,
}

impl FrameReaderBuilder {
    pub fn new(src_path: impl AsRef<Path>) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            timeout_secs: None,
        }
    }

    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    /// Abandon the decode if it takes longer than this. Unset means no limit.
    pub fn timeout_secs(&mut self, timeout_secs: u64) -> &mut Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Probe the file and spawn the decoding child process.
    pub fn spawn_rgb(&self) -> Result<(FfmpegFrameIterRgb, VideoInfo), FfmpegError> {
        let info = VideoInfo::new(&self.src_path)?;

        let (x, y) = info.resolution();
        if x == 0 || y == 0 {
            return Err(FfmpegError::InvalidResolution);
        }

        #[rustfmt::skip]
        let args = vec![
            OsStr::new("-hide_banner"),
            OsStr::new("-loglevel"), OsStr::new("warning"),
            OsStr::new("-nostats"),
            OsStr::new("-threads"), OsStr::new("1"),
            OsStr::new("-i"),       OsStr::new(&self.src_path),
            OsStr::new("-pix_fmt"), OsStr::new("rgb24"),
            OsStr::new("-c:v"),     OsStr::new("rawvideo"),
            OsStr::new("-f"),       OsStr::new("image2pipe"),
            OsStr::new("-"),
        ];

        let mut child = spawn_command(CommandName::Ffmpeg, &args)?;

        // Prevent a possible lockup if stderr fills by dropping the handle
        // from our side.
        std::mem::drop(child.stderr.take());

        let iter = FfmpegFrameIterRgb {
            x,
            y,
            child,
            timeout_time: SystemTime::now()
                + Duration::from_secs(self.timeout_secs.unwrap_or(u32::MAX as u64)),
            finished: false,
        };

        Ok((iter, info))
    }
}

/// Iterator over every frame of a video, as rgb24 images.
#[derive(Debug)]
pub struct FfmpegFrameIterRgb {
    x: u32,
    y: u32,
    child: Child,
    timeout_time: SystemTime,
    finished: bool,
}

impl Iterator for FfmpegFrameIterRgb {
    type Item = RgbImage;

    fn next(&mut self) -> Option<RgbImage> {
        if self.finished || SystemTime::now() > self.timeout_time {
            self.finished = true;
            let _kill_error = self.child.kill();
            let _wait_error = self.child.wait();
            return None;
        }

        let raw_buf_size = usize::try_from(self.x)
            .ok()?
            .checked_mul(usize::try_from(self.y).ok()?)?
            .checked_mul(3)?;

        // Guard against OOM on implausible declared resolutions.
        let five_gigabytes = 5_368_709_120_usize;
        if raw_buf_size > five_gigabytes {
            return None;
        }
        let mut raw_buf = vec![0u8; raw_buf_size];

        let stdout = self.child.stdout.as_mut()?;
        let mut buf_head = 0;
        while buf_head < raw_buf.len() {
            if SystemTime::now() > self.timeout_time {
                self.finished = true;
                return None;
            }

            match stdout.read(&mut raw_buf[buf_head..]) {
                // no more data can be read, or the decode went wrong. Either
                // way the stream ends here.
                Err(_) | Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(bytes_read) => buf_head += bytes_read,
            }
        }

        RgbImage::from_raw(self.x, self.y, raw_buf)
    }
}

// Reap the child's return code (if nothing else has done so already) to
// prevent accumulation of zombie processes.
impl Drop for FfmpegFrameIterRgb {
    fn drop(&mut self) {
        let _kill_error = self.child.kill();
        let _wait_error = self.child.wait();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandName {
    Ffprobe,
    Ffmpeg,
}

impl CommandName {
    fn as_os_str(self) -> &'static OsStr {
        match self {
            Self::Ffprobe => OsStr::new("ffprobe"),
            Self::Ffmpeg => OsStr::new("ffmpeg"),
        }
    }
}

fn spawn_command(name: CommandName, args: &[&OsStr]) -> Result<Child, FfmpegError> {
    let mut command = Command::new(name.as_os_str());
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // do not spawn a console window when called from a windows gui app
    #[cfg(target_family = "windows")]
    command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

    command.spawn().map_err(|e| match e.kind() {
        // Separate out NotFound: by far the most likely cause is that
        // ffmpeg is not installed.
        std::io::ErrorKind::NotFound => FfmpegError::FfmpegNotFound,
        _ => FfmpegError::Io(format!("{:?}", e.kind())),
    })
}

pub(crate) struct CommandOutput {
    pub stdout: Vec<u8>,
}

/// Run a short-lived ffmpeg/ffprobe command to completion, with a timeout.
pub(crate) fn run_command(name: CommandName, args: &[&OsStr]) -> Result<CommandOutput, FfmpegError> {
    let mut child = spawn_command(name, args)?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| FfmpegError::Io("failed to obtain stdout".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| FfmpegError::Io("failed to obtain stderr".to_string()))?;

    let deadline = SystemTime::now() + Duration::from_secs(FFPROBE_TIMEOUT_SECS);

    let mut stdout_acc = vec![];
    let mut stderr_acc = vec![];
    let mut read_buf = [0u8; 4096];

    let mut stdout_done = false;
    let mut stderr_done = false;
    while !(stdout_done && stderr_done) {
        if SystemTime::now() > deadline {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(FfmpegError::Io("TimedOut".to_string()));
        }

        if !stdout_done {
            match stdout.read(&mut read_buf) {
                Err(_) | Ok(0) => stdout_done = true,
                Ok(amount) => stdout_acc.extend_from_slice(&read_buf[..amount]),
            }
        }

        if !stderr_done {
            match stderr.read(&mut read_buf) {
                Err(_) | Ok(0) => stderr_done = true,
                Ok(amount) => stderr_acc.extend_from_slice(&read_buf[..amount]),
            }
        }
    }

    let status = child
        .wait()
        .map_err(|e| FfmpegError::Io(format!("{:?}", e.kind())))?;

    if status.success() {
        Ok(CommandOutput { stdout: stdout_acc })
    } else {
        // ffmpeg sometimes prints very long error messages; keep the head.
        match std::str::from_utf8(&stderr_acc) {
            Ok(text) => Err(FfmpegError::FfmpegInternal(
                text.chars().take(500).collect(),
            )),
            Err(_) => Err(FfmpegError::Utf8Conversion),
        }
    }
}
