use std::{ffi::OsStr, path::Path};

use serde_json::Value;

use crate::{
    error::FfmpegError,
    frame_iter::{run_command, CommandName},
};

/// Stream metadata obtained from ffprobe: frame rate, duration, and
/// resolution of the first video stream.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct VideoInfo {
    fps: f64,
    duration_secs: f64,
    resolution: (u32, u32),
}

impl VideoInfo {
    /// Probe a file with ffprobe. Only the first video stream is examined.
    ///
    /// # Errors
    /// * The file cannot be read or ffprobe rejects it
    /// * The ffprobe JSON could not be parsed
    /// * No video stream was present
    pub fn new<P: AsRef<Path>>(src_path: P) -> Result<Self, FfmpegError> {
        let src_path = src_path.as_ref();

        #[rustfmt::skip]
        let args = &[
            OsStr::new("-v"),            OsStr::new("quiet"),
            OsStr::new("-show_format"),
            OsStr::new("-show_streams"),
            OsStr::new("-print_format"), OsStr::new("json"),
            OsStr::new(src_path),
        ];

        let output = run_command(CommandName::Ffprobe, args)?;
        let stats_string =
            String::from_utf8(output.stdout).map_err(|_| FfmpegError::Utf8Conversion)?;

        let stats: Value = serde_json::from_str(&stats_string)
            .map_err(|e| FfmpegError::Probe(format!("{e}").chars().take(500).collect()))?;

        let video_stream = first_video_stream(&stats)
            .ok_or_else(|| FfmpegError::Probe("no video stream found".to_string()))?;

        let fps = parse_frame_rate(video_stream)?;

        let duration_secs = match &stats["format"]["duration"] {
            Value::String(d) => d
                .parse::<f64>()
                .map_err(|e| FfmpegError::Probe(e.to_string()))?,
            _ => 0.0,
        };

        let x = video_stream["width"].as_u64().unwrap_or(0) as u32;
        let y = video_stream["height"].as_u64().unwrap_or(0) as u32;

        Ok(Self {
            fps,
            duration_secs,
            resolution: (x, y),
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
}

fn first_video_stream(stats: &Value) -> Option<&Value> {
    stats["streams"]
        .as_array()?
        .iter()
        .find(|stream| stream["codec_type"] == "video")
}

// ffprobe reports the frame rate as a rational string, e.g "30000/1001".
fn parse_frame_rate(stream: &Value) -> Result<f64, FfmpegError> {
    let raw = stream["r_frame_rate"]
        .as_str()
        .or_else(|| stream["avg_frame_rate"].as_str())
        .ok_or_else(|| FfmpegError::Probe("no frame rate field".to_string()))?;

    let mut parts = raw.split('/');
    let numer: f64 = parts
        .next()
        .unwrap_or("")
        .parse()
        .map_err(|_| FfmpegError::Probe(format!("bad frame rate: {raw}")))?;
    let denom: f64 = match parts.next() {
        Some(d) => d
            .parse()
            .map_err(|_| FfmpegError::Probe(format!("bad frame rate: {raw}")))?,
        None => 1.0,
    };

    if denom == 0.0 || numer <= 0.0 {
        return Err(FfmpegError::Probe(format!("bad frame rate: {raw}")));
    }

    Ok(numer / denom)
}
