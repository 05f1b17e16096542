use std::path::Path;

use thiserror::Error;

/// Declared stream properties, as reported by the decoder before any frame
/// is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMeta {
    pub fps: f64,
    pub duration_secs: f64,
}

/// A decoded frame's raw pixel-channel samples.
///
/// The summarizer averages over whatever channels the decoder delivers
/// (one for grayscale, three for RGB) with no colorimetric weighting, so
/// two different decoders agree bit-exactly given the same decoded pixels.
pub trait LumaSamples {
    fn samples(&self) -> &[u8];
}

impl LumaSamples for image::RgbImage {
    fn samples(&self) -> &[u8] {
        self.as_raw()
    }
}

impl LumaSamples for image::GrayImage {
    fn samples(&self) -> &[u8] {
        self.as_raw()
    }
}

/// The file could not be opened as a video at all. Mid-stream decode
/// failures are not represented here: a decoder signals those by ending its
/// frame iterator early, and the partial prefix is kept.
#[derive(Error, Debug)]
#[error("unreadable video: {0}")]
pub struct DecodeFailure(pub String);

/// Interface the ingest controller uses to obtain frames. Demuxing and
/// decoding live outside this crate; `ffmpeg_frame_src` provides the
/// production implementation.
pub trait FrameDecoder {
    type Frame: LumaSamples;
    type Frames: Iterator<Item = Self::Frame>;

    fn open(&self, path: &Path) -> Result<(Self::Frames, VideoMeta), DecodeFailure>;
}
