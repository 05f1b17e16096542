use crate::{cancel::CancelFlag, decoder::LumaSamples, decoder::VideoMeta};

/// A whole video reduced to one brightness value per frame, plus the
/// stream properties needed to convert frame indices to seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    pub brightness: Vec<f64>,
    pub fps: f64,
    pub duration_secs: f64,
}

impl VideoSummary {
    pub fn frame_count(&self) -> usize {
        self.brightness.len()
    }
}

/// Reduce a decoded-frame stream to per-frame mean brightness.
///
/// Each frame contributes the arithmetic mean over all of its pixel-channel
/// samples. A decoder that fails mid-stream ends its iterator, so the
/// summary covers the decodable prefix. Cancellation also stops the
/// consumption early; the caller is expected to check the flag afterwards
/// and discard the partial result.
pub fn summarize_frames<F>(
    frames: impl IntoIterator<Item = F>,
    meta: VideoMeta,
    cancel: &CancelFlag,
) -> VideoSummary
where
    F: LumaSamples,
{
    let mut brightness = vec![];

    for frame in frames {
        if cancel.is_cancelled() {
            break;
        }
        brightness.push(mean_brightness(&frame));
    }

    VideoSummary {
        brightness,
        fps: meta.fps,
        duration_secs: meta.duration_secs,
    }
}

fn mean_brightness(frame: &impl LumaSamples) -> f64 {
    let samples = frame.samples();
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f64 = samples.iter().map(|&s| f64::from(s)).sum();
    sum / samples.len() as f64
}

#[cfg(test)]
mod test {
    use super::*;

    struct RawFrame(Vec<u8>);

    impl LumaSamples for RawFrame {
        fn samples(&self) -> &[u8] {
            &self.0
        }
    }

    const META: VideoMeta = VideoMeta {
        fps: 25.0,
        duration_secs: 1.0,
    };

    #[test]
    fn mean_is_arithmetic_over_all_channels() {
        // an "rgb" frame of 2 pixels: (10, 20, 30) and (40, 50, 60)
        let frames = vec![RawFrame(vec![10, 20, 30, 40, 50, 60])];
        let summary = summarize_frames(frames, META, &CancelFlag::new());
        assert_eq!(summary.brightness, vec![35.0]);
    }

    #[test]
    fn one_value_per_frame_in_order() {
        let frames = vec![
            RawFrame(vec![0, 0]),
            RawFrame(vec![255, 255]),
            RawFrame(vec![1, 3]),
        ];
        let summary = summarize_frames(frames, META, &CancelFlag::new());
        assert_eq!(summary.brightness, vec![0.0, 255.0, 2.0]);
        assert_eq!(summary.frame_count(), 3);
    }

    #[test]
    fn empty_frame_stream_gives_empty_summary() {
        let summary = summarize_frames(std::iter::empty::<RawFrame>(), META, &CancelFlag::new());
        assert!(summary.brightness.is_empty());
    }

    #[test]
    fn cancellation_stops_consumption() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let frames = vec![RawFrame(vec![1]), RawFrame(vec![2])];
        let summary = summarize_frames(frames, META, &cancel);
        assert!(summary.brightness.is_empty());
    }
}
