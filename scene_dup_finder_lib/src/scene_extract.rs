/// One retained brightness maximum: the frame it occurred at and the time
/// in seconds since the previous retained maximum (or since frame 0 for the
/// first). The gap sequence is what searches compare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBreak {
    pub frame: u32,
    pub gap_secs: f64,
}

/// Reduce a brightness sequence to its scene-transition fingerprint.
///
/// A sample is a retained maximum iff it is strictly greater than every
/// sample within `order = floor(min_spacing_secs * fps)` frames on both
/// sides; ties break against being a peak. Samples closer than `order` to
/// either end of the sequence are never eligible, because their comparison
/// window cannot be fully checked.
pub fn extract_scene_breaks(
    brightness: &[f64],
    fps: f64,
    min_spacing_secs: f64,
) -> Vec<SceneBreak> {
    let order = (min_spacing_secs * fps).floor() as usize;

    let mut breaks = vec![];
    let mut prev_frame = 0usize;

    for i in order..brightness.len().saturating_sub(order) {
        let candidate = brightness[i];

        let mut window = brightness[i - order..i]
            .iter()
            .chain(brightness[i + 1..=i + order].iter());
        let is_peak = window.all(|&neighbor| candidate > neighbor);

        if is_peak {
            breaks.push(SceneBreak {
                frame: i as u32,
                gap_secs: (i - prev_frame) as f64 / fps,
            });
            prev_frame = i;
        }
    }

    breaks
}
