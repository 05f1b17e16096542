use log::debug;

use crate::{
    definitions::{DEFAULT_INDEX_LEN, DEFAULT_SCENE_CAP_SECS, MIN_FINGERPRINTS},
    error::StoreError,
    store::{FileId, Store},
};

/// Parameters controlling how fingerprints are projected into fixed-length
/// ANN query vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParams {
    /// Number of consecutive scene gaps per window.
    pub index_len: usize,
    /// Cumulative-seconds cap applied within each window.
    pub scene_cap_secs: f64,
    /// Seconds trimmed from the start of every file before windowing.
    /// Useful to ignore title sequences.
    pub trim_start_secs: f64,
    /// Seconds trimmed from the end of every file.
    pub trim_end_secs: f64,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            index_len: DEFAULT_INDEX_LEN,
            scene_cap_secs: DEFAULT_SCENE_CAP_SECS,
            trim_start_secs: 0.0,
            trim_end_secs: 0.0,
        }
    }
}

/// Which file and fingerprint a window row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowTag {
    pub file_id: FileId,
    pub first_frame: u32,
}

/// The assembled windows for one search pass. `vectors[i]` is tagged by
/// `tags[i]`; both are owned by the pass and discarded afterwards.
#[derive(Debug, Clone, Default)]
pub struct WindowSet {
    pub vectors: Vec<Vec<f64>>,
    pub tags: Vec<WindowTag>,
}

impl WindowSet {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }
}

/// Load every file's fingerprints from the store and slide a fixed-length
/// window over each, applying the scene cap.
///
/// Files with fewer than [`MIN_FINGERPRINTS`] in-range fingerprints are
/// skipped entirely; files with fewer than `index_len` produce no windows.
pub fn assemble_windows(store: &Store, params: &WindowParams) -> Result<WindowSet, StoreError> {
    let mut set = WindowSet::default();

    for file in store.files()? {
        let min_frame = (params.trim_start_secs * file.fps).floor() as i64;
        let max_frame = ((file.duration_secs - params.trim_end_secs) * file.fps).floor() as i64;
        if max_frame < min_frame {
            continue;
        }

        let prints = store.fingerprints_in_range(file.id, min_frame, max_frame)?;
        if prints.len() < MIN_FINGERPRINTS {
            debug!(
                "skipping {} ({} fingerprints in range)",
                file.path.display(),
                prints.len()
            );
            continue;
        }

        for window in prints.windows(params.index_len) {
            let mut vector = window.iter().map(|p| p.gap_secs).collect::<Vec<_>>();
            apply_scene_cap(&mut vector, params.scene_cap_secs);

            set.vectors.push(vector);
            set.tags.push(WindowTag {
                file_id: file.id,
                first_frame: window[0].frame,
            });
        }
    }

    Ok(set)
}

// The running-sum test happens before adding the current entry: the entry
// that first pushes the total over the cap is kept, and everything after it
// is zeroed. Callers depend on this exact sequencing.
fn apply_scene_cap(window: &mut [f64], cap_secs: f64) {
    let mut total = 0.0;
    for value in window.iter_mut() {
        if total > cap_secs {
            *value = 0.0;
        }
        total += *value;
    }
}
