use std::{path::Path, time::Instant};

use log::{info, warn};
use walkdir::WalkDir;

use crate::{
    cancel::CancelFlag,
    decoder::FrameDecoder,
    definitions::DEFAULT_MIN_PEAK_SPACING_SECS,
    error::StoreError,
    frame_summary::summarize_frames,
    scene_extract::extract_scene_breaks,
    store::Store,
};

/// Options for an ingest pass.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Case-insensitive file extensions to consider (without the dot).
    pub exts: Vec<String>,
    /// Minimum spacing between retained brightness peaks.
    pub min_peak_spacing_secs: f64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            exts: ["mp4", "mkv", "avi", "webm", "mov", "wmv", "flv", "m4v"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_peak_spacing_secs: DEFAULT_MIN_PEAK_SPACING_SECS,
        }
    }
}

/// Counters for one ingest pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Walk `root` recursively and ingest every new video file matching the
/// extension set: decode, summarize brightness, extract the scene
/// fingerprint, and persist all of it in one transaction per file.
///
/// Already-ingested paths are skipped. A per-file failure is logged and the
/// walk continues; only a store-level fault aborts the pass. Cancellation
/// stops the pass between files (and mid-decode), leaving the store
/// consistent.
pub fn ingest_dir<D: FrameDecoder>(
    store: &mut Store,
    decoder: &D,
    root: &Path,
    opts: &IngestOptions,
    cancel: &CancelFlag,
) -> Result<IngestReport, StoreError> {
    let mut report = IngestReport::default();
    let pass_start = Instant::now();

    for entry in WalkDir::new(root) {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("cannot walk {root:?}: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() || !matches_ext(entry.path(), &opts.exts) {
            continue;
        }

        // store keys are absolute paths, so the same library can be
        // ingested from different working directories
        let path = match std::fs::canonicalize(entry.path()) {
            Ok(path) => path,
            Err(_) => entry.path().to_path_buf(),
        };

        if store.is_ingested(&path)? {
            report.skipped += 1;
            continue;
        }

        let file_start = Instant::now();
        match ingest_one(store, decoder, &path, opts, cancel) {
            IngestOutcome::Ingested => {
                report.ingested += 1;
                info!(
                    "ingested {} in {:.2}s",
                    path.display(),
                    file_start.elapsed().as_secs_f64()
                );
            }
            IngestOutcome::NoFingerprints => report.skipped += 1,
            IngestOutcome::Failed => report.failed += 1,
            IngestOutcome::Cancelled => {
                report.cancelled = true;
                break;
            }
            IngestOutcome::StoreFault(e) => return Err(e),
        }
    }

    info!(
        "ingest pass complete: {} ingested, {} skipped, {} failed in {:.1}s",
        report.ingested,
        report.skipped,
        report.failed,
        pass_start.elapsed().as_secs_f64()
    );
    Ok(report)
}

enum IngestOutcome {
    Ingested,
    NoFingerprints,
    Failed,
    Cancelled,
    StoreFault(StoreError),
}

fn ingest_one<D: FrameDecoder>(
    store: &mut Store,
    decoder: &D,
    path: &Path,
    opts: &IngestOptions,
    cancel: &CancelFlag,
) -> IngestOutcome {
    let (frames, meta) = match decoder.open(path) {
        Ok(opened) => opened,
        Err(e) => {
            warn!("cannot open {}: {e}", path.display());
            return IngestOutcome::Failed;
        }
    };

    let summary = summarize_frames(frames, meta, cancel);
    if cancel.is_cancelled() {
        return IngestOutcome::Cancelled;
    }

    if summary.brightness.is_empty() {
        warn!("no frames decoded from {}", path.display());
        return IngestOutcome::Failed;
    }

    let fingerprints = extract_scene_breaks(
        &summary.brightness,
        summary.fps,
        opts.min_peak_spacing_secs,
    );
    if fingerprints.is_empty() {
        warn!("no scene structure found in {}", path.display());
        return IngestOutcome::NoFingerprints;
    }

    match store.insert_video(
        path,
        summary.fps,
        summary.duration_secs,
        &summary.brightness,
        &fingerprints,
    ) {
        Ok(_) => IngestOutcome::Ingested,
        Err(StoreError::Sqlite(e)) => IngestOutcome::StoreFault(StoreError::Sqlite(e)),
        Err(e) => {
            warn!("could not store {}: {e}", path.display());
            IngestOutcome::Failed
        }
    }
}

fn matches_ext(path: &Path, exts: &[String]) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = ext.to_string_lossy().to_ascii_lowercase();
    exts.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}
