#![allow(clippy::let_and_return)]
#![allow(clippy::len_without_is_empty)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::doc_markdown)]

//! # Overview
//! `scene_dup_finder_lib` is a library for finding near-duplicate video files.
//! A near-duplicate video is a file that closely resembles another but may
//! differ in container, resolution, bitrate, or other re-encoding artifacts.
//!
//! # How it works
//! Every decoded frame of a video is reduced to a single brightness value
//! (the arithmetic mean over all pixel channels). Local maxima of that
//! brightness sequence mark scene transitions; the seconds elapsed between
//! consecutive maxima form a sparse fingerprint of the video's scene
//! structure, which survives re-encoding far better than pixel data does.
//!
//! Fingerprints are persisted in a SQLite database ([`Store`]), keyed by
//! source file. A search projects each file's fingerprint into fixed-length
//! windows, indexes the windows with an approximate-nearest-neighbor backend
//! ([`ann::AnnIndex`]), and reduces the resulting neighborhoods into
//! de-duplicated [`MatchGroup`] clusters, honoring a user whitelist of
//! legitimately-similar files.
//!
//! # High level API
//! * Ingest a directory of videos: [`ingest_dir`] (the caller supplies a
//!   [`FrameDecoder`]; the companion crate `ffmpeg_frame_src` provides one).
//! * Search the store for duplicate clusters: [`find_duplicates`].
//! * Suppress a known-legitimate group: [`Store::whitelist_add`].
//! * Drop records for deleted files: [`Store::purge`].
//!
//! # Limitations
//! The fingerprint captures *when* scene breaks occur, not what the frames
//! look like, so videos must share a sufficiently long run of scene
//! structure to match. Heavy editing, rotation, or time-stretching defeats
//! the matcher. This is a fuzzy matcher, not a content-identity check.

mod cancel;
mod decoder;
mod definitions;
mod error;
mod frame_summary;
mod ingest;
mod scene_extract;
mod search;
mod store;

pub mod ann;

pub use cancel::CancelFlag;
pub use decoder::{DecodeFailure, FrameDecoder, LumaSamples, VideoMeta};
pub use error::{SearchError, StoreError};
pub use frame_summary::{summarize_frames, VideoSummary};
pub use ingest::{ingest_dir, IngestOptions, IngestReport};
pub use scene_extract::{extract_scene_breaks, SceneBreak};
pub use search::{
    dup_reducer::find_duplicates, dup_reducer::SearchParams, matches::match_group::ClusterEntry,
    matches::match_group::MatchGroup, window_assembler::WindowParams,
};
pub use store::{FileId, FileRecord, PurgeReport, Store};

pub use definitions::{
    DB_PATH_ENV_VAR, DEFAULT_DB_FILENAME, DEFAULT_INDEX_LEN, DEFAULT_MIN_PEAK_SPACING_SECS,
    DEFAULT_SCENE_CAP_SECS, DEFAULT_SEARCH_RADIUS, DEFAULT_SEARCH_STEP, MAX_NEIGHBORS,
    MIN_FINGERPRINTS,
};
