/// The default minimum spacing between two retained brightness peaks.
/// Two scene transitions closer together than this are treated as one.
/// Larger values make fingerprints sparser (and searches cheaper) at the
/// cost of temporal resolution.
///
/// Unit: seconds
pub const DEFAULT_MIN_PEAK_SPACING_SECS: f64 = 10.0;

/// The default number of consecutive scene gaps that make up one search
/// window. Each window becomes one vector in the ANN index.
pub const DEFAULT_INDEX_LEN: usize = 10;

/// The default cap on the cumulative seconds of scene gaps considered
/// within a window. Entries past the cap are zeroed so a single long static
/// segment cannot dominate the distance between two windows.
///
/// Unit: seconds
pub const DEFAULT_SCENE_CAP_SECS: f64 = 300.0;

/// The default L2 radius within which two windows are considered to match.
/// Higher values match more-different videos; lower it if there are too
/// many false positives.
pub const DEFAULT_SEARCH_RADIUS: f64 = 3.0;

/// The default stride over window rows during a search. Adjacent windows
/// overlap by all but one fingerprint, so values above 1 trade recall of
/// the best-aligned window for less work.
pub const DEFAULT_SEARCH_STEP: usize = 1;

/// Files with fewer than this many fingerprints (after trimming) carry too
/// little scene structure to search and are excluded from window assembly.
pub const MIN_FINGERPRINTS: usize = 5;

/// Radius queries return at most this many candidates. The search is
/// intentionally local; backends that can return unbounded neighborhoods
/// are re-capped by the reducer so results stay comparable.
pub const MAX_NEIGHBORS: usize = 20;

// SQLite busy timeout. Generous so a background reporting tool holding the
// database briefly does not make an ingest pass fail.
pub(crate) const DB_BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// Environment variable that overrides the database path.
pub const DB_PATH_ENV_VAR: &str = "SCENE_DUP_DB";

/// Database filename used when neither the CLI nor the environment
/// specifies one. Resolved relative to the working directory.
pub const DEFAULT_DB_FILENAME: &str = "scene_dup.sqlite";
