use std::collections::{BTreeSet, HashMap, HashSet};

use itertools::Itertools;
use log::{debug, info};

use crate::{
    ann::{self, AnnIndex, BackendKind},
    cancel::CancelFlag,
    definitions::{DEFAULT_SEARCH_RADIUS, DEFAULT_SEARCH_STEP, MAX_NEIGHBORS},
    error::SearchError,
    search::matches::match_group::{ClusterEntry, MatchGroup},
    search::window_assembler::{assemble_windows, WindowParams, WindowSet},
    store::{FileId, FileRecord, Store},
};

/// Parameters for a full search pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// L2 radius within which two windows match.
    pub radius: f64,
    /// Stride over window rows. 1 visits every window.
    pub step: usize,
    pub window: WindowParams,
    pub backend: BackendKind,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SEARCH_RADIUS,
            step: DEFAULT_SEARCH_STEP,
            window: WindowParams::default(),
            backend: BackendKind::default(),
        }
    }
}

/// Run the search pass: assemble windows for every ingested file, index
/// them, and reduce the ANN neighborhoods into de-duplicated clusters.
///
/// A file pair is reported at most once across the whole pass. A
/// neighborhood whose file set is a fully-whitelisted clique is suppressed;
/// a partially-whitelisted one is still reported in full (the user's
/// assertion covers the group only when it covers every pair).
///
/// Cluster emission order follows the window row order, so results are
/// stable for a given store and parameter set, up to the backend's radius
/// accuracy. Cancellation stops the iteration; the in-progress cluster is
/// discarded.
pub fn find_duplicates(
    store: &Store,
    params: &SearchParams,
    cancel: &CancelFlag,
) -> Result<Vec<MatchGroup>, SearchError> {
    let windows = assemble_windows(store, &params.window)?;
    info!("assembled {} windows for search", windows.len());
    if windows.vectors.is_empty() {
        return Ok(vec![]);
    }

    let files = store
        .files()?
        .into_iter()
        .map(|record| (record.id, record))
        .collect::<HashMap<_, _>>();

    let index = ann::build_index(params.backend, windows.vectors.clone())?;

    reduce_neighborhoods(store, &windows, index.as_ref(), params, &files, cancel)
}

fn reduce_neighborhoods(
    store: &Store,
    windows: &WindowSet,
    index: &dyn AnnIndex,
    params: &SearchParams,
    files: &HashMap<FileId, FileRecord>,
    cancel: &CancelFlag,
) -> Result<Vec<MatchGroup>, SearchError> {
    let mut known_pairs: HashSet<(FileId, FileId)> = HashSet::new();
    let mut clusters = vec![];

    for row in (0..index.len()).step_by(params.step.max(1)) {
        if cancel.is_cancelled() {
            debug!("search cancelled at row {row}");
            break;
        }

        // Sorted by row index (not distance) so cluster output is
        // deterministic across backends that return shuffled neighborhoods.
        // Re-capped here in case a backend returns unbounded results.
        let mut neighbors = index.query_radius(row, params.radius);
        neighbors.sort_unstable();
        neighbors.truncate(MAX_NEIGHBORS);

        if neighbors.len() <= 1 {
            continue;
        }

        // Phase one: the pair set under the whitelist and known-duplicate
        // filters.
        let file_ids = neighbors
            .iter()
            .map(|&n| windows.tags[n].file_id)
            .collect::<BTreeSet<_>>();
        if file_ids.len() < 2 {
            continue;
        }

        let all_pairs = file_ids
            .iter()
            .copied()
            .tuple_combinations::<(_, _)>()
            .collect::<Vec<_>>();

        if all_pairs_whitelisted(store, &all_pairs)? {
            continue;
        }

        let fresh_pairs = all_pairs
            .into_iter()
            .filter(|pair| !known_pairs.contains(pair))
            .collect::<Vec<_>>();
        if fresh_pairs.is_empty() {
            continue;
        }
        known_pairs.extend(fresh_pairs.iter().copied());

        // Phase two: materialize the cluster in neighbor-index order, one
        // entry per file. The earliest-touched row per file wins as the
        // representative offset.
        let active_ids = fresh_pairs
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect::<BTreeSet<_>>();

        let mut represented = BTreeSet::new();
        let mut entries = vec![];
        for &neighbor in &neighbors {
            let tag = windows.tags[neighbor];
            if !active_ids.contains(&tag.file_id) || !represented.insert(tag.file_id) {
                continue;
            }
            let Some(file) = files.get(&tag.file_id) else {
                continue;
            };
            let offset_secs = if file.fps > 0.0 {
                f64::from(tag.first_frame) / file.fps
            } else {
                0.0
            };
            entries.push(ClusterEntry {
                file: file.clone(),
                offset_secs,
            });
        }

        if let Ok(group) = MatchGroup::new(entries) {
            clusters.push(group);
        }
    }

    info!("search found {} duplicate groups", clusters.len());
    Ok(clusters)
}

// Short-circuits on the first pair that is not whitelisted: only fully
// known cliques are suppressed.
fn all_pairs_whitelisted(
    store: &Store,
    pairs: &[(FileId, FileId)],
) -> Result<bool, SearchError> {
    for &(a, b) in pairs {
        if !store.whitelist_contains(a, b)? {
            return Ok(false);
        }
    }
    Ok(true)
}
