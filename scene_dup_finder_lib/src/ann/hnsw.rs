use hnsw_rs::prelude::*;

use super::AnnIndex;
use crate::definitions::MAX_NEIGHBORS;

// hnsw_rs construction parameters. ef chosen well above the neighbor cap
// so small-library queries are effectively exact.
const MAX_NB_CONNECTION: usize = 16;
const MAX_LAYER: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const EF_SEARCH: usize = 64;

/// Approximate backend built on the `hnsw_rs` hierarchical
/// navigable-small-world graph.
///
/// The graph does not expose indexed vectors, so a copy of the input is
/// kept alongside it; `vector()` therefore returns exactly what distances
/// were computed against (modulo the f64→f32 narrowing applied to both the
/// indexed and the queried side).
pub struct HnswIndex {
    items: Vec<Vec<f64>>,
    items_f32: Vec<Vec<f32>>,
    graph: Hnsw<'static, f32, DistL2>,
}

impl HnswIndex {
    pub fn new(items: Vec<Vec<f64>>) -> Self {
        let items_f32 = items
            .iter()
            .map(|item| item.iter().map(|&v| v as f32).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let mut graph = Hnsw::<f32, DistL2>::new(
            MAX_NB_CONNECTION,
            items.len().max(1),
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistL2 {},
        );
        for (row, item) in items_f32.iter().enumerate() {
            graph.insert_data(item, row);
        }

        Self {
            items,
            items_f32,
            graph,
        }
    }
}

impl AnnIndex for HnswIndex {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn vector(&self, row: usize) -> &[f64] {
        &self.items[row]
    }

    fn query_radius(&self, row: usize, radius: f64) -> Vec<usize> {
        let target = &self.items_f32[row];

        let mut hits = self
            .graph
            .search(target, MAX_NEIGHBORS, EF_SEARCH)
            .into_iter()
            .map(|neighbour| (neighbour.distance, neighbour.d_id))
            .collect::<Vec<_>>();

        // the graph is not guaranteed to hand the query point back
        if !hits.iter().any(|&(_, id)| id == row) {
            hits.push((0.0, row));
        }

        hits.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(MAX_NEIGHBORS);

        hits.into_iter()
            .filter(|&(distance, _)| f64::from(distance) < radius)
            .map(|(_, id)| id)
            .collect()
    }
}
