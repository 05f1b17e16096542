//! Unified interface over the nearest-neighbor backends used by the search
//! pass. Backends index the assembled window vectors under the Euclidean
//! metric and answer local radius queries around an already-indexed row.

mod exact;
mod hnsw;

use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnError {
    /// The requested backend name is not one of the supported set. Raised
    /// at startup, before any index is built.
    #[error("unknown ANN backend '{0}' (supported: exact, hnsw)")]
    UnknownBackend(String),

    #[error("ANN items must all have the same dimension")]
    DimensionMismatch,
}

/// The available backends. `Exact` answers radius queries exhaustively;
/// `Hnsw` answers them approximately but scales to much larger libraries.
/// The duplicate reducer tolerates either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Exact,
    Hnsw,
}

impl FromStr for BackendKind {
    type Err = AnnError;

    fn from_str(name: &str) -> Result<Self, AnnError> {
        match name.to_ascii_lowercase().as_str() {
            "exact" | "linear" => Ok(Self::Exact),
            "hnsw" => Ok(Self::Hnsw),
            other => Err(AnnError::UnknownBackend(other.to_string())),
        }
    }
}

/// The capability set every backend exposes.
pub trait AnnIndex {
    /// Count of indexed items.
    fn len(&self) -> usize;

    /// The vector at `row`, distance-identical to what was indexed.
    fn vector(&self, row: usize) -> &[f64];

    /// Rows whose L2 distance to `vector(row)` is strictly less than
    /// `radius`, capped at [`crate::MAX_NEIGHBORS`] candidates (nearest
    /// first when the cap bites). The queried row itself is always a member
    /// when the radius is positive.
    fn query_radius(&self, row: usize, radius: f64) -> Vec<usize>;
}

/// Build an index over `items` with the selected backend.
pub fn build_index(
    backend: BackendKind,
    items: Vec<Vec<f64>>,
) -> Result<Box<dyn AnnIndex>, AnnError> {
    let dim = items.first().map_or(0, Vec::len);
    if items.iter().any(|item| item.len() != dim) {
        return Err(AnnError::DimensionMismatch);
    }

    Ok(match backend {
        BackendKind::Exact => Box::new(exact::ExactIndex::new(items)),
        BackendKind::Hnsw => Box::new(hnsw::HnswIndex::new(items)),
    })
}

pub(crate) fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn backend_names_parse() {
        assert_eq!("exact".parse::<BackendKind>().unwrap(), BackendKind::Exact);
        assert_eq!("HNSW".parse::<BackendKind>().unwrap(), BackendKind::Hnsw);
        assert!(matches!(
            "annoy".parse::<BackendKind>(),
            Err(AnnError::UnknownBackend(_))
        ));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let items = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            build_index(BackendKind::Exact, items),
            Err(AnnError::DimensionMismatch)
        ));
    }
}
