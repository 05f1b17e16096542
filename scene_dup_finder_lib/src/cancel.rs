use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cancellation signal shared between the caller (typically a SIGINT
/// handler) and a running ingest or search pass.
///
/// Cancellation is checked at pass boundaries: between files during ingest,
/// between frames during summarization, and between rows during a search.
/// A cancelled ingest rolls back the in-flight file's transaction, so the
/// store stays consistent.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
