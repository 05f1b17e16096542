use std::path::PathBuf;

use thiserror::Error;

use crate::store::FileId;

/// Error type for all persistent-store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The path is already present in the store. Ingest treats this as
    /// "skip", not as a failure.
    #[error("file already ingested: {0}")]
    AlreadyIngested(PathBuf),

    /// Fingerprint frame indices must be strictly increasing within a file.
    #[error("fingerprint frames out of order for {0}")]
    FingerprintOrder(PathBuf),

    /// A whitelist pair may not reference the same file twice.
    #[error("whitelist pair must reference two distinct files")]
    DegenerateWhitelistPair,

    /// Whitelisting requires at least two distinct files.
    #[error("a whitelist group needs at least two distinct files")]
    WhitelistTooSmall,

    /// Every file in a whitelist group must already be ingested. The whole
    /// add is rejected when any member is unknown.
    #[error("whitelist references unknown file id {0}")]
    UnknownWhitelistId(FileId),
}

/// Error type for the search pass.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ann(#[from] crate::ann::AnnError),
}
