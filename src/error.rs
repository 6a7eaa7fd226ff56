use std::path::PathBuf;

use thiserror::Error;

/// The inventory file could not be read at all. Per-row problems are never
/// fatal; this is.
#[derive(Debug, Error)]
#[error("cannot read inventory {}: {source}", .path.display())]
pub struct InventoryLoadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A prefix query matched more than one hostname. The attempt is aborted
/// rather than guessing.
#[derive(Debug, Error)]
#[error("'{query}' is ambiguous, matches: {}", .candidates.join(", "))]
pub struct AmbiguousMatch {
    pub query: String,
    pub candidates: Vec<String>,
}
