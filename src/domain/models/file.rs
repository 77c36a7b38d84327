//! File domain model.

use serde::{Deserialize, Serialize};

/// A source file registered against a run.
///
/// Files are created on first reference. Ignored paths are still
/// registered, with placeholder content, so task file references stay
/// valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Server-assigned identifier.
    pub id: u64,
    pub path: String,
    /// Parent run.
    pub run: u64,
}
