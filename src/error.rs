//! Error types for tileset parsing and terrain clamping

use thiserror::Error;

/// Result type for tileset operations
pub type TilesetResult<T> = Result<T, TilesetError>;

/// Errors reading or parsing a tileset
#[derive(Debug, Error)]
pub enum TilesetError {
    /// IO error reading tileset files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A terrain provider query failure.
///
/// The sampling layer converts these to absent samples and logs them; a
/// failed query never aborts its sibling queries.
#[derive(Debug, Error)]
#[error("terrain query failed: {0}")]
pub struct TerrainError(pub String);

impl TerrainError {
    pub fn new<T: ToString>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

/// Failure of a single clamp tier. Descends the ladder rather than
/// surfacing to the caller.
#[derive(Debug, Clone, Copy, Error)]
pub enum TierError {
    /// No usable bounding descriptor at the attempted tier
    #[error("no usable bounding data at this tier")]
    MissingBoundingData,

    /// Fewer valid terrain samples than the tier requires
    #[error("insufficient terrain samples: {valid} of {required} resolved")]
    InsufficientSamples { required: usize, valid: usize },
}

/// Terminal clamp failure. The model keeps its as-loaded placement.
#[derive(Debug, Error)]
pub enum ClampError {
    /// A clamp for this model is already in flight; concurrent writers to
    /// the same placement transform would race
    #[error("a clamp is already in progress for this model")]
    InProgress,

    /// Every tier of the ladder failed; carries the last tier's error
    #[error("all clamp tiers exhausted: {0}")]
    Exhausted(TierError),
}
