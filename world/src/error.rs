//! Error types for world operations.

use thiserror::Error;

use crate::store::StoreError;

/// Failures raised by [`crate::GridWorld`].
#[derive(Debug, Error)]
pub enum WorldError {
    /// Loading a world or the world list failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing the active world failed. The change is kept in memory and the
    /// world stays dirty until a later write succeeds.
    #[error("failed to persist world `{world}`: {source}")]
    Persistence {
        /// Name of the world that could not be written.
        world: String,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// The grid is too short to hold a surface, the ground and bedrock.
    #[error("grid with {rows} rows is too small for terrain generation")]
    GridTooSmall {
        /// Number of rows in the grid.
        rows: u32,
    },
}

/// Result alias used throughout the world crate.
pub type Result<T> = std::result::Result<T, WorldError>;
