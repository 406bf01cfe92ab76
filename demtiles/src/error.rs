//! Error types for the demtiles library.

use std::sync::Arc;

use thiserror::Error;

use crate::quadkey::{QuadKey, TileCoord};

/// Boxed error returned by external collaborators (archive stores, decompressors).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared form of a collaborator error, so failures can be cached and cloned.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while resolving and encoding elevation tiles.
///
/// `TileError` is `Clone` because a failed archive open is cached and every
/// waiter on that archive observes the same failure.
#[derive(Error, Debug, Clone)]
pub enum TileError {
    /// Tile coordinate outside `z ∈ [0, 30]`, `x, y ∈ [0, 2^z)`.
    #[error("Invalid tile coordinate: z={z}, x={x}, y={y}")]
    InvalidInput { z: u8, x: u32, y: u32 },

    /// Quadkey contains characters other than `0`-`3` or is too long.
    #[error("Invalid quadkey: '{0}' (must contain only digits 0-3 and length <= 30)")]
    InvalidQuadKey(String),

    /// The descriptor names an archive set absent from the catalog.
    #[error("Unknown archive set: {name}")]
    UnknownArchiveSet { name: String },

    /// The tile lies outside every archive of the set.
    #[error("No archive in {archive_set} covers tile {tile}")]
    NoCoveringArchive { archive_set: String, tile: TileCoord },

    /// The archive store failed to open an archive.
    #[error("Failed to open archive {path}: {reason}")]
    ArchiveOpen { path: String, reason: SharedError },

    /// Reading compressed tile bytes from an opened archive failed.
    #[error("Failed to read tile {tile} from archive {archive}: {reason}")]
    ArchiveRead {
        archive: QuadKey,
        tile: TileCoord,
        reason: SharedError,
    },

    /// Reprojection produced zero or several internal tiles.
    #[error("Expected one internal tile for {tile}, found {matches}")]
    ReprojectionAmbiguous { tile: TileCoord, matches: usize },

    /// The archive holds no data at the internal tile coordinate.
    #[error("Archive {archive} has no tile at image {image_id} ({x}, {y})")]
    TileAbsent {
        archive: QuadKey,
        image_id: usize,
        x: u32,
        y: u32,
    },

    /// The compressed payload could not be decoded.
    #[error("Failed to decode tile {tile}: {reason}")]
    Decompression { tile: TileCoord, reason: SharedError },

    /// The encoding method is recognised but not implemented.
    #[error("Unsupported encoding method: {0}")]
    UnsupportedEncoding(String),

    /// A color ramp definition is malformed.
    #[error("Invalid color ramp at line {line}: {message}")]
    InvalidRamp { line: usize, message: String },

    /// An archive catalog is malformed or violates the disjointness invariant.
    #[error("Invalid archive catalog: {0}")]
    InvalidCatalog(String),

    /// A tile-source descriptor string could not be parsed.
    #[error("Invalid tile source '{source_url}': {message}")]
    InvalidDescriptor { source_url: String, message: String },

    /// IO error when reading configuration files.
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
}

impl TileError {
    /// Whether this error belongs to the coverage-boundary class that is
    /// answered with an empty filler tile instead of a failure.
    pub fn is_empty_fallback(&self) -> bool {
        matches!(
            self,
            TileError::UnknownArchiveSet { .. }
                | TileError::NoCoveringArchive { .. }
                | TileError::ReprojectionAmbiguous { .. }
                | TileError::TileAbsent { .. }
        )
    }
}

impl From<std::io::Error> for TileError {
    fn from(err: std::io::Error) -> Self {
        TileError::Io(Arc::new(err))
    }
}

/// Result type alias using [`TileError`].
pub type Result<T> = std::result::Result<T, TileError>;
