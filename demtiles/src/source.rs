//! Interfaces to the external collaborators of the elevation pipeline.
//!
//! The pipeline does not parse archives, reproject tiling schemes or
//! decompress payloads itself. Those jobs sit behind the traits here:
//!
//! - [`ArchiveStore`] opens a raster archive by storage path.
//! - [`Archive`] returns the compressed bytes of one internal tile.
//! - [`Reprojector`] maps a global tile onto an archive's internal image pyramid.
//! - [`Decompressor`] turns compressed bytes into floating-point samples.
//!
//! Opening, fetching and decoding are the only suspension points.

use async_trait::async_trait;

use crate::error::BoxError;
use crate::quadkey::TileCoord;

/// Opens raster archives.
#[async_trait]
pub trait ArchiveStore: Send + Sync + 'static {
    /// Handle type for an opened archive.
    type Archive: Archive;

    /// Open the archive at `path` (e.g. `Taranaki2021/11-2012-1267.tiff`).
    async fn open(&self, path: &str) -> Result<Self::Archive, BoxError>;
}

/// An opened archive of compressed raster tiles.
#[async_trait]
pub trait Archive: Send + Sync + 'static {
    /// Fetch the compressed bytes of internal tile `(x, y)` of image `image_id`.
    ///
    /// Returns `Ok(None)` when the archive holds no data there.
    async fn get_tile(&self, image_id: usize, x: u32, y: u32) -> Result<Option<Vec<u8>>, BoxError>;
}

/// Location of a global tile inside an archive's image pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternalTile {
    /// Index of the image (overview level) inside the archive.
    pub image_id: usize,
    pub x: u32,
    pub y: u32,
}

/// Maps global tile coordinates onto archive-internal tiles.
pub trait Reprojector<A: ?Sized>: Send + Sync + 'static {
    /// Every internal tile contributing to `tile`; zero, one or many.
    fn locate(&self, archive: &A, tile: TileCoord) -> Vec<InternalTile>;
}

/// Raw output of a decompressor.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRaster {
    pub width: u32,
    pub height: u32,
    /// One row-major sample grid per band.
    pub bands: Vec<Vec<f32>>,
}

/// Decodes compressed tile payloads (LERC or similar).
#[async_trait]
pub trait Decompressor: Send + Sync + 'static {
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedRaster, BoxError>;
}
