//! # demtiles - Elevation Tiles from Sparse Raster Archives
//!
//! Serves Web-Mercator elevation tiles out of a sparse collection of raster
//! archives, each covering one quadkey-rooted region.
//!
//! ## Features
//!
//! - **Quadkey Indexing**: Tile-to-archive matching by quadkey prefix, O(log n) per set
//! - **Single Open**: Each archive is opened at most once, however many requests race on it
//! - **Encodings**: Packed-height RGB (`mapbox`) or a piecewise-linear color ramp (`ramp`)
//! - **Empty Fallback**: Coverage gaps yield a well-defined filler tile
//!
//! Archive reading, reprojection and decompression are supplied by the caller
//! through the traits in [`source`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use demtiles::{ArchiveCatalog, ElevationServiceBuilder, TileDescriptor};
//!
//! let service = ElevationServiceBuilder::new(ArchiveCatalog::builtin(), store, reprojector, lerc)
//!     .cache_size(64)
//!     .build();
//!
//! let descriptor = TileDescriptor::parse("cog+lerc://Taranaki2021#mapbox@12/4028/2534")?;
//! let rgba = service.resolve_pixels(&descriptor).await?.into_pixels();
//! ```
//!
//! ## Packed Height
//!
//! ```
//! use demtiles::encoding::{decode_packed_height, encode_packed_height};
//!
//! let px = encode_packed_height(2518.3);
//! assert!((decode_packed_height(px) - 2518.3).abs() < 0.1);
//! ```

pub mod cache;
pub mod catalog;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod quadkey;
pub mod ramp;
pub mod resolver;
pub mod service;
pub mod source;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use cache::{ArchiveCache, CacheStats};
pub use catalog::{ArchiveCatalog, ArchiveSet, ArchiveSetName};
pub use descriptor::TileDescriptor;
pub use encoding::{EncodingMethod, PixelBuffer, SampleGrid, TILE_SIZE};
pub use error::{BoxError, Result, TileError};
pub use quadkey::{QuadKey, TileCoord};
pub use ramp::{ColorRamp, Rgba};
pub use resolver::{Resolution, TileResolver};
pub use service::{ElevationService, ElevationServiceBuilder, TileImage};
pub use source::{Archive, ArchiveStore, DecodedRaster, Decompressor, InternalTile, Reprojector};
