//! Elevation tile service.
//!
//! This module provides [`ElevationService`], the per-request pipeline that
//! turns a [`TileDescriptor`] into an RGBA pixel buffer:
//!
//! 1. resolve the covering archive and await its (shared) open
//! 2. locate the internal tile through the [`Reprojector`]
//! 3. fetch the compressed bytes and decode them with the [`Decompressor`]
//! 4. encode the samples with the requested [`EncodingMethod`]
//!
//! Coverage gaps end in an empty filler tile rather than an error; see
//! [`TileError::is_empty_fallback`].
//!
//! ```ignore
//! use demtiles::{ArchiveCatalog, ElevationServiceBuilder};
//!
//! let service = ElevationServiceBuilder::new(ArchiveCatalog::builtin(), store, reprojector, lerc)
//!     .cache_size(64)
//!     .build();
//!
//! let image = service.resolve_source("cog+lerc://Taranaki2021#ramp@12/4028/2534").await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use crate::cache::{ArchiveCache, CacheStats};
use crate::catalog::ArchiveCatalog;
use crate::descriptor::TileDescriptor;
use crate::encoding::{empty_tile, encode_grid, EncodingMethod, PixelBuffer, SampleGrid};
use crate::error::{BoxError, Result, TileError};
use crate::quadkey::{QuadKey, TileCoord};
use crate::ramp::ColorRamp;
use crate::resolver::TileResolver;
use crate::source::{Archive, ArchiveStore, DecodedRaster, Decompressor, Reprojector};

/// Outcome of a successful tile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileImage {
    /// Pixels encoded from archive samples.
    Rendered(PixelBuffer),
    /// 256×256 filler for a tile with no data.
    Empty(PixelBuffer),
}

impl TileImage {
    pub fn pixels(&self) -> &PixelBuffer {
        match self {
            TileImage::Rendered(pixels) | TileImage::Empty(pixels) => pixels,
        }
    }

    pub fn into_pixels(self) -> PixelBuffer {
        match self {
            TileImage::Rendered(pixels) | TileImage::Empty(pixels) => pixels,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TileImage::Empty(_))
    }
}

/// Resolves, decodes and encodes elevation tiles.
///
/// Requests run independently; the archive cache is the only state they
/// share. Wrap the service in an `Arc` to serve requests from many tasks.
pub struct ElevationService<S: ArchiveStore, R, D> {
    resolver: TileResolver<S>,
    reprojector: R,
    decompressor: D,
    ramp: ColorRamp,
}

impl<S, R, D> ElevationService<S, R, D>
where
    S: ArchiveStore,
    R: Reprojector<S::Archive>,
    D: Decompressor,
{
    /// Create a builder. See [`ElevationServiceBuilder`].
    pub fn builder(
        catalog: impl Into<Arc<ArchiveCatalog>>,
        store: Arc<S>,
        reprojector: R,
        decompressor: D,
    ) -> ElevationServiceBuilder<S, R, D> {
        ElevationServiceBuilder::new(catalog, store, reprojector, decompressor)
    }

    /// Produce the pixels for a tile request.
    ///
    /// # Returns
    ///
    /// - `Ok(TileImage::Rendered(_))` - samples encoded with the requested method
    /// - `Ok(TileImage::Empty(_))` - unknown archive set, tile outside every
    ///   archive, ambiguous reprojection or absent internal tile
    /// - `Err(...)` - archive open, read or decode failure, or an
    ///   unsupported encoding method
    pub async fn resolve_pixels(&self, descriptor: &TileDescriptor) -> Result<TileImage> {
        let method = descriptor.method;
        if method == EncodingMethod::Terrarium {
            return Err(TileError::UnsupportedEncoding(method.to_string()));
        }

        let start = Instant::now();
        match self.fetch_samples(descriptor).await {
            Ok(grid) => {
                let pixels = encode_grid(&grid, method, &self.ramp)?;
                tracing::debug!(
                    archive_set = %descriptor.archive_set,
                    z = descriptor.tile.z(),
                    x = descriptor.tile.x(),
                    y = descriptor.tile.y(),
                    method = %method,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Rendered tile"
                );
                Ok(TileImage::Rendered(pixels))
            }
            Err(e) if e.is_empty_fallback() => {
                tracing::debug!(
                    archive_set = %descriptor.archive_set,
                    z = descriptor.tile.z(),
                    x = descriptor.tile.x(),
                    y = descriptor.tile.y(),
                    reason = %e,
                    "Serving empty tile"
                );
                Ok(TileImage::Empty(empty_tile(method)))
            }
            Err(e) => {
                tracing::warn!(
                    archive_set = %descriptor.archive_set,
                    z = descriptor.tile.z(),
                    x = descriptor.tile.x(),
                    y = descriptor.tile.y(),
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Tile request failed"
                );
                Err(e)
            }
        }
    }

    /// Parse a tile-source URL and produce its pixels.
    ///
    /// See [`TileDescriptor::parse`] for the accepted form.
    pub async fn resolve_source(&self, source: &str) -> Result<TileImage> {
        let descriptor = TileDescriptor::parse(source)?;
        self.resolve_pixels(&descriptor).await
    }

    /// Decoded samples for a tile request, without encoding.
    ///
    /// Returns `Ok(None)` in the cases where [`Self::resolve_pixels`] would
    /// serve an empty tile. The encoding method is ignored.
    pub async fn resolve_samples(&self, descriptor: &TileDescriptor) -> Result<Option<SampleGrid>> {
        match self.fetch_samples(descriptor).await {
            Ok(grid) => Ok(Some(grid)),
            Err(e) if e.is_empty_fallback() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_samples(&self, descriptor: &TileDescriptor) -> Result<SampleGrid> {
        let tile = descriptor.tile;
        let resolution = self
            .resolver
            .resolve(descriptor.archive_set.as_str(), tile)?;
        let archive = resolution.handle.await?;

        let located = self.reprojector.locate(&*archive, tile);
        let [source] = located.as_slice() else {
            return Err(TileError::ReprojectionAmbiguous {
                tile,
                matches: located.len(),
            });
        };

        let bytes = archive
            .get_tile(source.image_id, source.x, source.y)
            .await
            .map_err(|e| TileError::ArchiveRead {
                archive: resolution.archive.clone(),
                tile,
                reason: Arc::from(e),
            })?
            .ok_or_else(|| TileError::TileAbsent {
                archive: resolution.archive.clone(),
                image_id: source.image_id,
                x: source.x,
                y: source.y,
            })?;

        let DecodedRaster {
            width,
            height,
            bands,
        } = self
            .decompressor
            .decode(&bytes)
            .await
            .map_err(|e| TileError::Decompression {
                tile,
                reason: Arc::from(e),
            })?;

        let Some(samples) = bands.into_iter().next() else {
            return Err(decode_failure(tile, "decoded raster has no bands".to_string()));
        };
        let sample_count = samples.len();
        SampleGrid::new(width, height, samples).ok_or_else(|| {
            decode_failure(
                tile,
                format!("{sample_count} samples for a {width}x{height} raster"),
            )
        })
    }

    /// Get archive cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.resolver.cache().stats()
    }

    /// Maximum number of cached archives, or `None` when unbounded.
    pub fn cache_capacity(&self) -> Option<u64> {
        self.resolver.cache().capacity()
    }

    /// Drop the cached open of one archive, e.g. after it failed.
    pub fn invalidate_archive(&self, archive: &QuadKey) {
        self.resolver.cache().invalidate(archive);
    }

    /// Drop every cached archive.
    pub fn clear_cache(&self) {
        self.resolver.cache().clear();
    }

    pub fn catalog(&self) -> &ArchiveCatalog {
        self.resolver.catalog()
    }

    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }
}

fn decode_failure(tile: TileCoord, message: String) -> TileError {
    TileError::Decompression {
        tile,
        reason: Arc::from(BoxError::from(message)),
    }
}

/// Builder for creating [`ElevationService`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use demtiles::{ArchiveCatalog, ColorRamp, ElevationServiceBuilder};
///
/// let service = ElevationServiceBuilder::new(ArchiveCatalog::builtin(), store, reprojector, lerc)
///     .cache_size(64)
///     .ramp(ColorRamp::parse(&std::fs::read_to_string("ramp.txt")?, -9999.0)?)
///     .build();
/// ```
pub struct ElevationServiceBuilder<S: ArchiveStore, R, D> {
    catalog: Arc<ArchiveCatalog>,
    store: Arc<S>,
    reprojector: R,
    decompressor: D,
    cache_size: Option<u64>,
    cache: Option<Arc<ArchiveCache<S::Archive>>>,
    ramp: Option<ColorRamp>,
}

impl<S, R, D> ElevationServiceBuilder<S, R, D>
where
    S: ArchiveStore,
    R: Reprojector<S::Archive>,
    D: Decompressor,
{
    /// Create a new builder from the catalog and the collaborators.
    pub fn new(
        catalog: impl Into<Arc<ArchiveCatalog>>,
        store: Arc<S>,
        reprojector: R,
        decompressor: D,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            store,
            reprojector,
            decompressor,
            cache_size: None,
            cache: None,
            ramp: None,
        }
    }

    /// Set the maximum number of archives to keep open.
    ///
    /// By default archives are never evicted.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Use an existing archive cache, shared with other services.
    ///
    /// Takes precedence over [`Self::cache_size`].
    pub fn archive_cache(mut self, cache: Arc<ArchiveCache<S::Archive>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the color ramp used by the `ramp` encoding.
    ///
    /// Default is [`ColorRamp::default_elevation`].
    pub fn ramp(mut self, ramp: ColorRamp) -> Self {
        self.ramp = Some(ramp);
        self
    }

    /// Build the [`ElevationService`].
    pub fn build(self) -> ElevationService<S, R, D> {
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ArchiveCache::new(self.cache_size)));

        ElevationService {
            resolver: TileResolver::new(self.catalog, cache, self.store),
            reprojector: self.reprojector,
            decompressor: self.decompressor,
            ramp: self.ramp.unwrap_or_else(ColorRamp::default_elevation),
        }
    }
}
