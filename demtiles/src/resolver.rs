//! Resolution of a requested tile to the archive covering it.

use std::sync::Arc;

use crate::cache::{ArchiveCache, SharedArchive};
use crate::catalog::{ArchiveCatalog, ArchiveSetName};
use crate::error::{Result, TileError};
use crate::quadkey::{QuadKey, TileCoord};
use crate::source::ArchiveStore;

/// The archive covering a requested tile.
pub struct Resolution<A> {
    pub archive_set: ArchiveSetName,
    /// Quadkey of the covering archive.
    pub archive: QuadKey,
    /// Storage path the archive is opened from.
    pub path: String,
    /// Pending or completed open of the archive, shared with other requests.
    pub handle: SharedArchive<A>,
}

/// Finds covering archives and hands out their (cached) opens.
pub struct TileResolver<S: ArchiveStore> {
    catalog: Arc<ArchiveCatalog>,
    cache: Arc<ArchiveCache<S::Archive>>,
    store: Arc<S>,
}

impl<S: ArchiveStore> TileResolver<S> {
    pub fn new(
        catalog: Arc<ArchiveCatalog>,
        cache: Arc<ArchiveCache<S::Archive>>,
        store: Arc<S>,
    ) -> Self {
        Self {
            catalog,
            cache,
            store,
        }
    }

    /// Resolve `tile` within `archive_set`.
    ///
    /// The archive is opened through the cache, at most once per quadkey.
    /// The returned handle has not necessarily finished opening.
    ///
    /// # Errors
    ///
    /// - [`TileError::UnknownArchiveSet`] if the set is not in the catalog
    /// - [`TileError::NoCoveringArchive`] if no archive of the set covers the tile
    pub fn resolve(&self, archive_set: &str, tile: TileCoord) -> Result<Resolution<S::Archive>> {
        let (set, archive) = self.catalog.find_covering(archive_set, tile)?;
        let path = set.archive_path(archive);

        let store = Arc::clone(&self.store);
        let open_path = path.clone();
        let handle = self.cache.get_or_open(archive, move || async move {
            match store.open(&open_path).await {
                Ok(opened) => Ok(Arc::new(opened)),
                Err(e) => {
                    tracing::warn!(path = %open_path, error = %e, "Failed to open archive");
                    Err(TileError::ArchiveOpen {
                        path: open_path,
                        reason: Arc::from(e),
                    })
                }
            }
        });

        Ok(Resolution {
            archive_set: set.name().clone(),
            archive: archive.clone(),
            path,
            handle,
        })
    }

    pub fn catalog(&self) -> &ArchiveCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ArchiveCache<S::Archive> {
        &self.cache
    }
}
