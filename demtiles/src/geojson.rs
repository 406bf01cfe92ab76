//! GeoJSON export of archive coverage.
//!
//! This module renders the footprint of every archive in a set as a GeoJSON
//! polygon, e.g. for checking a catalog on a map.
//! Enable the `geojson` feature to use this module.
//!
//! # Example
//!
//! ```ignore
//! use demtiles::ArchiveCatalog;
//! use demtiles::geojson::coverage_geojson;
//!
//! let catalog = ArchiveCatalog::builtin();
//! let coverage = coverage_geojson(catalog.lookup("Taranaki2021")?);
//! println!("{}", coverage.to_string());
//! ```

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoJsonValue};

use crate::catalog::{ArchiveCatalog, ArchiveSet};
use crate::quadkey::{QuadKey, TileCoord};

/// Footprint of a tile as a closed lon/lat ring, counter-clockwise.
pub fn tile_polygon(tile: TileCoord) -> Geometry {
    let (west, south, east, north) = tile.bounds();
    Geometry::new(GeoJsonValue::Polygon(vec![vec![
        vec![west, south],
        vec![east, south],
        vec![east, north],
        vec![west, north],
        vec![west, south],
    ]]))
}

/// One feature per archive of `set`, in catalog order.
///
/// Each feature carries `quadkey`, `tile` (`z-x-y`) and `path` properties.
pub fn coverage_geojson(set: &ArchiveSet) -> FeatureCollection {
    let features = set
        .quadkeys()
        .iter()
        .map(|qk| archive_feature(set, qk))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Coverage of every set in the catalog, with an extra `archive_set` property.
pub fn catalog_coverage_geojson(catalog: &ArchiveCatalog) -> FeatureCollection {
    let features = catalog
        .sets()
        .flat_map(|set| {
            set.quadkeys().iter().map(move |qk| {
                let mut feature = archive_feature(set, qk);
                feature.set_property("archive_set", set.name().as_str());
                feature
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn archive_feature(set: &ArchiveSet, qk: &QuadKey) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("quadkey".to_string(), qk.as_str().into());
    properties.insert("tile".to_string(), qk.to_path_key().into());
    properties.insert("path".to_string(), set.archive_path(qk).into());

    Feature {
        bbox: None,
        geometry: Some(tile_polygon(qk.to_tile())),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
