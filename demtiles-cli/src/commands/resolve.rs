use anyhow::{bail, Context, Result};
use demtiles::{ArchiveCatalog, EncodingMethod, QuadKey, TileDescriptor};
use serde::Serialize;
use std::path::PathBuf;

use super::load_catalog;

#[derive(Serialize)]
struct ResolveResponse {
    archive_set: String,
    tile: String,
    quadkey: String,
    archive: Option<ArchiveMatch>,
}

#[derive(Serialize)]
struct ArchiveMatch {
    quadkey: String,
    tile: String,
    path: String,
}

pub fn run(
    catalog: Option<PathBuf>,
    source: &str,
    z: Option<u8>,
    x: Option<u32>,
    y: Option<u32>,
    json: bool,
) -> Result<()> {
    let catalog = load_catalog(catalog.as_deref())?;

    let descriptor = match (z, x, y) {
        (Some(z), Some(x), Some(y)) => {
            TileDescriptor::new(source, EncodingMethod::Mapbox, z, x, y)
                .context("Invalid tile request")?
        }
        (None, None, None) => TileDescriptor::parse(source).context("Invalid tile source")?,
        _ => bail!("Expected <archive-set> <z> <x> <y> or a single tile-source URL"),
    };

    let archive = find_archive(&catalog, &descriptor)?;
    let response = ResolveResponse {
        archive_set: descriptor.archive_set.to_string(),
        tile: descriptor.tile.to_string(),
        quadkey: QuadKey::from_tile(descriptor.tile).to_string(),
        archive,
    };

    if json {
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    println!("Tile: {} (quadkey {})", response.tile, response.quadkey);
    match &response.archive {
        Some(archive) => {
            println!("Archive: {} ({})", archive.quadkey, archive.tile);
            println!("Path: {}", archive.path);
        }
        None => println!("No archive in {} covers this tile", response.archive_set),
    }

    Ok(())
}

/// Covering archive of the request, or `None` when the tile is outside the set.
fn find_archive(
    catalog: &ArchiveCatalog,
    descriptor: &TileDescriptor,
) -> Result<Option<ArchiveMatch>> {
    let set = catalog
        .lookup(descriptor.archive_set.as_str())
        .context("Unknown archive set")?;

    Ok(set
        .find_covering(&QuadKey::from_tile(descriptor.tile))
        .map(|qk| ArchiveMatch {
            quadkey: qk.to_string(),
            tile: qk.to_path_key(),
            path: set.archive_path(qk),
        }))
}
