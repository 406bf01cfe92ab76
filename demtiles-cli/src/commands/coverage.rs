use anyhow::{Context, Result};
use demtiles::geojson::{catalog_coverage_geojson, coverage_geojson};
use std::path::PathBuf;

use super::load_catalog;

pub fn run(catalog: Option<PathBuf>, set: Option<String>) -> Result<()> {
    let catalog = load_catalog(catalog.as_deref())?;

    let coverage = match set {
        Some(name) => coverage_geojson(catalog.lookup(&name).context("Unknown archive set")?),
        None => catalog_coverage_geojson(&catalog),
    };

    println!("{}", serde_json::to_string(&coverage)?);
    Ok(())
}
