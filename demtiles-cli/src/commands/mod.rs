use anyhow::{Context, Result};
use demtiles::{ArchiveCatalog, ColorRamp};
use std::path::Path;

pub mod coverage;
pub mod encode;
pub mod list;
pub mod resolve;
pub mod tile;

/// Load the catalog at `path`, or the built-in one.
pub fn load_catalog(path: Option<&Path>) -> Result<ArchiveCatalog> {
    match path {
        Some(path) => ArchiveCatalog::from_path(path)
            .with_context(|| format!("Failed to load catalog: {}", path.display())),
        None => Ok(ArchiveCatalog::builtin()),
    }
}

/// Load the ramp at `path`, or the built-in elevation ramp.
pub fn load_ramp(path: Option<&Path>, no_data: f64) -> Result<ColorRamp> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read ramp: {}", path.display()))?;
            ColorRamp::parse(&text, no_data)
                .with_context(|| format!("Failed to parse ramp: {}", path.display()))
        }
        None => Ok(ColorRamp::default_elevation()),
    }
}

pub fn hex(color: [u8; 4]) -> String {
    format!(
        "#{:02x}{:02x}{:02x}{:02x}",
        color[0], color[1], color[2], color[3]
    )
}
