use anyhow::{Context, Result};
use demtiles::{QuadKey, TileCoord};
use serde::Serialize;

#[derive(Serialize)]
struct TileResponse {
    quadkey: String,
    z: u8,
    x: u32,
    y: u32,
    path_key: String,
    /// `[west, south, east, north]` in degrees
    bounds: [f64; 4],
}

impl TileResponse {
    fn new(quadkey: &QuadKey) -> Self {
        let tile = quadkey.to_tile();
        let (west, south, east, north) = tile.bounds();
        Self {
            quadkey: quadkey.to_string(),
            z: tile.z(),
            x: tile.x(),
            y: tile.y(),
            path_key: tile.to_path_key(),
            bounds: [west, south, east, north],
        }
    }
}

pub fn run_quadkey(z: u8, x: u32, y: u32, json: bool) -> Result<()> {
    let tile = TileCoord::new(z, x, y).context("Invalid tile coordinate")?;
    let quadkey = QuadKey::from_tile(tile);

    if json {
        println!("{}", serde_json::to_string(&TileResponse::new(&quadkey))?);
    } else if quadkey.level() == 0 {
        // The root tile has an empty quadkey
        println!("(root)");
    } else {
        println!("{}", quadkey);
    }

    Ok(())
}

pub fn run_tile(quadkey: &str, json: bool) -> Result<()> {
    let quadkey: QuadKey = quadkey.parse().context("Invalid quadkey")?;
    let response = TileResponse::new(&quadkey);

    if json {
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    let [west, south, east, north] = response.bounds;
    println!("Quadkey: {}", response.quadkey);
    println!("Tile: {}/{}/{}", response.z, response.x, response.y);
    println!("Path key: {}", response.path_key);
    println!(
        "Bounds: {:.6}, {:.6} to {:.6}, {:.6} (lon/lat)",
        west, south, east, north
    );

    Ok(())
}
