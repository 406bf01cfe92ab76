//! Elevation-to-pixel encodings.
//!
//! Two encodings are implemented:
//!
//! - **mapbox** (packed height): elevation `h` in meters becomes
//!   `v = (h + 10000) / 0.1`, stored as `R = ⌊v / 65536⌋ mod 256`,
//!   `G = ⌊v / 256⌋ mod 256`, `B = v mod 256` and `A = 255`. This is the
//!   Terrain-RGB layout read by terrain renderers.
//! - **ramp**: each sample is colored by a [`ColorRamp`].
//!
//! `terrarium` is recognised but not implemented.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TileError};
use crate::ramp::{ColorRamp, Rgba};

/// Width and height of an empty filler tile.
pub const TILE_SIZE: u32 = 256;

/// Elevation encoded as value 0 by the packed-height encoding.
pub const PACKED_BASE: f64 = -10_000.0;

/// Meters per packed-height step.
pub const PACKED_INTERVAL: f64 = 0.1;

/// No-data value written by the elevation archives.
pub const NO_DATA_SENTINEL: f32 = -9999.0;

/// Pixel encoding requested for a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMethod {
    /// Packed-height RGB.
    #[default]
    Mapbox,
    /// Alternate packed-height layout; not implemented.
    Terrarium,
    /// Discrete color ramp.
    Ramp,
}

impl EncodingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingMethod::Mapbox => "mapbox",
            EncodingMethod::Terrarium => "terrarium",
            EncodingMethod::Ramp => "ramp",
        }
    }
}

impl FromStr for EncodingMethod {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mapbox" => Ok(EncodingMethod::Mapbox),
            "terrarium" => Ok(EncodingMethod::Terrarium),
            "ramp" => Ok(EncodingMethod::Ramp),
            other => Err(TileError::UnsupportedEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for EncodingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded elevation raster: row-major `f32` samples in meters.
///
/// Always holds exactly `width * height` samples.
///
/// ```compile_fail
/// use demtiles::SampleGrid;
///
/// let grid = SampleGrid { width: 2, height: 2, samples: vec![1.0] };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl SampleGrid {
    /// Build a grid, or `None` if `samples.len() != width * height`.
    pub fn new(width: u32, height: u32, samples: Vec<f32>) -> Option<Self> {
        (samples.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            samples,
        })
    }

    /// A grid where every sample is `value`.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            samples: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Sample at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// RGBA8 image, row-major with a top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// A buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            data: color.repeat(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[offset..offset + 4]);
        Some(px)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Encode one elevation sample with the packed-height encoding.
///
/// The no-data sentinel and 0 are both written as elevation 0, so a true
/// sea-level sample and a missing sample encode identically. Values below
/// the encodable range clamp to `[0, 0, 0, 255]`.
///
/// ```
/// use demtiles::encoding::encode_packed_height;
///
/// assert_eq!(encode_packed_height(-9999.0), [1, 134, 160, 255]);
/// ```
pub fn encode_packed_height(sample: f32) -> Rgba {
    let elevation = if sample == NO_DATA_SENTINEL || sample == 0.0 {
        0.0
    } else {
        f64::from(sample)
    };

    let v = ((elevation - PACKED_BASE) / PACKED_INTERVAL).max(0.0);
    let r = (v / 65536.0).floor() % 256.0;
    let g = (v / 256.0).floor() % 256.0;
    // Fractional steps are truncated
    let b = v % 256.0;

    [r as u8, g as u8, b as u8, 255]
}

/// Recover the elevation in meters from a packed-height pixel.
pub fn decode_packed_height(pixel: Rgba) -> f64 {
    let v = f64::from(pixel[0]) * 65536.0 + f64::from(pixel[1]) * 256.0 + f64::from(pixel[2]);
    PACKED_BASE + v * PACKED_INTERVAL
}

/// Encode every sample of `grid` into a pixel buffer of the same size.
///
/// # Errors
///
/// Returns [`TileError::UnsupportedEncoding`] for [`EncodingMethod::Terrarium`].
pub fn encode_grid(
    grid: &SampleGrid,
    method: EncodingMethod,
    ramp: &ColorRamp,
) -> Result<PixelBuffer> {
    let encode: Box<dyn Fn(f32) -> Rgba + '_> = match method {
        EncodingMethod::Mapbox => Box::new(encode_packed_height),
        EncodingMethod::Ramp => Box::new(|sample| ramp.get(f64::from(sample))),
        EncodingMethod::Terrarium => {
            return Err(TileError::UnsupportedEncoding(method.to_string()));
        }
    };

    let mut data = Vec::with_capacity(grid.samples.len() * 4);
    for &sample in &grid.samples {
        data.extend_from_slice(&encode(sample));
    }

    Ok(PixelBuffer {
        width: grid.width,
        height: grid.height,
        data,
    })
}

/// Filler tile for requests that resolve to no data.
///
/// Under `mapbox` every pixel is elevation 0 at full opacity, so terrain
/// meshes stay continuous over gaps; every other method gets a fully
/// transparent tile.
pub fn empty_tile(method: EncodingMethod) -> PixelBuffer {
    match method {
        EncodingMethod::Mapbox => {
            PixelBuffer::filled(TILE_SIZE, TILE_SIZE, encode_packed_height(0.0))
        }
        _ => PixelBuffer::transparent(TILE_SIZE, TILE_SIZE),
    }
}
