//! Quadkey encoding of slippy-map tile coordinates.
//!
//! A quadkey is the base-4 path from the root tile (zoom 0) down to a tile.
//! Character `i` (0-indexed) describes zoom level `i + 1`: bit `z - 1 - i` of
//! `x` adds 1, the same bit of `y` adds 2.
//!
//! ```
//! use demtiles::quadkey::{QuadKey, TileCoord};
//!
//! let tile = TileCoord::new(3, 3, 5).unwrap();
//! let qk = QuadKey::from_tile(tile);
//! assert_eq!(qk.as_str(), "213");
//! assert_eq!(qk.to_tile(), tile);
//! assert_eq!(qk.to_path_key(), "3-3-5");
//! ```
//!
//! Prefix order is containment: a tile is inside the region of an archive
//! exactly when its quadkey starts with the archive's quadkey.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TileError};

/// Deepest zoom level a tile coordinate or quadkey may have.
pub const MAX_ZOOM: u8 = 30;

/// Slippy-map tile coordinate (Web Mercator, top-left origin).
///
/// Only constructible through [`TileCoord::new`] (deserialization included),
/// so `z <= 30` and `x, y < 2^z` always hold.
///
/// ```compile_fail
/// use demtiles::TileCoord;
///
/// let tile = TileCoord { z: 11, x: 4060, y: 1267 };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTileCoord")]
pub struct TileCoord {
    z: u8,
    x: u32,
    y: u32,
}

#[derive(Deserialize)]
struct RawTileCoord {
    z: u8,
    x: u32,
    y: u32,
}

impl TryFrom<RawTileCoord> for TileCoord {
    type Error = TileError;

    fn try_from(raw: RawTileCoord) -> Result<Self> {
        TileCoord::new(raw.z, raw.x, raw.y)
    }
}

impl TileCoord {
    /// Create a validated tile coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidInput`] if `z > 30` or `x`/`y` fall outside
    /// `[0, 2^z)`.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self> {
        if z > MAX_ZOOM {
            return Err(TileError::InvalidInput { z, x, y });
        }
        let size = 1u64 << z;
        if u64::from(x) >= size || u64::from(y) >= size {
            return Err(TileError::InvalidInput { z, x, y });
        }
        Ok(Self { z, x, y })
    }

    /// Zoom level (0-30).
    pub fn z(&self) -> u8 {
        self.z
    }

    /// Column, 0 at the antimeridian, increasing eastward.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row, 0 at the north edge, increasing southward.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Format as `z-x-y`, the naming used for archive files.
    pub fn to_path_key(&self) -> String {
        format!("{}-{}-{}", self.z, self.x, self.y)
    }

    /// Geographic bounds of the tile as `(west, south, east, north)` in degrees.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let n = 2f64.powi(i32::from(self.z));
        let lon = |x: f64| x / n * 360.0 - 180.0;
        let lat = |y: f64| {
            let merc = std::f64::consts::PI * (1.0 - 2.0 * y / n);
            merc.sinh().atan().to_degrees()
        };
        let x = f64::from(self.x);
        let y = f64::from(self.y);
        (lon(x), lat(y + 1.0), lon(x + 1.0), lat(y))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A validated quadkey string over the alphabet `0`-`3`.
///
/// Ordering is lexicographic on the string, which places every ancestor
/// immediately before its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuadKey(String);

impl QuadKey {
    /// Encode a tile coordinate as a quadkey.
    ///
    /// Infallible: a [`TileCoord`] is range-checked when it is built.
    pub fn from_tile(tile: TileCoord) -> Self {
        let mut key = String::with_capacity(usize::from(tile.z));
        for level in (1..=tile.z).rev() {
            let mask = 1u32 << (level - 1);
            let mut digit = b'0';
            if tile.x & mask != 0 {
                digit += 1;
            }
            if tile.y & mask != 0 {
                digit += 2;
            }
            key.push(char::from(digit));
        }
        QuadKey(key)
    }

    /// Validate and encode a raw `(z, x, y)` triple.
    pub fn from_zxy(z: u8, x: u32, y: u32) -> Result<Self> {
        TileCoord::new(z, x, y).map(Self::from_tile)
    }

    /// Decode the quadkey back into its tile coordinate.
    pub fn to_tile(&self) -> TileCoord {
        let z = self.level();
        let mut x = 0u32;
        let mut y = 0u32;
        for (i, digit) in self.0.bytes().enumerate() {
            let mask = 1u32 << (usize::from(z) - 1 - i);
            match digit {
                b'1' => x |= mask,
                b'2' => y |= mask,
                b'3' => {
                    x |= mask;
                    y |= mask;
                }
                _ => {}
            }
        }
        TileCoord { z, x, y }
    }

    /// Format the decoded tile as `z-x-y`.
    pub fn to_path_key(&self) -> String {
        self.to_tile().to_path_key()
    }

    /// Zoom level, i.e. the number of digits.
    pub fn level(&self) -> u8 {
        self.0.len() as u8
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the region of `self` contains `other` (inclusive).
    pub fn covers(&self, other: &QuadKey) -> bool {
        other.0.starts_with(&self.0)
    }

    /// The enclosing quadkey one level up, or `None` at the root.
    pub fn parent(&self) -> Option<QuadKey> {
        if self.0.is_empty() {
            None
        } else {
            Some(QuadKey(self.0[..self.0.len() - 1].to_string()))
        }
    }
}

impl FromStr for QuadKey {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() > usize::from(MAX_ZOOM) || !s.bytes().all(|b| (b'0'..=b'3').contains(&b)) {
            return Err(TileError::InvalidQuadKey(s.to_string()));
        }
        Ok(QuadKey(s.to_string()))
    }
}

impl TryFrom<String> for QuadKey {
    type Error = TileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<QuadKey> for String {
    fn from(qk: QuadKey) -> Self {
        qk.0
    }
}

impl From<TileCoord> for QuadKey {
    fn from(tile: TileCoord) -> Self {
        QuadKey::from_tile(tile)
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tile_known_values() {
        // Bing Maps documentation example
        assert_eq!(QuadKey::from_zxy(3, 3, 5).unwrap().as_str(), "213");
        assert_eq!(QuadKey::from_zxy(1, 1, 1).unwrap().as_str(), "3");
        assert_eq!(QuadKey::from_zxy(2, 1, 0).unwrap().as_str(), "01");
        assert_eq!(QuadKey::from_zxy(0, 0, 0).unwrap().as_str(), "");
    }

    #[test]
    fn test_to_tile_known_values() {
        let qk: QuadKey = "213".parse().unwrap();
        assert_eq!(qk.to_tile(), TileCoord { z: 3, x: 3, y: 5 });

        let root: QuadKey = "".parse().unwrap();
        assert_eq!(root.to_tile(), TileCoord { z: 0, x: 0, y: 0 });
    }

    #[test]
    fn test_round_trip_low_zooms() {
        for z in 0..=6u8 {
            let size = 1u32 << z;
            for x in 0..size {
                for y in 0..size {
                    let tile = TileCoord::new(z, x, y).unwrap();
                    let qk = QuadKey::from_tile(tile);
                    assert_eq!(qk.level(), z);
                    assert_eq!(qk.to_tile(), tile);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_deep_zooms() {
        for z in [12u8, 20, 30] {
            let max = (1u32 << z) - 1;
            for (x, y) in [(0, 0), (max, max), (max / 3, max / 7), (1, max)] {
                let tile = TileCoord::new(z, x, y).unwrap();
                assert_eq!(QuadKey::from_tile(tile).to_tile(), tile);
            }
        }
    }

    #[test]
    fn test_string_round_trip() {
        // Every key over {0,1,2,3} up to length 5
        let mut keys = vec![String::new()];
        for _ in 0..5 {
            let mut next = Vec::new();
            for key in &keys {
                for d in ['0', '1', '2', '3'] {
                    next.push(format!("{key}{d}"));
                }
            }
            for key in &next {
                let qk: QuadKey = key.parse().unwrap();
                assert_eq!(QuadKey::from_tile(qk.to_tile()), qk);
            }
            keys = next;
        }
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(TileCoord::new(31, 0, 0).is_err());
        assert!(TileCoord::new(0, 1, 0).is_err());
        assert!(TileCoord::new(3, 8, 0).is_err());
        assert!(TileCoord::new(3, 0, 8).is_err());
        assert!(TileCoord::new(30, (1 << 30) - 1, 0).is_ok());
    }

    #[test]
    fn test_deserialize_validates_coordinates() {
        let tile: TileCoord = serde_json::from_str(r#"{"z":11,"x":2012,"y":1267}"#).unwrap();
        assert_eq!(tile, TileCoord::new(11, 2012, 1267).unwrap());
        assert_eq!(serde_json::to_string(&tile).unwrap(), r#"{"z":11,"x":2012,"y":1267}"#);

        // Zoom beyond the maximum would overflow the bit mask in from_tile
        assert!(serde_json::from_str::<TileCoord>(r#"{"z":40,"x":0,"y":0}"#).is_err());
        // Column outside [0, 2^11) would have its high bits masked off
        assert!(serde_json::from_str::<TileCoord>(r#"{"z":11,"x":4060,"y":1267}"#).is_err());
        assert!(serde_json::from_str::<TileCoord>(r#"{"z":3,"x":0,"y":8}"#).is_err());
    }

    #[test]
    fn test_invalid_quadkey() {
        assert!("0124".parse::<QuadKey>().is_err());
        assert!("abc".parse::<QuadKey>().is_err());
        assert!("0".repeat(31).parse::<QuadKey>().is_err());
        assert!("0".repeat(30).parse::<QuadKey>().is_ok());
    }

    #[test]
    fn test_covers_is_prefix() {
        let archive = QuadKey::from_zxy(11, 2012, 1267).unwrap();
        let inside = QuadKey::from_zxy(14, 2012 * 8 + 5, 1267 * 8 + 2).unwrap();
        let outside = QuadKey::from_zxy(14, 2013 * 8, 1267 * 8).unwrap();

        assert!(archive.covers(&archive));
        assert!(archive.covers(&inside));
        assert!(!archive.covers(&outside));
        assert!(!inside.covers(&archive));
    }

    #[test]
    fn test_parent() {
        let qk: QuadKey = "213".parse().unwrap();
        assert_eq!(qk.parent().unwrap().as_str(), "21");
        assert_eq!(qk.parent().unwrap().to_tile(), TileCoord { z: 2, x: 1, y: 2 });
        assert_eq!("".parse::<QuadKey>().unwrap().parent(), None);
    }

    #[test]
    fn test_path_key() {
        let qk = QuadKey::from_zxy(11, 2012, 1267).unwrap();
        assert_eq!(qk.to_path_key(), "11-2012-1267");
    }

    #[test]
    fn test_bounds() {
        let (w, s, e, n) = TileCoord::new(0, 0, 0).unwrap().bounds();
        assert_eq!(w, -180.0);
        assert_eq!(e, 180.0);
        assert!((n - 85.0511).abs() < 1e-3);
        assert!((s + 85.0511).abs() < 1e-3);

        // Taranaki, New Zealand
        let (w, s, e, n) = TileCoord::new(11, 2014, 1267).unwrap().bounds();
        assert!(w < 174.1 && e > 174.1);
        assert!(s < -39.3 && n > -39.3);
    }

    #[test]
    fn test_serde() {
        let qk: QuadKey = serde_json::from_str("\"3130\"").unwrap();
        assert_eq!(qk.as_str(), "3130");
        assert!(serde_json::from_str::<QuadKey>("\"39\"").is_err());
        assert_eq!(serde_json::to_string(&qk).unwrap(), "\"3130\"");
    }
}
