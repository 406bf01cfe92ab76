//! Tile request descriptors and the tile-source URL adapter.
//!
//! Map clients address elevation tiles with URLs such as
//! `cog+lerc://Taranaki2021#ramp@{z}/{x}/{y}`. [`TileDescriptor::parse`] turns
//! a filled-in URL into a typed request; the pipeline itself never parses
//! strings.

use std::fmt;
use std::str::FromStr;

use crate::catalog::ArchiveSetName;
use crate::encoding::EncodingMethod;
use crate::error::{Result, TileError};
use crate::quadkey::TileCoord;

/// A request for one elevation tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileDescriptor {
    pub archive_set: ArchiveSetName,
    pub method: EncodingMethod,
    pub tile: TileCoord,
}

impl TileDescriptor {
    /// Build a descriptor from its parts, validating the set name and tile.
    pub fn new(archive_set: &str, method: EncodingMethod, z: u8, x: u32, y: u32) -> Result<Self> {
        Ok(Self {
            archive_set: archive_set.parse()?,
            method,
            tile: TileCoord::new(z, x, y)?,
        })
    }

    /// Parse `[scheme://]<archive_set>[#<method>]@<z>/<x>/<y>`.
    ///
    /// A missing or empty method selects `mapbox`.
    ///
    /// ```
    /// use demtiles::{EncodingMethod, TileDescriptor};
    ///
    /// let d = TileDescriptor::parse("cog+lerc://Taranaki2021#ramp@12/4028/2534").unwrap();
    /// assert_eq!(d.archive_set.as_str(), "Taranaki2021");
    /// assert_eq!(d.method, EncodingMethod::Ramp);
    /// assert_eq!((d.tile.z(), d.tile.x(), d.tile.y()), (12, 4028, 2534));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidDescriptor`] for malformed URLs and unknown
    /// methods, and [`TileError::InvalidInput`] for out-of-range tiles.
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |message: String| TileError::InvalidDescriptor {
            source_url: source.to_string(),
            message,
        };

        let rest = match source.find("://") {
            Some(idx) => &source[idx + 3..],
            None => source,
        };

        let (head, path) = rest
            .rsplit_once('@')
            .ok_or_else(|| invalid("missing '@' before tile path".to_string()))?;
        let (name, method) = head.split_once('#').unwrap_or((head, ""));

        let archive_set: ArchiveSetName = name
            .parse()
            .map_err(|_| invalid(format!("invalid archive set name '{name}'")))?;
        let method = if method.is_empty() {
            EncodingMethod::default()
        } else {
            method
                .parse()
                .map_err(|_| invalid(format!("unknown encoding method '{method}'")))?
        };

        let parts: Vec<&str> = path.split('/').collect();
        let [z, x, y] = parts.as_slice() else {
            return Err(invalid(format!("expected z/x/y, got '{path}'")));
        };
        let z: u8 = z.parse().map_err(|_| invalid(format!("invalid zoom '{z}'")))?;
        let x: u32 = x.parse().map_err(|_| invalid(format!("invalid column '{x}'")))?;
        let y: u32 = y.parse().map_err(|_| invalid(format!("invalid row '{y}'")))?;

        Ok(Self {
            archive_set,
            method,
            tile: TileCoord::new(z, x, y)?,
        })
    }
}

impl FromStr for TileDescriptor {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}@{}/{}/{}",
            self.archive_set, self.method, self.tile.z(), self.tile.x(), self.tile.y()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_scheme() {
        let d = TileDescriptor::parse("cog+lerc://Taranaki2021#mapbox@11/2012/1267").unwrap();
        assert_eq!(d.archive_set.as_str(), "Taranaki2021");
        assert_eq!(d.method, EncodingMethod::Mapbox);
        assert_eq!(d.tile, TileCoord::new(11, 2012, 1267).unwrap());
    }

    #[test]
    fn test_parse_default_method() {
        let d = TileDescriptor::parse("cog+lerc://Taranaki2021#@11/2012/1267").unwrap();
        assert_eq!(d.method, EncodingMethod::Mapbox);

        let d = TileDescriptor::parse("Taranaki2021@0/0/0").unwrap();
        assert_eq!(d.method, EncodingMethod::Mapbox);
        assert_eq!(d.tile.z(), 0);
    }

    #[test]
    fn test_parse_terrarium_is_recognised() {
        let d = TileDescriptor::parse("Taranaki2021#terrarium@1/1/1").unwrap();
        assert_eq!(d.method, EncodingMethod::Terrarium);
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "Taranaki2021#ramp",
            "Taranaki2021#ramp@1/1",
            "Taranaki2021#ramp@1/1/1/1",
            "Taranaki2021#hillshade@1/1/1",
            "#ramp@1/1/1",
            "Taranaki2021#ramp@a/1/1",
            "Taranaki2021#ramp@1/-1/1",
        ] {
            assert!(
                matches!(
                    TileDescriptor::parse(bad),
                    Err(TileError::InvalidDescriptor { .. })
                ),
                "expected InvalidDescriptor for {bad}"
            );
        }

        assert!(matches!(
            TileDescriptor::parse("Taranaki2021#ramp@2/4/0"),
            Err(TileError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let d = TileDescriptor::new("Taranaki2021", EncodingMethod::Ramp, 12, 4028, 2534).unwrap();
        let text = d.to_string();
        assert_eq!(text, "Taranaki2021#ramp@12/4028/2534");
        assert_eq!(text.parse::<TileDescriptor>().unwrap(), d);
    }
}
