//! Piecewise-linear color ramps for elevation samples.
//!
//! A ramp is written one stop per line, in the text format used by
//! `gdaldem color-relief`:
//!
//! ```text
//! nv 0 0 0 0
//! -100 0 0 0 255
//! 0 255 255 255 255
//! 100 0 0 0 255
//! ```
//!
//! The `nv` line gives the color of the no-data sentinel. Every other line is
//! `threshold r g b a`, with thresholds strictly increasing.

use crate::error::{Result, TileError};

/// An 8-bit RGBA color.
pub type Rgba = [u8; 4];

/// No-data sentinel embedded in the elevation archives.
pub const DEFAULT_NO_DATA: f64 = -9999.0;

const DEFAULT_ELEVATION_RAMP: &str = "\
nv 0 0 0 0
-100 30 60 160 255
0 70 130 80 255
200 120 170 90 255
500 200 190 110 255
1000 160 120 80 255
2000 240 240 240 255
";

/// One threshold of a color ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampStop {
    pub value: f64,
    pub color: Rgba,
}

/// Color ramp mapping elevation samples to RGBA.
///
/// # Example
///
/// ```
/// use demtiles::ColorRamp;
///
/// let ramp = ColorRamp::parse("nv 0 0 0 0\n-100 0 0 0 255\n0 255 255 255 255", 0.0).unwrap();
/// assert_eq!(ramp.get(-50.0), [128, 128, 128, 255]);
/// assert_eq!(ramp.get(0.0), [0, 0, 0, 0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    no_data: f64,
    no_data_color: Rgba,
    stops: Vec<RampStop>,
}

impl ColorRamp {
    /// Parse a ramp definition.
    ///
    /// Blank lines and lines starting with `#` are ignored. Without an `nv`
    /// line the no-data color is fully transparent.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRamp`] if a line is malformed, a channel is
    /// outside 0-255, thresholds are not strictly increasing, or no stop is given.
    pub fn parse(text: &str, no_data: f64) -> Result<Self> {
        let mut no_data_color = [0, 0, 0, 0];
        let mut stops: Vec<RampStop> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 5 {
                return Err(invalid(line_no, format!("expected 5 fields, got {}", parts.len())));
            }
            let color = parse_color(line_no, &parts[1..])?;

            if parts[0] == "nv" {
                no_data_color = color;
                continue;
            }

            let value: f64 = parts[0]
                .parse()
                .map_err(|_| invalid(line_no, format!("invalid threshold '{}'", parts[0])))?;
            if !value.is_finite() {
                return Err(invalid(line_no, format!("non-finite threshold {value}")));
            }
            if let Some(prev) = stops.last() {
                if value <= prev.value {
                    return Err(invalid(
                        line_no,
                        format!("threshold {value} does not exceed {}", prev.value),
                    ));
                }
            }
            stops.push(RampStop { value, color });
        }

        if stops.is_empty() {
            return Err(invalid(0, "ramp has no stops".to_string()));
        }
        tracing::debug!(stops = stops.len(), no_data, "Parsed color ramp");

        Ok(Self {
            no_data,
            no_data_color,
            stops,
        })
    }

    /// Built-in hypsometric ramp (blue below sea level through green, brown
    /// and white at 2000 m) with no-data sentinel −9999.
    pub fn default_elevation() -> Self {
        Self::parse(DEFAULT_ELEVATION_RAMP, DEFAULT_NO_DATA).expect("built-in ramp is valid")
    }

    /// Look up the color for a sample.
    ///
    /// The no-data sentinel wins over everything else. Samples outside the
    /// ramp take the color of the nearest end stop; samples in between are
    /// linearly interpolated per channel and rounded half away from zero.
    pub fn get(&self, sample: f64) -> Rgba {
        if sample == self.no_data {
            return self.no_data_color;
        }

        let first = &self.stops[0];
        if sample < first.value {
            return first.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if sample >= hi.value || sample < lo.value {
                continue;
            }
            if sample == lo.value {
                return lo.color;
            }

            let scale = (sample - lo.value) / (hi.value - lo.value);
            let mut out = [0u8; 4];
            for (c, channel) in out.iter_mut().enumerate() {
                let from = f64::from(lo.color[c]);
                let to = f64::from(hi.color[c]);
                *channel = (from + (to - from) * scale).round().clamp(0.0, 255.0) as u8;
            }
            return out;
        }

        self.stops[self.stops.len() - 1].color
    }

    /// The no-data sentinel value.
    pub fn no_data(&self) -> f64 {
        self.no_data
    }

    /// Color emitted for the no-data sentinel.
    pub fn no_data_color(&self) -> Rgba {
        self.no_data_color
    }

    pub fn stops(&self) -> &[RampStop] {
        &self.stops
    }
}

fn parse_color(line: usize, parts: &[&str]) -> Result<Rgba> {
    let mut color = [0u8; 4];
    for (channel, part) in color.iter_mut().zip(parts) {
        *channel = part
            .parse()
            .map_err(|_| invalid(line, format!("invalid color channel '{part}'")))?;
    }
    Ok(color)
}

fn invalid(line: usize, message: String) -> TileError {
    TileError::InvalidRamp { line, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "nv 0 0 0 0
-100 0 0 0 255
0 255 255 255 255
100 0 0 0 255";

    fn table() -> ColorRamp {
        ColorRamp::parse(TABLE, 0.0).unwrap()
    }

    #[test]
    fn test_no_data_wins() {
        assert_eq!(table().get(0.0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_midpoint_interpolation() {
        assert_eq!(table().get(-50.0), [128, 128, 128, 255]);
        assert_eq!(table().get(50.0), [128, 128, 128, 255]);
        assert_eq!(table().get(-75.0), [64, 64, 64, 255]);
    }

    #[test]
    fn test_clamps_outside_range() {
        assert_eq!(table().get(-200.0), [0, 0, 0, 255]);
        assert_eq!(table().get(200.0), [0, 0, 0, 255]);
        assert_eq!(table().get(100.0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_exact_threshold() {
        assert_eq!(table().get(-100.0), [0, 0, 0, 255]);

        let ramp = ColorRamp::parse(TABLE, -9999.0).unwrap();
        assert_eq!(ramp.get(0.0), [255, 255, 255, 255]);
        assert_eq!(ramp.get(-9999.0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_single_stop() {
        let ramp = ColorRamp::parse("10 1 2 3 4", -9999.0).unwrap();
        assert_eq!(ramp.get(-5.0), [1, 2, 3, 4]);
        assert_eq!(ramp.get(10.0), [1, 2, 3, 4]);
        assert_eq!(ramp.get(500.0), [1, 2, 3, 4]);
        // No nv line: transparent
        assert_eq!(ramp.get(-9999.0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let text = "# elevation\n\nnv 9 9 9 9\n  0 0 0 0 255  \n10 10 10 10 255\n";
        let ramp = ColorRamp::parse(text, -1.0).unwrap();
        assert_eq!(ramp.stops().len(), 2);
        assert_eq!(ramp.no_data_color(), [9, 9, 9, 9]);
        assert_eq!(ramp.get(5.0), [5, 5, 5, 255]);
    }

    #[test]
    fn test_rejects_unsorted_thresholds() {
        let err = ColorRamp::parse("0 0 0 0 255\n0 1 1 1 255", 0.0).unwrap_err();
        assert!(matches!(err, TileError::InvalidRamp { line: 2, .. }));

        assert!(ColorRamp::parse("10 0 0 0 255\n5 1 1 1 255", 0.0).is_err());
    }

    #[test]
    fn test_rejects_malformed_lines() {
        assert!(ColorRamp::parse("0 0 0 255", 0.0).is_err());
        assert!(ColorRamp::parse("0 0 0 0 256", 0.0).is_err());
        assert!(ColorRamp::parse("abc 0 0 0 255", 0.0).is_err());
        assert!(ColorRamp::parse("nv 0 0 0 0", 0.0).is_err());
        assert!(ColorRamp::parse("", 0.0).is_err());
    }

    #[test]
    fn test_default_elevation_ramp() {
        let ramp = ColorRamp::default_elevation();
        assert_eq!(ramp.no_data(), DEFAULT_NO_DATA);
        assert_eq!(ramp.get(-9999.0), [0, 0, 0, 0]);
        assert_eq!(ramp.get(0.0), [70, 130, 80, 255]);
        assert_eq!(ramp.get(9000.0), [240, 240, 240, 255]);
    }
}
