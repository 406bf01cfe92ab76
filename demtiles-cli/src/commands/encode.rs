use anyhow::Result;
use demtiles::encoding::{decode_packed_height, encode_packed_height};
use serde::Serialize;
use std::path::PathBuf;

use super::{hex, load_ramp};

#[derive(Serialize)]
struct ColorResponse {
    value: f64,
    rgba: [u8; 4],
    hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    decoded: Option<f64>,
}

pub fn run_ramp(ramp: Option<PathBuf>, no_data: f64, values: &[f64], json: bool) -> Result<()> {
    let ramp = load_ramp(ramp.as_deref(), no_data)?;

    let colors: Vec<ColorResponse> = values
        .iter()
        .map(|&value| {
            let rgba = ramp.get(value);
            ColorResponse {
                value,
                rgba,
                hex: hex(rgba),
                decoded: None,
            }
        })
        .collect();

    print_colors(&colors, json)
}

pub fn run_encode(elevations: &[f32], json: bool) -> Result<()> {
    let colors: Vec<ColorResponse> = elevations
        .iter()
        .map(|&elevation| {
            let rgba = encode_packed_height(elevation);
            ColorResponse {
                value: f64::from(elevation),
                rgba,
                hex: hex(rgba),
                decoded: Some(decode_packed_height(rgba)),
            }
        })
        .collect();

    print_colors(&colors, json)
}

fn print_colors(colors: &[ColorResponse], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(colors)?);
        return Ok(());
    }

    for color in colors {
        let [r, g, b, a] = color.rgba;
        match color.decoded {
            Some(decoded) => println!(
                "{:>10} -> {:>3} {:>3} {:>3} {:>3}  {}  (decodes to {:.1})",
                color.value, r, g, b, a, color.hex, decoded
            ),
            None => println!(
                "{:>10} -> {:>3} {:>3} {:>3} {:>3}  {}",
                color.value, r, g, b, a, color.hex
            ),
        }
    }

    Ok(())
}
