use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use super::load_catalog;

#[derive(Serialize)]
struct SetSummary {
    name: String,
    archives: usize,
    min_zoom: Option<u8>,
    max_zoom: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quadkeys: Option<Vec<String>>,
}

pub fn run(catalog: Option<PathBuf>, archives: bool, json: bool) -> Result<()> {
    let catalog = load_catalog(catalog.as_deref())?;

    let summaries: Vec<SetSummary> = catalog
        .sets()
        .map(|set| {
            let levels = set.quadkeys().iter().map(|qk| qk.level());
            SetSummary {
                name: set.name().to_string(),
                archives: set.len(),
                min_zoom: levels.clone().min(),
                max_zoom: levels.max(),
                quadkeys: archives
                    .then(|| set.quadkeys().iter().map(|qk| qk.to_string()).collect()),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No archive sets in catalog");
        return Ok(());
    }

    println!("{:<24} {:>8} {:>8}", "ARCHIVE SET", "ARCHIVES", "ZOOM");
    println!("{}", "-".repeat(42));

    for summary in &summaries {
        let zoom = match (summary.min_zoom, summary.max_zoom) {
            (Some(min), Some(max)) if min == max => min.to_string(),
            (Some(min), Some(max)) => format!("{}-{}", min, max),
            _ => "-".to_string(),
        };
        println!("{:<24} {:>8} {:>8}", summary.name, summary.archives, zoom);

        if let Some(quadkeys) = &summary.quadkeys {
            for qk in quadkeys {
                println!("  {}", qk);
            }
        }
    }

    println!();
    println!("Summary:");
    println!("  Archive sets: {}", summaries.len());
    println!(
        "  Total archives: {}",
        summaries.iter().map(|s| s.archives).sum::<usize>()
    );

    Ok(())
}
