use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Elevation archive catalog and tile encoding tool
#[derive(Parser)]
#[command(name = "demtiles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Archive catalog JSON file (built-in catalog if not set)
    #[arg(short, long, env = "DEMTILES_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Color ramp file (built-in elevation ramp if not set)
    #[arg(short, long, env = "DEMTILES_RAMP", global = true)]
    ramp: Option<PathBuf>,

    /// No-data sentinel of the color ramp file
    #[arg(
        long,
        default_value_t = demtiles::ramp::DEFAULT_NO_DATA,
        allow_negative_numbers = true,
        global = true
    )]
    no_data: f64,

    /// Output results as JSON
    #[arg(short, long, global = true)]
    json: bool,

    /// Log catalog and ramp loading to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the quadkey of a tile
    Quadkey { z: u8, x: u32, y: u32 },

    /// Display the tile coordinate and bounds of a quadkey
    Tile { quadkey: String },

    /// List archive sets in the catalog
    List {
        /// Also list every archive of each set
        #[arg(short, long)]
        archives: bool,
    },

    /// Find the archive covering a tile
    Resolve {
        /// Archive set name, or a full tile-source URL such as
        /// `cog+lerc://Taranaki2021#ramp@12/4028/2534`
        source: String,
        z: Option<u8>,
        x: Option<u32>,
        y: Option<u32>,
    },

    /// Look up elevations in the color ramp
    Ramp {
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,
    },

    /// Encode elevations as packed-height RGBA
    Encode {
        #[arg(required = true, allow_negative_numbers = true)]
        elevations: Vec<f32>,
    },

    /// Print archive footprints as GeoJSON
    Coverage {
        /// Archive set name (all sets if not specified)
        set: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "demtiles=debug"
    } else {
        "demtiles=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Quadkey { z, x, y } => commands::tile::run_quadkey(z, x, y, cli.json),
        Commands::Tile { quadkey } => commands::tile::run_tile(&quadkey, cli.json),
        Commands::List { archives } => commands::list::run(cli.catalog, archives, cli.json),
        Commands::Resolve { source, z, x, y } => {
            commands::resolve::run(cli.catalog, &source, z, x, y, cli.json)
        }
        Commands::Ramp { values } => {
            commands::encode::run_ramp(cli.ramp, cli.no_data, &values, cli.json)
        }
        Commands::Encode { elevations } => commands::encode::run_encode(&elevations, cli.json),
        Commands::Coverage { set } => commands::coverage::run(cli.catalog, set),
    }
}
