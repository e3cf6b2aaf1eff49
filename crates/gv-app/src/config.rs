//! Command line and file configuration for the `geoviz` binary
//!
//! Values are layered: an optional JSON file first, then `GEOVIZ_*`
//! environment variables, then command line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use gv_core::VisualizationConfig;
use gv_data::{ParseOptions, QuoteStrategy, RowValidation};
use gv_map::MapConfig;

#[derive(Debug, Parser)]
#[command(name = "geoviz", about = "Build heat map layers from delimited text", version)]
pub struct Args {
    /// Delimited text file to load
    pub input: PathBuf,

    /// JSON configuration file
    #[arg(short, long, env = "GEOVIZ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Latitude column
    #[arg(long, env = "GEOVIZ_LAT")]
    pub lat: Option<String>,

    /// Longitude column
    #[arg(long, env = "GEOVIZ_LON")]
    pub lon: Option<String>,

    /// Column scaled into heat magnitudes
    #[arg(long, env = "GEOVIZ_MULTIPLIER")]
    pub multiplier: Option<String>,

    #[arg(short, long, env = "GEOVIZ_DELIMITER")]
    pub delimiter: Option<String>,

    /// Heat point radius
    #[arg(long, env = "GEOVIZ_RADIUS")]
    pub radius: Option<f64>,

    /// Heat point blur
    #[arg(long, env = "GEOVIZ_BLUR")]
    pub blur: Option<f64>,

    /// Base tile URL template
    #[arg(long, env = "GEOVIZ_TILE_URL")]
    pub tile: Option<String>,

    /// Reject rows whose length differs from the header
    #[arg(long)]
    pub strict: bool,

    /// Honour RFC 4180 quoting instead of stripping quotes
    #[arg(long)]
    pub rfc4180: bool,

    /// Store numeric cells as numbers
    #[arg(long)]
    pub numbers: bool,
}

/// Everything the binary needs to build the store and the map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub visualization: VisualizationConfig,
    pub map: MapConfig,
    pub parse: ParseOptions,
}

impl AppConfig {
    /// Read a JSON config file; missing sections fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Final configuration for a set of arguments
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        Ok(config)
    }

    fn apply_args(&mut self, args: &Args) {
        let vis = &mut self.visualization;
        if let Some(lat) = &args.lat {
            vis.latitude_column = Some(lat.clone());
        }
        if let Some(lon) = &args.lon {
            vis.longitude_column = Some(lon.clone());
        }
        if let Some(multiplier) = &args.multiplier {
            vis.multiplier_column = Some(multiplier.clone());
        }
        if let Some(delimiter) = &args.delimiter {
            vis.delimiter = delimiter.clone();
        }
        if let Some(radius) = args.radius {
            vis.radius = radius;
        }
        if let Some(blur) = args.blur {
            vis.blur = blur;
        }
        if let Some(tile) = &args.tile {
            vis.tile_source_url = tile.clone();
        }

        if args.strict {
            self.parse.validation = RowValidation::Strict;
        }
        if args.rfc4180 {
            self.parse.quoting = QuoteStrategy::Rfc4180;
        }
        if args.numbers {
            self.parse.coerce_numbers = true;
        }
    }
}
