//! Map configuration

use serde::{Deserialize, Serialize};

use gv_core::config::DEFAULT_TILE_SOURCE_URL;

/// Minimum zoom applied to base tiles when none is configured
pub const DEFAULT_MIN_ZOOM: f64 = 6.0;

/// Initial view and base tile of the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// `[lat, lng]` of the initial view
    pub starting_coords: [f64; 2],
    pub zoom: f64,
    /// Base tile URL template
    pub style: String,
    pub min_zoom: Option<f64>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            starting_coords: [40.0, -3.7],
            zoom: DEFAULT_MIN_ZOOM,
            style: DEFAULT_TILE_SOURCE_URL.to_string(),
            min_zoom: None,
        }
    }
}

impl MapConfig {
    pub fn effective_min_zoom(&self) -> f64 {
        self.min_zoom.unwrap_or(DEFAULT_MIN_ZOOM)
    }
}
