//! Visualisation configuration and the store's mutation surface

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::queries::ColumnSelection;
use crate::StoreError;

/// Default base tile template
pub const DEFAULT_TILE_SOURCE_URL: &str =
    "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png";

pub const DEFAULT_DELIMITER: &str = ",";
pub const DEFAULT_RADIUS: f64 = 7.0;
pub const DEFAULT_BLUR: f64 = 4.0;

/// Column selections and style parameters applied to the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub latitude_column: Option<String>,
    pub longitude_column: Option<String>,
    pub multiplier_column: Option<String>,
    pub delimiter: String,
    pub radius: f64,
    pub blur: f64,
    pub tile_source_url: String,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            latitude_column: None,
            longitude_column: None,
            multiplier_column: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            radius: DEFAULT_RADIUS,
            blur: DEFAULT_BLUR,
            tile_source_url: DEFAULT_TILE_SOURCE_URL.to_string(),
        }
    }
}

impl VisualizationConfig {
    /// The column selection described by this configuration
    pub fn selection(&self) -> ColumnSelection {
        ColumnSelection {
            latitude: self.latitude_column.clone(),
            longitude: self.longitude_column.clone(),
            multiplier: self.multiplier_column.clone(),
        }
    }
}

/// Role a selected column plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Latitude,
    Longitude,
    Multiplier,
}

/// A single settable field of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreField {
    Radius,
    Blur,
    Delimiter,
    TileSourceUrl,
    Column(ColumnRole),
}

impl FromStr for StoreField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "radius" => Ok(StoreField::Radius),
            "blur" => Ok(StoreField::Blur),
            "delimiter" => Ok(StoreField::Delimiter),
            "tileSourceURL" | "tileSourceUrl" | "tile_source_url" => Ok(StoreField::TileSourceUrl),
            "latitude" => Ok(StoreField::Column(ColumnRole::Latitude)),
            "longitude" => Ok(StoreField::Column(ColumnRole::Longitude)),
            "multiplier" => Ok(StoreField::Column(ColumnRole::Multiplier)),
            other => Err(StoreError::UnknownField(other.to_string())),
        }
    }
}

impl std::fmt::Display for StoreField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreField::Radius => "radius",
            StoreField::Blur => "blur",
            StoreField::Delimiter => "delimiter",
            StoreField::TileSourceUrl => "tileSourceURL",
            StoreField::Column(ColumnRole::Latitude) => "latitude",
            StoreField::Column(ColumnRole::Longitude) => "longitude",
            StoreField::Column(ColumnRole::Multiplier) => "multiplier",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VisualizationConfig::default();
        assert_eq!(config.radius, 7.0);
        assert_eq!(config.blur, 4.0);
        assert_eq!(config.delimiter, ",");
        assert!(config.tile_source_url.contains("{z}/{x}/{y}{r}"));
        assert_eq!(config.selection(), ColumnSelection::default());
    }

    #[test]
    fn test_field_names_round_trip() {
        for name in ["radius", "blur", "delimiter", "tileSourceURL", "latitude", "longitude", "multiplier"] {
            let field: StoreField = name.parse().unwrap();
            assert_eq!(field.to_string(), name);
        }
        assert!(matches!("zoom".parse::<StoreField>(), Err(StoreError::UnknownField(_))));
    }
}
