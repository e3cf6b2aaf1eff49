//! Coordinates, bounding boxes and GeoJSON extent extraction

use geo::{BoundingRect, GeometryCollection};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::MapError;

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<gv_core::Location> for LatLng {
    fn from(location: gv_core::Location) -> Self {
        Self::new(location.latitude, location.longitude)
    }
}

/// Axis-aligned extent used for fit-to-bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self { min_lat, min_lon, max_lat, max_lon }
    }

    /// From `[minLon, minLat, maxLon, maxLat]` (GeoJSON bbox order)
    pub fn from_bbox_array([min_lon, min_lat, max_lon, max_lat]: [f64; 4]) -> Self {
        Self { min_lat, min_lon, max_lat, max_lon }
    }

    /// As `[minLon, minLat, maxLon, maxLat]` (GeoJSON bbox order)
    pub fn to_bbox_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    /// South-west and north-east corners
    pub fn corners(&self) -> (LatLng, LatLng) {
        (
            LatLng::new(self.min_lat, self.min_lon),
            LatLng::new(self.max_lat, self.max_lon),
        )
    }
}

/// Extent of every geometry contained in a GeoJSON object
pub fn geojson_bounds(geojson: &GeoJson) -> Result<BoundingBox, MapError> {
    let collection =
        GeometryCollection::<f64>::try_from(geojson).map_err(|e| MapError::Geometry(e.to_string()))?;

    let rect = collection.bounding_rect().ok_or(MapError::EmptyGeometry)?;
    Ok(BoundingBox::from_bbox_array([rect.min().x, rect.min().y, rect.max().x, rect.max().y]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_bounds_order() {
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[2.0, 41.0], [3.5, 41.0], [3.5, 43.0], [2.0, 43.0], [2.0, 41.0]]]
                }
            }]
        }"#
        .parse()
        .unwrap();

        let bbox = geojson_bounds(&geojson).unwrap();
        assert_eq!(bbox, BoundingBox::new(41.0, 2.0, 43.0, 3.5));
        assert_eq!(bbox.to_bbox_array(), [2.0, 41.0, 3.5, 43.0]);
    }

    #[test]
    fn test_empty_collection() {
        let geojson: GeoJson = r#"{"type": "FeatureCollection", "features": []}"#.parse().unwrap();
        assert!(matches!(geojson_bounds(&geojson), Err(MapError::EmptyGeometry)));
    }

    #[test]
    fn test_bare_geometry_and_feature() {
        let line: GeoJson = r#"{"type": "LineString", "coordinates": [[-3.7, 40.4], [2.2, 41.4]]}"#
            .parse()
            .unwrap();
        assert_eq!(geojson_bounds(&line).unwrap(), BoundingBox::new(40.4, -3.7, 41.4, 2.2));

        let feature: GeoJson = r#"{
            "type": "Feature",
            "properties": null,
            "geometry": {"type": "Point", "coordinates": [2.35, 48.85]}
        }"#
        .parse()
        .unwrap();
        let bbox = geojson_bounds(&feature).unwrap();
        assert_eq!(bbox.corners(), (LatLng::new(48.85, 2.35), LatLng::new(48.85, 2.35)));
    }

    #[test]
    fn test_bbox_array_round_trip() {
        let bbox = BoundingBox::from_bbox_array([-10.0, 35.0, 40.0, 70.0]);
        assert_eq!(bbox.min_lat, 35.0);
        assert_eq!(bbox.max_lon, 40.0);
        assert_eq!(bbox.corners().0, LatLng::new(35.0, -10.0));
    }
}
