//! Map layer management for the geospatial visualisation pipeline
//!
//! The [`MapFacade`] owns a rendering surface and keeps two registries of
//! what is mounted on it: data layers and controls.

pub mod config;
pub mod facade;
pub mod geometry;
pub mod layer;
pub mod registry;
pub mod surface;
pub mod sync;

use thiserror::Error;

pub use config::MapConfig;
pub use facade::{MapFacade, MarkerPoint, RectangleOptions};
pub use geometry::{geojson_bounds, BoundingBox, LatLng};
pub use layer::{
    BindKind, ControlKind, ControlPosition, HeatOptions, HoverHandlers, LayerDescriptor, LayerEvent,
    LayerEventKind, LayerHandle, LayerKey, LayerRef, MapControl, MapObject, MarkerOptions, PathStyle,
    PopupContent, Shape,
};
pub use registry::{ControlRegistry, LayerRegistry};
pub use surface::{MapSurface, RecordingSurface, SurfaceOp};
pub use sync::{sync_all, SyncReport, SyncTracker, HEAT_LAYER_ID};

/// Errors raised by map operations
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Unknown bind type: {0:?} (expected \"popup\" or \"tooltip\")")]
    UnknownBindType(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("GeoJSON contains no geometry")]
    EmptyGeometry,
}
