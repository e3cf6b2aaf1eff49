//! Map facade: shape creation, layer/control bookkeeping, base tiles and viewport

use geojson::GeoJson;
use tracing::{debug, info};

use gv_core::Location;

use crate::config::MapConfig;
use crate::geometry::{self, BoundingBox, LatLng};
use crate::layer::{
    BindKind, ClusterOptions, HeatOptions, HoverHandlers, LayerDescriptor, LayerEvent, LayerEventKind,
    LayerHandle, LayerRef, MapControl, MapObject, MarkerOptions, PathStyle, PopupBinding, PopupContent,
    Shape, TileOptions,
};
use crate::registry::{ControlRegistry, LayerRegistry};
use crate::surface::MapSurface;
use crate::MapError;

/// Registry type used for individual markers
pub const MARKER_TYPE: &str = "marker";

/// Registry id of the single GeoJSON overlay
pub const GEOJSON_LAYER_ID: &str = "geojson";

/// A point to drop a marker on, with arbitrary attached data
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub info: Option<serde_json::Value>,
}

impl From<Location> for MarkerPoint {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            info: serde_json::to_value(location).ok(),
        }
    }
}

/// Rectangle styling; unset fields fall back to blue at 0.8 opacity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectangleOptions {
    pub color: Option<String>,
    pub opacity: Option<f64>,
}

/// The map as seen by the rest of the application
///
/// Owns the rendering surface and both registries. All mounting goes through
/// here so bookkeeping and what is drawn never diverge.
pub struct MapFacade<S: MapSurface> {
    surface: S,
    config: MapConfig,
    layers: LayerRegistry,
    controls: ControlRegistry,
    base_tile: (LayerHandle, String),
}

impl<S: MapSurface> MapFacade<S> {
    /// Set the initial view and mount the configured base tile
    pub fn new(mut surface: S, config: MapConfig) -> Result<Self, MapError> {
        surface.set_view(config.starting_coords.into(), config.zoom);

        let url = config.style.clone();
        let handle = Self::mount_tile(&mut surface, &config, &url)?;
        info!("Map initialised at {:?} (zoom {}) with base tile {}", config.starting_coords, config.zoom, url);

        Ok(Self {
            surface,
            config,
            layers: LayerRegistry::new(),
            controls: ControlRegistry::new(),
            base_tile: (handle, url),
        })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn controls(&self) -> &ControlRegistry {
        &self.controls
    }

    pub fn base_tile_url(&self) -> &str {
        &self.base_tile.1
    }

    // Base tile

    /// Swap the base tile layer for one built from `url`
    pub fn change_base_tile(&mut self, url: impl Into<String>) -> Result<(), MapError> {
        let url = url.into();
        let handle = Self::mount_tile(&mut self.surface, &self.config, &url)?;
        let (old, _) = std::mem::replace(&mut self.base_tile, (handle, url));
        self.surface.unmount_layer(old);
        info!("Base tile changed to {}", self.base_tile.1);
        Ok(())
    }

    fn mount_tile(surface: &mut S, config: &MapConfig, url: &str) -> Result<LayerHandle, MapError> {
        let tile = MapObject::new(Shape::Tile {
            url: url.to_string(),
            options: TileOptions {
                min_zoom: config.effective_min_zoom(),
                attribution: false,
            },
        });
        let handle = LayerHandle::new();
        surface
            .mount_layer(handle, &tile)
            .map_err(|e| MapError::Surface(e.to_string()))?;
        Ok(handle)
    }

    // Shape creation

    /// Marker carrying `point` as metadata, with optional bound content and handlers
    pub fn create_marker(
        &self,
        point: MarkerPoint,
        options: MarkerOptions,
        content: Option<PopupContent>,
        handlers: HoverHandlers,
    ) -> MapObject {
        let object = MapObject::new(Shape::Marker {
            position: LatLng::new(point.latitude, point.longitude),
            options,
            info: point.info,
        })
        .with_handlers(handlers);

        match content {
            Some(content) => object.with_binding(PopupBinding {
                kind: content.kind,
                text: content.text,
                close_button: true,
                position: content.position.unwrap_or_else(|| "top".to_string()),
                open_on_hover: false,
            }),
            None => object,
        }
    }

    /// Marker built from a textual bind type such as `"popup"` or `"tooltip"`
    pub fn create_marker_with(
        &self,
        point: MarkerPoint,
        options: MarkerOptions,
        text: &str,
        bind_type: &str,
        handlers: HoverHandlers,
    ) -> Result<MapObject, MapError> {
        let content = PopupContent::new(text, bind_type)?;
        Ok(self.create_marker(point, options, Some(content), handlers))
    }

    pub fn create_circle_marker(&self, center: LatLng, style: PathStyle, popup: Option<String>) -> MapObject {
        let object = MapObject::new(Shape::CircleMarker { center, style });
        match popup {
            Some(text) => object.with_hover_content(BindKind::Popup, text),
            None => object,
        }
    }

    pub fn create_circle(&self, center: LatLng, style: PathStyle, tooltip: Option<String>) -> MapObject {
        let object = MapObject::new(Shape::Circle { center, style });
        match tooltip {
            Some(text) => object.with_hover_content(BindKind::Tooltip, text),
            None => object,
        }
    }

    pub fn create_rectangle(&self, bounds: BoundingBox, options: RectangleOptions, tooltip: Option<String>) -> MapObject {
        let style = PathStyle {
            color: options.color.unwrap_or_else(|| "blue".to_string()),
            weight: 1.0,
            fill_opacity: options.opacity.unwrap_or(0.8),
            ..PathStyle::default()
        };
        let object = MapObject::new(Shape::Rectangle { bounds, style });
        match tooltip {
            Some(text) => object.with_hover_content(BindKind::Tooltip, text),
            None => object,
        }
    }

    /// Region outlined by `ring`; the ring is closed implicitly
    pub fn create_polygon(&self, ring: Vec<LatLng>, style: PathStyle, tooltip: Option<String>) -> MapObject {
        let object = MapObject::new(Shape::Polygon { ring, style });
        match tooltip {
            Some(text) => object.with_hover_content(BindKind::Tooltip, text),
            None => object,
        }
    }

    pub fn create_geojson_layer(&self, data: GeoJson, style: Option<PathStyle>) -> MapObject {
        MapObject::new(Shape::GeoJson { data, style })
    }

    pub fn create_heat_layer(&self, points: Vec<Location>, options: HeatOptions) -> MapObject {
        MapObject::new(Shape::Heat { points, options })
    }

    pub fn create_cluster_layer(&self) -> MapObject {
        MapObject::new(Shape::Cluster {
            options: ClusterOptions::default(),
            members: Vec::new(),
        })
    }

    pub fn create_feature_layer(&self) -> MapObject {
        MapObject::new(Shape::FeatureGroup { members: Vec::new() })
    }

    // Layers

    /// Mount `object` under `id`, replacing whatever held that id
    pub fn add_layer(&mut self, object: MapObject, id: impl Into<String>) -> Result<LayerHandle, MapError> {
        self.layers.add(&mut self.surface, LayerDescriptor::with_id(id, object))
    }

    /// Mount `object` as one more instance of `kind`
    pub fn add_typed_layer(&mut self, object: MapObject, kind: impl Into<String>) -> Result<LayerHandle, MapError> {
        self.layers.add(&mut self.surface, LayerDescriptor::typed(kind, object))
    }

    /// Add a marker whose popup shows while hovered
    pub fn add_marker(
        &mut self,
        coords: LatLng,
        options: MarkerOptions,
        popup: Option<String>,
    ) -> Result<LayerHandle, MapError> {
        let object = MapObject::new(Shape::Marker { position: coords, options, info: None });
        let object = match popup {
            Some(text) => object.with_hover_content(BindKind::Popup, text),
            None => object,
        };
        self.add_typed_layer(object, MARKER_TYPE)
    }

    pub fn remove_markers(&mut self) -> usize {
        self.layers.remove_all_of_type(&mut self.surface, MARKER_TYPE)
    }

    /// Mount the single GeoJSON overlay and reflow the map
    pub fn add_geojson_layer(&mut self, data: GeoJson, style: Option<PathStyle>) -> Result<LayerHandle, MapError> {
        let object = self.create_geojson_layer(data, style);
        let handle = self.add_layer(object, GEOJSON_LAYER_ID)?;
        self.reflow();
        Ok(handle)
    }

    pub fn remove_geojson_layer(&mut self) -> bool {
        self.remove_layer_by_id(GEOJSON_LAYER_ID)
    }

    pub fn remove_layer<'a>(&mut self, reference: impl Into<LayerRef<'a>>) -> bool {
        self.layers.remove(&mut self.surface, reference.into())
    }

    pub fn remove_layer_by_id(&mut self, id: &str) -> bool {
        self.layers.remove_by_id(&mut self.surface, id)
    }

    pub fn remove_all_of_type(&mut self, kind: &str) -> usize {
        self.layers.remove_all_of_type(&mut self.surface, kind)
    }

    pub fn find_layer(&self, id: &str) -> Option<LayerHandle> {
        self.layers.find(id)
    }

    // Controls

    pub fn add_control(&mut self, control: MapControl, id: impl Into<String>) -> Result<LayerHandle, MapError> {
        self.controls.add(&mut self.surface, LayerDescriptor::with_id(id, control))
    }

    pub fn remove_control_by_id(&mut self, id: &str) -> bool {
        self.controls.remove_by_id(&mut self.surface, id)
    }

    pub fn remove_control(&mut self, handle: LayerHandle) -> bool {
        self.controls.remove_by_handle(&mut self.surface, handle)
    }

    // Interaction

    /// Deliver a pointer event to a mounted layer.
    ///
    /// Hover-bound content is shown or hidden first, then the matching
    /// handler is called with the layer's handle. Returns `false` for unknown
    /// handles.
    pub fn dispatch(&mut self, handle: LayerHandle, kind: LayerEventKind) -> bool {
        let Some(entry) = self.layers.get(handle) else {
            return false;
        };

        if entry.object.binding.as_ref().is_some_and(|b| b.open_on_hover) {
            match kind {
                LayerEventKind::MouseOver => self.surface.open_popup(handle),
                LayerEventKind::MouseOut => self.surface.close_popup(handle),
                LayerEventKind::Click => {}
            }
        }

        if let Some(callback) = entry.object.handlers.get(kind) {
            debug!("Dispatching {:?} to {}", kind, handle);
            callback(&LayerEvent { handle, kind });
        }
        true
    }

    // Viewport

    /// Recompute the surface size
    pub fn reflow(&mut self) {
        self.surface.invalidate_size();
    }

    pub fn fly_to(&mut self, coords: LatLng, zoom: Option<f64>) {
        self.surface.fly_to(coords, zoom);
    }

    pub fn fit_bounds(&mut self, bounds: BoundingBox) {
        self.surface.fit_bounds(bounds);
    }

    /// Extent of a GeoJSON object
    pub fn geojson_bounds(&self, data: &GeoJson) -> Result<BoundingBox, MapError> {
        geometry::geojson_bounds(data)
    }
}
