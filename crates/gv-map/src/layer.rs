//! Visual objects mounted on the map and the identities they are tracked by

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use gv_core::Location;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{BoundingBox, LatLng};
use crate::MapError;

/// Opaque token for a mounted object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerHandle(Uuid);

impl LayerHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a registry entry is identified
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "key", content = "value", rename_all = "lowercase")]
pub enum LayerKey {
    /// Multi-instance, e.g. every marker is of type "marker"
    Type(String),
    /// Single instance per id; adding the same id replaces the old entry
    Id(String),
}

impl LayerKey {
    pub fn is_type(&self, kind: &str) -> bool {
        matches!(self, LayerKey::Type(t) if t == kind)
    }

    pub fn is_id(&self, id: &str) -> bool {
        matches!(self, LayerKey::Id(i) if i == id)
    }
}

/// Reference accepted by removal operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRef<'a> {
    Handle(LayerHandle),
    Id(&'a str),
}

impl From<LayerHandle> for LayerRef<'_> {
    fn from(handle: LayerHandle) -> Self {
        LayerRef::Handle(handle)
    }
}

impl<'a> From<&'a str> for LayerRef<'a> {
    fn from(id: &'a str) -> Self {
        LayerRef::Id(id)
    }
}

/// Stroke and fill parameters for vector shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
    /// Radius in metres for circles, pixels for circle markers
    pub radius: Option<f64>,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: "#3388ff".to_string(),
            weight: 3.0,
            opacity: 1.0,
            fill_opacity: 0.2,
            radius: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerOptions {
    pub title: Option<String>,
    pub opacity: Option<f64>,
    pub draggable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeatOptions {
    pub radius: f64,
    pub blur: f64,
    pub max: f64,
}

impl Default for HeatOptions {
    fn default() -> Self {
        Self {
            radius: gv_core::config::DEFAULT_RADIUS,
            blur: gv_core::config::DEFAULT_BLUR,
            max: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOptions {
    pub spiderfy_on_max_zoom: bool,
    pub show_coverage_on_hover: bool,
    pub zoom_to_bounds_on_click: bool,
    pub animate: bool,
    pub disable_clustering_at_zoom: u8,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            spiderfy_on_max_zoom: false,
            show_coverage_on_hover: true,
            zoom_to_bounds_on_click: true,
            animate: false,
            disable_clustering_at_zoom: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileOptions {
    pub min_zoom: f64,
    pub attribution: bool,
}

/// Primitive shape kinds the rendering surface knows how to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Shape {
    Marker { position: LatLng, options: MarkerOptions, info: Option<serde_json::Value> },
    CircleMarker { center: LatLng, style: PathStyle },
    Circle { center: LatLng, style: PathStyle },
    Rectangle { bounds: BoundingBox, style: PathStyle },
    Polygon { ring: Vec<LatLng>, style: PathStyle },
    GeoJson { data: geojson::GeoJson, style: Option<PathStyle> },
    Heat { points: Vec<Location>, options: HeatOptions },
    Cluster { options: ClusterOptions, members: Vec<Shape> },
    FeatureGroup { members: Vec<Shape> },
    Tile { url: String, options: TileOptions },
}

impl Shape {
    /// Short name of the shape kind
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Marker { .. } => "marker",
            Shape::CircleMarker { .. } => "circleMarker",
            Shape::Circle { .. } => "circle",
            Shape::Rectangle { .. } => "rectangle",
            Shape::Polygon { .. } => "polygon",
            Shape::GeoJson { .. } => "geojson",
            Shape::Heat { .. } => "heat",
            Shape::Cluster { .. } => "cluster",
            Shape::FeatureGroup { .. } => "featureGroup",
            Shape::Tile { .. } => "tile",
        }
    }
}

/// Whether bound content is a popup or a tooltip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindKind {
    Popup,
    Tooltip,
}

impl FromStr for BindKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popup" => Ok(BindKind::Popup),
            "tooltip" => Ok(BindKind::Tooltip),
            other => Err(MapError::UnknownBindType(other.to_string())),
        }
    }
}

/// Popup/tooltip descriptor supplied by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupContent {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: BindKind,
    pub position: Option<String>,
}

impl PopupContent {
    /// Build a descriptor from a textual bind type
    pub fn new(text: impl Into<String>, kind: &str) -> Result<Self, MapError> {
        Ok(Self {
            text: text.into(),
            kind: kind.parse()?,
            position: None,
        })
    }

    /// Parse a descriptor such as `{"text": "...", "type": "popup"}`
    pub fn from_json(value: serde_json::Value) -> Result<Self, MapError> {
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();
        kind.parse::<BindKind>()?;
        serde_json::from_value(value).map_err(|e| MapError::InvalidDescriptor(e.to_string()))
    }
}

/// Content bound to a mounted object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupBinding {
    pub kind: BindKind,
    pub text: String,
    pub close_button: bool,
    pub position: String,
    /// Show on mouseover, hide on mouseout
    pub open_on_hover: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerEventKind {
    Click,
    MouseOver,
    MouseOut,
}

/// Interaction on a mounted object, carrying its handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerEvent {
    pub handle: LayerHandle,
    pub kind: LayerEventKind,
}

pub type LayerCallback = Arc<dyn Fn(&LayerEvent) + Send + Sync>;

/// Optional interaction callbacks
#[derive(Clone, Default)]
pub struct HoverHandlers {
    pub click: Option<LayerCallback>,
    pub mouseover: Option<LayerCallback>,
    pub mouseout: Option<LayerCallback>,
}

impl HoverHandlers {
    pub fn get(&self, kind: LayerEventKind) -> Option<&LayerCallback> {
        match kind {
            LayerEventKind::Click => self.click.as_ref(),
            LayerEventKind::MouseOver => self.mouseover.as_ref(),
            LayerEventKind::MouseOut => self.mouseout.as_ref(),
        }
    }
}

impl fmt::Debug for HoverHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoverHandlers")
            .field("click", &self.click.is_some())
            .field("mouseover", &self.mouseover.is_some())
            .field("mouseout", &self.mouseout.is_some())
            .finish()
    }
}

/// A shape plus its bound content and interaction handlers
#[derive(Debug, Clone)]
pub struct MapObject {
    pub shape: Shape,
    pub binding: Option<PopupBinding>,
    pub handlers: HoverHandlers,
}

impl MapObject {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            binding: None,
            handlers: HoverHandlers::default(),
        }
    }

    pub fn with_binding(mut self, binding: PopupBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn with_handlers(mut self, handlers: HoverHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Bind `text` so that it shows while the pointer is over the object
    pub fn with_hover_content(self, kind: BindKind, text: impl Into<String>) -> Self {
        self.with_binding(PopupBinding {
            kind,
            text: text.into(),
            close_button: false,
            position: "top".to_string(),
            open_on_hover: true,
        })
    }

    pub fn kind(&self) -> &'static str {
        self.shape.kind()
    }
}

/// Request to register an object under a key
#[derive(Debug, Clone)]
pub struct LayerDescriptor<T> {
    pub key: LayerKey,
    pub object: T,
}

impl<T> LayerDescriptor<T> {
    /// Multi-instance entry
    pub fn typed(kind: impl Into<String>, object: T) -> Self {
        Self { key: LayerKey::Type(kind.into()), object }
    }

    /// Single-instance entry
    pub fn with_id(id: impl Into<String>, object: T) -> Self {
        Self { key: LayerKey::Id(id.into()), object }
    }
}

/// Position of a control on the map frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlPosition {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ControlKind {
    Zoom,
    Scale,
    Legend { html: String },
    Custom { name: String, options: serde_json::Value },
}

/// A UI affordance mounted on the map frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapControl {
    pub kind: ControlKind,
    pub position: ControlPosition,
}

impl MapControl {
    pub fn new(kind: ControlKind, position: ControlPosition) -> Self {
        Self { kind, position }
    }
}
