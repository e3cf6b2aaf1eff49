//! Rendering surface abstraction
//!
//! The facade talks to the actual map widget only through [`MapSurface`].

use serde::Serialize;

use crate::geometry::{BoundingBox, LatLng};
use crate::layer::{LayerHandle, MapControl, MapObject, Shape};

/// Trait for rendering surfaces
pub trait MapSurface: Send {
    /// Set the initial view
    fn set_view(&mut self, center: LatLng, zoom: f64);

    /// Draw an object; it stays visible until unmounted
    fn mount_layer(&mut self, handle: LayerHandle, object: &MapObject) -> anyhow::Result<()>;

    /// Remove a previously mounted object
    fn unmount_layer(&mut self, handle: LayerHandle);

    /// Add a control to the map frame
    fn mount_control(&mut self, handle: LayerHandle, control: &MapControl) -> anyhow::Result<()>;

    /// Remove a control from the map frame
    fn unmount_control(&mut self, handle: LayerHandle);

    /// Show the popup or tooltip bound to a mounted object
    fn open_popup(&mut self, handle: LayerHandle);

    /// Hide the popup or tooltip bound to a mounted object
    fn close_popup(&mut self, handle: LayerHandle);

    /// Animate the view to a location
    fn fly_to(&mut self, center: LatLng, zoom: Option<f64>);

    /// Fit the view to an extent
    fn fit_bounds(&mut self, bounds: BoundingBox);

    /// Recompute the surface size after its container changed
    fn invalidate_size(&mut self);
}

/// One call received by a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum SurfaceOp {
    SetView { center: LatLng, zoom: f64 },
    MountLayer { handle: LayerHandle, kind: &'static str },
    UnmountLayer { handle: LayerHandle },
    MountControl { handle: LayerHandle },
    UnmountControl { handle: LayerHandle },
    OpenPopup { handle: LayerHandle },
    ClosePopup { handle: LayerHandle },
    FlyTo { center: LatLng, zoom: Option<f64> },
    FitBounds { bounds: BoundingBox },
    InvalidateSize,
}

/// Headless surface that keeps what is mounted and logs every call
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
    layers: Vec<(LayerHandle, Shape)>,
    controls: Vec<(LayerHandle, MapControl)>,
    reject_mounts: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent mount fail
    pub fn reject_mounts(&mut self, reject: bool) {
        self.reject_mounts = reject;
    }

    /// Every call in order
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Currently mounted layers in mount order
    pub fn mounted_layers(&self) -> &[(LayerHandle, Shape)] {
        &self.layers
    }

    pub fn mounted_controls(&self) -> &[(LayerHandle, MapControl)] {
        &self.controls
    }

    pub fn is_mounted(&self, handle: LayerHandle) -> bool {
        self.layers.iter().any(|(h, _)| *h == handle)
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.ops.iter().filter(|op| predicate(op)).count()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl MapSurface for RecordingSurface {
    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.ops.push(SurfaceOp::SetView { center, zoom });
    }

    fn mount_layer(&mut self, handle: LayerHandle, object: &MapObject) -> anyhow::Result<()> {
        if self.reject_mounts {
            anyhow::bail!("surface rejected {} layer", object.kind());
        }
        self.ops.push(SurfaceOp::MountLayer { handle, kind: object.kind() });
        self.layers.push((handle, object.shape.clone()));
        Ok(())
    }

    fn unmount_layer(&mut self, handle: LayerHandle) {
        self.ops.push(SurfaceOp::UnmountLayer { handle });
        self.layers.retain(|(h, _)| *h != handle);
    }

    fn mount_control(&mut self, handle: LayerHandle, control: &MapControl) -> anyhow::Result<()> {
        if self.reject_mounts {
            anyhow::bail!("surface rejected control");
        }
        self.ops.push(SurfaceOp::MountControl { handle });
        self.controls.push((handle, control.clone()));
        Ok(())
    }

    fn unmount_control(&mut self, handle: LayerHandle) {
        self.ops.push(SurfaceOp::UnmountControl { handle });
        self.controls.retain(|(h, _)| *h != handle);
    }

    fn open_popup(&mut self, handle: LayerHandle) {
        self.ops.push(SurfaceOp::OpenPopup { handle });
    }

    fn close_popup(&mut self, handle: LayerHandle) {
        self.ops.push(SurfaceOp::ClosePopup { handle });
    }

    fn fly_to(&mut self, center: LatLng, zoom: Option<f64>) {
        self.ops.push(SurfaceOp::FlyTo { center, zoom });
    }

    fn fit_bounds(&mut self, bounds: BoundingBox) {
        self.ops.push(SurfaceOp::FitBounds { bounds });
    }

    fn invalidate_size(&mut self) {
        self.ops.push(SurfaceOp::InvalidateSize);
    }
}
