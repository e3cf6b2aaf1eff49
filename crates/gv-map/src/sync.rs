//! Keeps the map in step with the state store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use gv_core::events::{events, handler_from_fn};
use gv_core::{EventBus, VisualizationStore};

use crate::facade::MapFacade;
use crate::layer::HeatOptions;
use crate::surface::MapSurface;
use crate::MapError;

/// Registry id of the heat layer
pub const HEAT_LAYER_ID: &str = "heatmap";

/// What a synchronisation pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub heat_points: usize,
    pub heat_mounted: bool,
    pub base_tile_changed: bool,
}

/// Mount the store's locations as the heat layer, or remove it when there are none.
///
/// Points whose coordinates or magnitude are not finite are left out of the
/// layer, so every mounted magnitude lies in `[0, 1]`.
/// Returns the number of points mounted.
pub fn sync_heat_layer<S: MapSurface>(
    store: &VisualizationStore,
    map: &mut MapFacade<S>,
) -> Result<usize, MapError> {
    let points: Vec<_> = store
        .get_locations()
        .into_iter()
        .filter(|l| l.latitude.is_finite() && l.longitude.is_finite())
        .filter(|l| l.magnitude.map_or(true, f64::is_finite))
        .collect();

    if points.is_empty() {
        if map.remove_layer_by_id(HEAT_LAYER_ID) {
            debug!("Removed heat layer, no locations");
        }
        return Ok(0);
    }

    let count = points.len();
    let options = HeatOptions {
        radius: store.radius(),
        blur: store.blur(),
        ..HeatOptions::default()
    };
    let layer = map.create_heat_layer(points, options);
    map.add_layer(layer, HEAT_LAYER_ID)?;
    debug!("Heat layer mounted with {} points", count);
    Ok(count)
}

/// Swap the base tile if the store's URL differs from the mounted one
pub fn sync_base_tile<S: MapSurface>(store: &VisualizationStore, map: &mut MapFacade<S>) -> Result<bool, MapError> {
    let url = store.tile_source_url();
    if url == map.base_tile_url() {
        return Ok(false);
    }
    map.change_base_tile(url)?;
    Ok(true)
}

pub fn sync_all<S: MapSurface>(store: &VisualizationStore, map: &mut MapFacade<S>) -> Result<SyncReport, MapError> {
    let base_tile_changed = sync_base_tile(store, map)?;
    let heat_points = sync_heat_layer(store, map)?;
    let report = SyncReport {
        heat_points,
        heat_mounted: map.find_layer(HEAT_LAYER_ID).is_some(),
        base_tile_changed,
    };
    info!("Map synchronised: {:?}", report);
    Ok(report)
}

/// Marks the map stale whenever the store commits a dataset or a field changes
#[derive(Debug, Clone)]
pub struct SyncTracker {
    dirty: Arc<AtomicBool>,
}

impl SyncTracker {
    /// Subscribe to `bus`; the tracker starts out dirty
    pub fn attach(bus: &EventBus) -> Self {
        let dirty = Arc::new(AtomicBool::new(true));

        let flag = dirty.clone();
        bus.subscribe::<events::DatasetCommitted>(handler_from_fn(move |_| flag.store(true, Ordering::SeqCst)));
        let flag = dirty.clone();
        bus.subscribe::<events::FieldChanged>(handler_from_fn(move |_| flag.store(true, Ordering::SeqCst)));

        Self { dirty }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Run [`sync_all`] if anything changed since the last pass
    pub fn sync_if_dirty<S: MapSurface>(
        &self,
        store: &VisualizationStore,
        map: &mut MapFacade<S>,
    ) -> Result<Option<SyncReport>, MapError> {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        sync_all(store, map).map(Some).map_err(|e| {
            self.dirty.store(true, Ordering::SeqCst);
            e
        })
    }
}
