//! Bookkeeping for everything mounted on the surface
//!
//! A registry entry exists exactly while its object is mounted: every add
//! mounts before registering and every removal unmounts before the entry is
//! dropped.

use tracing::debug;

use crate::layer::{LayerDescriptor, LayerHandle, LayerKey, LayerRef, MapControl, MapObject};
use crate::surface::MapSurface;
use crate::MapError;

/// Something a registry can put on and take off a surface
pub trait Mountable {
    fn mount<S: MapSurface + ?Sized>(&self, surface: &mut S, handle: LayerHandle) -> anyhow::Result<()>;
    fn unmount<S: MapSurface + ?Sized>(surface: &mut S, handle: LayerHandle);
}

impl Mountable for MapObject {
    fn mount<S: MapSurface + ?Sized>(&self, surface: &mut S, handle: LayerHandle) -> anyhow::Result<()> {
        surface.mount_layer(handle, self)
    }

    fn unmount<S: MapSurface + ?Sized>(surface: &mut S, handle: LayerHandle) {
        surface.unmount_layer(handle);
    }
}

impl Mountable for MapControl {
    fn mount<S: MapSurface + ?Sized>(&self, surface: &mut S, handle: LayerHandle) -> anyhow::Result<()> {
        surface.mount_control(handle, self)
    }

    fn unmount<S: MapSurface + ?Sized>(surface: &mut S, handle: LayerHandle) {
        surface.unmount_control(handle);
    }
}

/// A registered, mounted object
#[derive(Debug, Clone)]
pub struct RegistryEntry<T> {
    pub key: LayerKey,
    pub handle: LayerHandle,
    pub object: T,
}

/// Ordered registry of mounted objects
#[derive(Debug)]
pub struct Registry<T> {
    entries: Vec<RegistryEntry<T>>,
}

/// Data layers
pub type LayerRegistry = Registry<MapObject>;

/// Map controls, kept apart so their ids never collide with layer ids
pub type ControlRegistry = Registry<MapControl>;

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Mountable> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount and register an object.
    ///
    /// An id-keyed descriptor first unmounts and drops any entry with the same
    /// id. Type-keyed descriptors are always appended.
    pub fn add<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        descriptor: LayerDescriptor<T>,
    ) -> Result<LayerHandle, MapError> {
        if let LayerKey::Id(id) = &descriptor.key {
            if self.remove_by_id(surface, id) {
                debug!("Replaced layer '{}'", id);
            }
        }

        let handle = LayerHandle::new();
        descriptor
            .object
            .mount(surface, handle)
            .map_err(|e| MapError::Surface(e.to_string()))?;

        debug!("Mounted {:?} as {}", descriptor.key, handle);
        self.entries.push(RegistryEntry {
            key: descriptor.key,
            handle,
            object: descriptor.object,
        });
        Ok(handle)
    }

    /// Remove by handle or by id; unknown references are a no-op
    pub fn remove<S: MapSurface + ?Sized>(&mut self, surface: &mut S, reference: LayerRef<'_>) -> bool {
        match reference {
            LayerRef::Handle(handle) => self.remove_by_handle(surface, handle),
            LayerRef::Id(id) => self.remove_by_id(surface, id),
        }
    }

    pub fn remove_by_handle<S: MapSurface + ?Sized>(&mut self, surface: &mut S, handle: LayerHandle) -> bool {
        self.remove_where(surface, |entry| entry.handle == handle)
    }

    pub fn remove_by_id<S: MapSurface + ?Sized>(&mut self, surface: &mut S, id: &str) -> bool {
        self.remove_where(surface, |entry| entry.key.is_id(id))
    }

    /// Unmount every entry of `kind`; the rest keep their relative order
    pub fn remove_all_of_type<S: MapSurface + ?Sized>(&mut self, surface: &mut S, kind: &str) -> usize {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.key.is_type(kind));

        for entry in &removed {
            T::unmount(surface, entry.handle);
        }
        self.entries = kept;

        debug!("Removed {} '{}' entries", removed.len(), kind);
        removed.len()
    }

    fn remove_where<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        predicate: impl Fn(&RegistryEntry<T>) -> bool,
    ) -> bool {
        match self.entries.iter().position(predicate) {
            Some(pos) => {
                T::unmount(surface, self.entries[pos].handle);
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl<T> Registry<T> {
    /// Handle of the entry registered under `id`
    pub fn find(&self, id: &str) -> Option<LayerHandle> {
        self.entries.iter().find(|e| e.key.is_id(id)).map(|e| e.handle)
    }

    pub fn get(&self, handle: LayerHandle) -> Option<&RegistryEntry<T>> {
        self.entries.iter().find(|e| e.handle == handle)
    }

    pub fn entries(&self) -> &[RegistryEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries registered under type `kind`
    pub fn count_of_type(&self, kind: &str) -> usize {
        self.entries.iter().filter(|e| e.key.is_type(kind)).count()
    }
}
