//! The live layer store, swapped atomically on reload.

use arc_swap::ArcSwap;
use hearth_config::LayerStore;
use hearth_core::{EffectiveConfiguration, ResolutionContext};
use std::sync::Arc;

/// A cheaply clonable handle to the store currently in service.
///
/// Readers take a snapshot and keep using it for the whole request, so a
/// reload that lands mid-resolution never mixes old and new layers.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<ArcSwap<LayerStore>>,
}

impl SharedStore {
    pub fn new(store: LayerStore) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(store)),
        }
    }

    /// The store currently in service.
    pub fn snapshot(&self) -> Arc<LayerStore> {
        self.inner.load_full()
    }

    /// Put a new store in service. In-flight snapshots keep the old one.
    pub fn replace(&self, store: LayerStore) {
        self.inner.store(Arc::new(store));
    }

    /// Resolve against a single snapshot.
    pub fn resolve(&self, ctx: &ResolutionContext) -> EffectiveConfiguration {
        let store = self.inner.load();
        hearth_resolver::resolve(&store, ctx)
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new(LayerStore::default())
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("summary", &self.inner.load().summary())
            .finish()
    }
}
