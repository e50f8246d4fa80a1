//! Shared, swappable access to preprocessed documents.
//!
//! Readers take a snapshot with [`SpecHandle::current`] and keep using it
//! for as long as they like. A reload builds a complete new [`Preprocessed`]
//! off to the side and swaps it in; a failed reload leaves the old one in
//! place.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::PreprocessError;
use crate::preprocessor::Preprocessed;

#[derive(Debug)]
pub struct SpecHandle {
    current: RwLock<Arc<Preprocessed>>,
}

impl SpecHandle {
    pub fn new(preprocessed: Preprocessed) -> Self {
        Self {
            current: RwLock::new(Arc::new(preprocessed)),
        }
    }

    /// Snapshot of the current documents.
    pub fn current(&self) -> Arc<Preprocessed> {
        self.current.read().clone()
    }

    /// Swap in `preprocessed`, returning the previous snapshot.
    pub fn replace(&self, preprocessed: Preprocessed) -> Arc<Preprocessed> {
        std::mem::replace(&mut *self.current.write(), Arc::new(preprocessed))
    }

    /// Rebuild with `build` and swap the result in on success.
    pub fn reload<F>(&self, build: F) -> Result<Arc<Preprocessed>, PreprocessError>
    where
        F: FnOnce() -> Result<Preprocessed, PreprocessError>,
    {
        let fresh = build()?;
        tracing::debug!(visited = fresh.stats.visited, "reloaded preprocessed documents");
        self.replace(fresh);
        Ok(self.current())
    }
}
