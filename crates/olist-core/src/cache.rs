use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::pipeline::Dataset;

/// Holds the one materialized [`Dataset`] for the lifetime of the owner.
///
/// The lock is held across the load, so concurrent first callers block until the winner
/// publishes and then share its `Arc`. A failed load publishes nothing.
#[derive(Debug, Default)]
pub struct PipelineCache {
    slot: Mutex<Option<Arc<Dataset>>>,
    loads: AtomicUsize,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce() -> Result<Dataset>,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = slot.as_ref() {
            debug!("serving cached dataset");
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(load()?);
        self.loads.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn get(&self) -> Option<Arc<Dataset>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_populated(&self) -> bool {
        self.get().is_some()
    }

    /// Drops the cached dataset; the next request runs the pipeline again.
    pub fn reset(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of successful loads since construction.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}
