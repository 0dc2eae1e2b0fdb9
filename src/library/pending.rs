//! Registry of in-flight load-or-generate requests.
//!
//! Two callers asking for the same catalog or page before either has finished
//! would otherwise both miss the store, both call the generator, and the later
//! write would silently replace content the first caller already handed out.
//! Callers take the key's lock before consulting the store; a second caller
//! waits, then re-reads the store and finds the committed value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::library::errors::LibraryError;

type Slot = Arc<AsyncMutex<()>>;

#[derive(Default)]
pub struct PendingRegistry {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other caller holds `key`, then hold it until the guard drops.
    pub async fn acquire(&self, key: &str) -> Result<PendingGuard, LibraryError> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| LibraryError::Internal("pending registry lock poisoned".into()))?;
            slots.entry(key.to_string()).or_default().clone()
        };
        if slot.try_lock().is_err() {
            debug!("Waiting for in-flight request on {}", key);
        }
        let guard = slot.lock_owned().await;
        Ok(PendingGuard {
            key: key.to_string(),
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        })
    }

    /// Keys currently held or waited on.
    pub fn in_flight(&self) -> Result<usize, LibraryError> {
        self.slots
            .lock()
            .map(|slots| slots.len())
            .map_err(|_| LibraryError::Internal("pending registry lock poisoned".into()))
    }
}

/// Holds a key of the [`PendingRegistry`]; releases it on drop.
pub struct PendingGuard {
    key: String,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        if let Ok(mut slots) = self.slots.lock() {
            // Only the map's own handle left means nobody is waiting.
            let idle = slots
                .get(&self.key)
                .map(|slot| Arc::strong_count(slot) == 1)
                .unwrap_or(false);
            if idle {
                slots.remove(&self.key);
            }
        }
    }
}
