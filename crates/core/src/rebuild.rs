//! Tracks which corpus roots have a rebuild in flight, so a host can ignore
//! a second request for the same root instead of interleaving two builds.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
pub struct RebuildRegistry {
    in_flight: Mutex<HashSet<PathBuf>>,
}

/// Held for the duration of one rebuild; releases the root on drop.
pub struct RebuildGuard<'r> {
    registry: &'r RebuildRegistry,
    root: PathBuf,
}

impl RebuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `root`, or `None` when a rebuild for it is already running.
    pub fn try_begin(&self, root: &Path) -> Option<RebuildGuard<'_>> {
        let mut in_flight = self.in_flight.lock().expect("lock poisoned");
        if !in_flight.insert(root.to_path_buf()) {
            tracing::info!(root = %root.display(), "rebuild already in flight; request ignored");
            return None;
        }
        Some(RebuildGuard {
            registry: self,
            root: root.to_path_buf(),
        })
    }
}

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.registry.in_flight.lock() {
            in_flight.remove(&self.root);
        }
    }
}
