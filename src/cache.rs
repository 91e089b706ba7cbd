//! Session-lifetime cache of run step lists
//!
//! Read-through: the aggregator fills an entry on the first successful fetch and
//! reuses it on every later export in the same session without revalidating.
//! Failed fetches are never stored. Concurrent population of the same run is
//! last-writer-wins; step lists are immutable once fetched, so either write is
//! correct.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::Action;

/// Cheaply cloneable handle to a shared run id → steps map
#[derive(Clone, Debug, Default)]
pub struct ActionCache {
    entries: Arc<RwLock<HashMap<String, Arc<Vec<Action>>>>>,
}

impl ActionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached steps of a run, if present
    pub async fn get(&self, run_id: &str) -> Option<Arc<Vec<Action>>> {
        self.entries.read().await.get(run_id).cloned()
    }

    /// Store the steps of a run, replacing any previous entry
    pub async fn insert(&self, run_id: impl Into<String>, actions: Vec<Action>) -> Arc<Vec<Action>> {
        let actions = Arc::new(actions);
        self.entries
            .write()
            .await
            .insert(run_id.into(), Arc::clone(&actions));
        actions
    }

    /// Drop one run's entry so the next export fetches it again
    ///
    /// Returns whether an entry was present.
    pub async fn invalidate(&self, run_id: &str) -> bool {
        self.entries.write().await.remove(run_id).is_some()
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached runs
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no runs
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
