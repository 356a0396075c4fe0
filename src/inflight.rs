//! Per-entity "request outstanding" tracking.
//!
//! A toggle handler asks for a token before issuing its store call; while the
//! token is alive a second request for the same id is refused. Other ids are
//! unaffected. The token releases its id when dropped, including on error.

use std::{
    collections::HashSet,
    fmt::Debug,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard},
};

pub struct InFlight<K: Eq + Hash + Clone> {
    ids: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash + Clone> Clone for InFlight<K> {
    fn clone(&self) -> Self {
        Self {
            ids: Arc::clone(&self.ids),
        }
    }
}

impl<K: Eq + Hash + Clone> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            ids: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl<K: Eq + Hash + Clone + Debug> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<K>> {
        match self.ids.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Claim `id`, or `None` if a request for it is already outstanding.
    pub fn try_begin(&self, id: K) -> Option<InFlightToken<K>> {
        if !self.lock().insert(id.clone()) {
            return None;
        }
        Some(InFlightToken {
            ids: Arc::clone(&self.ids),
            id,
        })
    }

    pub fn contains(&self, id: &K) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[must_use = "the id is released as soon as the token is dropped"]
#[derive(Debug)]
pub struct InFlightToken<K: Eq + Hash> {
    ids: Arc<Mutex<HashSet<K>>>,
    id: K,
}

impl<K: Eq + Hash> InFlightToken<K> {
    pub fn id(&self) -> &K {
        &self.id
    }
}

impl<K: Eq + Hash> Drop for InFlightToken<K> {
    fn drop(&mut self) {
        let mut guard = match self.ids.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.remove(&self.id);
    }
}

/// The guards a dashboard session hands to its toggle handlers, one set per
/// toggle action.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    /// Milestone status rotation.
    pub milestones: InFlight<i64>,
    /// Milestone review flag.
    pub reviews: InFlight<i64>,
    pub schedules: InFlight<i64>,
    pub tasks: InFlight<i64>,
}
