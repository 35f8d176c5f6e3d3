//! Load registry - the only shared mutable state of the layer
//!
//! Every mutation happens inside one lock scope and never spans an await, so
//! a feature is never both loaded and in flight once its load has settled.

use super::LoadOutcome;
use crate::detection::Feature;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A load attempt that any number of callers can await
pub type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;

#[derive(Default)]
struct RegistryState {
    loaded: HashSet<Feature>,
    in_flight: HashMap<Feature, SharedLoad>,
    /// Bumped by `reset` so attempts started before it cannot settle into
    /// the fresh state
    generation: u64,
}

/// What `claim` found for a feature
pub enum Claim {
    /// Already loaded this session
    Loaded,
    /// Another caller's attempt is running
    Join(SharedLoad),
    /// A new attempt was registered
    Started(SharedLoad),
}

/// Session-wide record of loaded and in-flight remediations
#[derive(Default)]
pub struct LoadRegistry {
    state: Mutex<RegistryState>,
}

impl LoadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the registry and, when nothing is known about `feature`,
    /// register the attempt built by `start`, under one lock
    pub fn claim<F>(&self, feature: Feature, start: F) -> Claim
    where
        F: FnOnce(u64) -> BoxFuture<'static, LoadOutcome>,
    {
        let mut state = self.lock();
        if state.loaded.contains(&feature) {
            return Claim::Loaded;
        }
        if let Some(shared) = state.in_flight.get(&feature) {
            return Claim::Join(shared.clone());
        }

        let shared = start(state.generation).shared();
        state.in_flight.insert(feature, shared.clone());
        Claim::Started(shared)
    }

    /// Record the end of an attempt: leave the in-flight set, and enter the
    /// loaded set on success
    pub fn settle(&self, feature: Feature, loaded: bool, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            log::debug!("{} settled after a reset, ignoring", feature);
            return;
        }
        state.in_flight.remove(&feature);
        if loaded {
            state.loaded.insert(feature);
        }
    }

    /// Forget everything (tests and single-page navigation)
    pub fn reset(&self) {
        let mut state = self.lock();
        state.loaded.clear();
        state.in_flight.clear();
        state.generation += 1;
    }

    pub fn is_loaded(&self, feature: Feature) -> bool {
        self.lock().loaded.contains(&feature)
    }

    pub fn is_in_flight(&self, feature: Feature) -> bool {
        self.lock().in_flight.contains_key(&feature)
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Loaded features, sorted
    pub fn loaded(&self) -> Vec<Feature> {
        let mut loaded: Vec<Feature> = self.lock().loaded.iter().copied().collect();
        loaded.sort();
        loaded
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
