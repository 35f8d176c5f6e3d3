//! Feature Detector
//!
//! Classifies the browser identity and aggregates probe results into a
//! [`RuntimeProfile`]. The profile is computed once per session and cached
//! until [`FeatureDetector::invalidate`] is called.

mod feature;
mod profile;
pub mod user_agent;

pub use feature::{Feature, FeatureKind};
pub use profile::{BrowserFamily, RuntimeProfile, baseline, is_baseline};

use crate::environment::{Environment, EnvironmentProber};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Memoizing feature detector
pub struct FeatureDetector {
    env: Arc<dyn Environment>,
    prober: EnvironmentProber,
    cached: RwLock<Option<Arc<RuntimeProfile>>>,
}

impl FeatureDetector {
    pub fn new(env: Arc<dyn Environment>) -> Self {
        let prober = EnvironmentProber::new(Arc::clone(&env));
        Self {
            env,
            prober,
            cached: RwLock::new(None),
        }
    }

    /// Profile for this session, computing it on first use
    pub fn detect(&self) -> Arc<RuntimeProfile> {
        if let Some(profile) = self.cached.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Arc::clone(profile);
        }

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have computed it between the two locks
        if let Some(profile) = cached.as_ref() {
            return Arc::clone(profile);
        }

        let profile = Arc::new(self.compute());
        *cached = Some(Arc::clone(&profile));
        profile
    }

    /// Drop the cached profile; the next `detect` probes again
    pub fn invalidate(&self) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a profile is currently cached
    pub fn is_cached(&self) -> bool {
        self.cached.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn compute(&self) -> RuntimeProfile {
        if !self.env.document_available() {
            log::info!("no document available, assuming a modern environment");
            return RuntimeProfile::assume_modern();
        }

        let (family, version) = user_agent::classify(&self.env.identify());

        // The only place probes run: each one at most once per computation
        let features: BTreeMap<Feature, bool> = Feature::all()
            .iter()
            .map(|feature| (*feature, self.prober.check(&feature.probe())))
            .collect();

        let profile = RuntimeProfile::new(family, version, features);
        log::info!(
            "detected {} {} (baseline: {}, missing: {})",
            family.as_str(),
            version,
            profile.is_baseline_supported,
            profile.missing_features().len()
        );
        profile
    }
}
