//! # compatkit - Adaptive Browser Compatibility Layer
//!
//! Detects what the running page supports, loads remote polyfills with local
//! fallbacks for whatever is missing, and packs fallback payloads into
//! size-budgeted delivery bundles.
//!
//! ## Architecture
//!
//! The layer is organized into the following core modules:
//!
//! - **environment**: Injected host capabilities and the Environment Prober
//! - **detection**: Browser classification and the memoized runtime profile
//! - **catalog**: Remediation descriptors for scripts and styles
//! - **orchestrator**: Deduplicated remote loading with verified fallbacks
//! - **bundle**: Tiered, size-budgeted delivery bundles
//! - **config**: JSON configuration and per-feature overrides
//! - **utils**: Shared utilities and error types

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod detection;
pub mod environment;
pub mod orchestrator;
pub mod utils;

// Re-export main types for convenience
pub use bundle::{BundleOptimizer, Delivery, DeliveryBundle};
pub use catalog::{PriorityTier, RemediationCatalog, RemediationDescriptor};
pub use config::CompatConfig;
pub use detection::{BrowserFamily, Feature, FeatureDetector, RuntimeProfile};
pub use environment::{Environment, SimulatedEnvironment};
pub use orchestrator::{LoadOutcome, LoadRegistry, PolyfillOrchestrator};
pub use utils::error::{CompatError, Result};

use std::sync::Arc;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "compatkit";

/// Entry point for a page bootstrap
///
/// Owns one detector, one catalog and one load registry per page session.
pub struct CompatibilityLayer {
    detector: FeatureDetector,
    catalog: RemediationCatalog,
    orchestrator: PolyfillOrchestrator,
    optimizer: BundleOptimizer,
    max_bundle_size_bytes: u64,
}

impl CompatibilityLayer {
    /// Build the layer over a host environment
    pub fn new(env: Arc<dyn Environment>, config: &CompatConfig) -> Result<Self> {
        config.validate()?;

        let catalog = RemediationCatalog::from_config(config)?;
        let optimizer = BundleOptimizer::from_config(config)?;
        let orchestrator = PolyfillOrchestrator::new(Arc::clone(&env), Arc::new(LoadRegistry::new()))
            .with_timeout(config.remote_timeout());

        log::debug!(
            "{} v{}: {} script and {} style remediations",
            NAME,
            VERSION,
            catalog.scripts().len(),
            catalog.styles().len()
        );

        Ok(Self {
            detector: FeatureDetector::new(env),
            catalog,
            orchestrator,
            optimizer,
            max_bundle_size_bytes: config.max_bundle_size_bytes,
        })
    }

    /// Layer with the default configuration
    pub fn with_defaults(env: Arc<dyn Environment>) -> Result<Self> {
        Self::new(env, &CompatConfig::default())
    }

    /// Profile for this session, computed on first use
    pub fn detect_environment(&self) -> Arc<RuntimeProfile> {
        self.detector.detect()
    }

    /// Discard the cached profile and probe again
    pub fn redetect_environment(&self) -> Arc<RuntimeProfile> {
        self.detector.invalidate();
        self.detector.detect()
    }

    /// Every remediation the profile needs, scripts first
    pub fn resolve_required(&self, profile: &RuntimeProfile) -> Vec<RemediationDescriptor> {
        self.catalog.resolve_required(profile)
    }

    /// Load the remediations the profile needs
    ///
    /// Uses the detected profile unless one is given. Returns one outcome per
    /// required remediation; failures are reported, never raised.
    pub async fn load_required_polyfills(&self, profile_override: Option<&RuntimeProfile>) -> Vec<LoadOutcome> {
        let required = match profile_override {
            Some(profile) => self.catalog.resolve_required(profile),
            None => self.catalog.resolve_required(&self.detect_environment()),
        };
        if required.is_empty() {
            return Vec::new();
        }

        let outcomes = self.orchestrator.load(&required).await;
        let failed = outcomes.iter().filter(|o| !o.loaded).count();
        if failed > 0 {
            log::warn!("{} of {} remediations failed to load", failed, outcomes.len());
        }
        outcomes
    }

    /// Style bundles for the profile's missing features
    pub fn get_css_bundles_for(&self, profile: &RuntimeProfile) -> Vec<DeliveryBundle> {
        self.optimizer
            .build_bundles(&self.catalog.resolve_styles(profile), self.max_bundle_size_bytes)
    }

    /// Script bundles for the profile's missing features
    pub fn get_js_bundles_for(&self, profile: &RuntimeProfile) -> Vec<DeliveryBundle> {
        self.optimizer
            .build_bundles(&self.catalog.resolve_scripts(profile), self.max_bundle_size_bytes)
    }

    /// Forget every loaded and in-flight remediation
    pub fn reset_compatibility_state(&self) {
        self.orchestrator.registry().reset();
    }

    pub fn catalog(&self) -> &RemediationCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<LoadRegistry> {
        self.orchestrator.registry()
    }

    pub fn max_bundle_size_bytes(&self) -> u64 {
        self.max_bundle_size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RemoteBehavior;

    const OLD_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.102 Safari/537.36";

    fn modern_features() -> Vec<Feature> {
        Feature::all().to_vec()
    }

    #[test]
    fn test_detect_is_cached() {
        let env = SimulatedEnvironment::new(OLD_CHROME).supporting(&modern_features());
        let layer = CompatibilityLayer::with_defaults(Arc::new(env)).unwrap();

        let first = layer.detect_environment();
        let second = layer.detect_environment();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.browser_family, BrowserFamily::Chromium);
        assert_eq!(first.version, 70);
        assert!(!first.is_baseline_supported);

        let third = layer.redetect_environment();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_modern_page_loads_nothing() {
        let env = SimulatedEnvironment::new(OLD_CHROME).supporting(&modern_features());
        let layer = CompatibilityLayer::with_defaults(Arc::new(env.clone())).unwrap();

        assert!(layer.load_required_polyfills(None).await.is_empty());
        assert_eq!(env.total_injections(), 0);
    }

    #[tokio::test]
    async fn test_detected_gaps_are_loaded() {
        let supported: Vec<Feature> = Feature::all()
            .iter()
            .copied()
            .filter(|f| *f != Feature::Fetch)
            .collect();
        let env = SimulatedEnvironment::new(OLD_CHROME).supporting(&supported);
        let layer = CompatibilityLayer::with_defaults(Arc::new(env.clone())).unwrap();

        let url = layer.catalog().descriptor(Feature::Fetch).unwrap().remote_url.clone();
        let env = env.with_remote(&url, RemoteBehavior::Serve(vec!["fetch".to_string()]));

        let outcomes = layer.load_required_polyfills(None).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].loaded);
        assert!(!outcomes[0].used_fallback);
        assert_eq!(env.injection_count(&url), 1);
        assert!(layer.registry().is_loaded(Feature::Fetch));

        layer.reset_compatibility_state();
        assert!(!layer.registry().is_loaded(Feature::Fetch));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CompatConfig {
            asset_base_url: "not a url".to_string(),
            ..Default::default()
        };
        let env = SimulatedEnvironment::new(OLD_CHROME);
        assert!(CompatibilityLayer::new(Arc::new(env), &config).is_err());
    }
}
