//! Remediation Catalog
//!
//! Static registry mapping each remediable feature to how it is fixed: where
//! the remote copy lives, which local fallback applies, how success is
//! verified, how large it is and how urgently it is needed. Two sub-catalogs
//! share the same descriptor shape: scripts (polyfills) and styles (fallback
//! CSS).

mod condition;
mod fallback;
mod registry;

pub use condition::{Condition, ConditionRule};
pub use fallback::{CssFallback, Fallback, JsShim};

use crate::config::{CompatConfig, RemediationOverride};
use crate::detection::{Feature, RuntimeProfile};
use crate::environment::{Probe, ResourceKind};
use crate::utils::{CompatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Delivery urgency of a remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    #[serde(alias = "high")]
    Critical,
    #[serde(alias = "medium")]
    Important,
    #[serde(alias = "low")]
    Optional,
}

impl PriorityTier {
    /// Tiers from most to least urgent
    pub fn all() -> &'static [PriorityTier] {
        &[Self::Critical, Self::Important, Self::Optional]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Optional => "optional",
        }
    }

    /// The JS naming of the same tier
    pub fn js_alias(&self) -> &'static str {
        match self {
            Self::Critical => "high",
            Self::Important => "medium",
            Self::Optional => "low",
        }
    }
}

/// How one feature is remediated
#[derive(Debug, Clone)]
pub struct RemediationDescriptor {
    pub name: Feature,
    pub kind: ResourceKind,
    pub remote_url: String,
    /// SRI attribute for the remote copy
    pub integrity: Option<String>,
    /// Post-load check that the capability is now present
    pub verify: Probe,
    pub fallback: Option<Fallback>,
    pub estimated_size_bytes: u64,
    pub priority_tier: PriorityTier,
    pub condition: Condition,
}

impl RemediationDescriptor {
    /// A polyfill verified by the feature's own presence probe
    pub fn script(name: Feature, remote_url: &str, estimated_size_bytes: u64, tier: PriorityTier) -> Self {
        Self {
            name,
            kind: ResourceKind::Script,
            remote_url: remote_url.to_string(),
            integrity: None,
            verify: name.probe(),
            fallback: Fallback::for_feature(name),
            estimated_size_bytes,
            priority_tier: tier,
            condition: Condition::missing(name),
        }
    }

    /// A style fallback verified by the presence of its element; the size
    /// is the exact length of the guarded block
    pub fn style(name: Feature, remote_url: &str, tier: PriorityTier) -> Self {
        let fallback = Fallback::for_feature(name);
        let estimated_size_bytes = fallback
            .map(|f| f.inline_source().len() as u64)
            .unwrap_or(0);
        Self {
            name,
            kind: ResourceKind::Stylesheet,
            remote_url: remote_url.to_string(),
            integrity: None,
            verify: Probe::ResourcePresent(element_id(name)),
            fallback,
            estimated_size_bytes,
            priority_tier: tier,
            condition: Condition::missing(name),
        }
    }

    /// Id of the element this remediation injects
    pub fn element_id(&self) -> String {
        element_id(self.name)
    }

    pub fn with_size(mut self, bytes: u64) -> Self {
        self.estimated_size_bytes = bytes;
        self
    }

    pub fn with_tier(mut self, tier: PriorityTier) -> Self {
        self.priority_tier = tier;
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// Whether this remediation is needed for the profile
    pub fn is_required(&self, profile: &RuntimeProfile) -> bool {
        self.condition.evaluate(profile)
    }

    /// Generated CSS block for style remediations
    pub fn css_block(&self) -> Option<String> {
        match self.fallback {
            Some(Fallback::Style(css)) => Some(css.guarded_block()),
            _ => None,
        }
    }
}

fn element_id(feature: Feature) -> String {
    format!("compat-{}", feature.as_str())
}

/// Registry of script and style remediations
#[derive(Debug, Clone)]
pub struct RemediationCatalog {
    scripts: Vec<RemediationDescriptor>,
    styles: Vec<RemediationDescriptor>,
}

impl RemediationCatalog {
    /// Catalog from explicit descriptor lists
    pub fn new(scripts: Vec<RemediationDescriptor>, styles: Vec<RemediationDescriptor>) -> Self {
        Self { scripts, styles }
    }

    /// Built-in tables, style sheets served from `asset_base`
    pub fn builtin(asset_base: &Url) -> Self {
        Self::new(registry::builtin_scripts(), registry::builtin_styles(asset_base))
    }

    /// Built-in tables with the configuration's overrides applied
    pub fn from_config(config: &CompatConfig) -> Result<Self> {
        let mut catalog = Self::builtin(&config.asset_base()?);
        catalog.apply_overrides(&config.remediations)?;
        Ok(catalog)
    }

    /// Disable, redirect or re-gate individual remediations
    pub fn apply_overrides(&mut self, overrides: &HashMap<Feature, RemediationOverride>) -> Result<()> {
        for (feature, patch) in overrides {
            if !self.contains(*feature) {
                return Err(CompatError::Config(format!(
                    "`{}` has no remediation to override",
                    feature
                )));
            }
            if let Some(url) = &patch.remote_url {
                Url::parse(url)?;
            }
        }

        for list in [&mut self.scripts, &mut self.styles] {
            list.retain(|d| overrides.get(&d.name).is_none_or(|o| o.enabled));
            for descriptor in list.iter_mut() {
                let Some(patch) = overrides.get(&descriptor.name) else {
                    continue;
                };
                if let Some(url) = &patch.remote_url {
                    descriptor.remote_url = url.clone();
                }
                if let Some(integrity) = &patch.integrity {
                    descriptor.integrity = Some(integrity.clone());
                }
                if let Some(rule) = &patch.condition {
                    descriptor.condition = rule.clone().into();
                }
                log::debug!("applied override for {}", descriptor.name);
            }
        }
        Ok(())
    }

    /// Replace a condition with an arbitrary predicate
    pub fn set_condition(&mut self, feature: Feature, condition: Condition) -> bool {
        match self.descriptor_mut(feature) {
            Some(descriptor) => {
                descriptor.condition = condition;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.descriptor(feature).is_some()
    }

    pub fn descriptor(&self, feature: Feature) -> Option<&RemediationDescriptor> {
        self.scripts
            .iter()
            .chain(self.styles.iter())
            .find(|d| d.name == feature)
    }

    fn descriptor_mut(&mut self, feature: Feature) -> Option<&mut RemediationDescriptor> {
        self.scripts
            .iter_mut()
            .chain(self.styles.iter_mut())
            .find(|d| d.name == feature)
    }

    pub fn scripts(&self) -> &[RemediationDescriptor] {
        &self.scripts
    }

    pub fn styles(&self) -> &[RemediationDescriptor] {
        &self.styles
    }

    /// Every remediation the profile needs, scripts first, catalog order
    pub fn resolve_required(&self, profile: &RuntimeProfile) -> Vec<RemediationDescriptor> {
        let mut required = self.resolve_scripts(profile);
        required.extend(self.resolve_styles(profile));
        required
    }

    pub fn resolve_scripts(&self, profile: &RuntimeProfile) -> Vec<RemediationDescriptor> {
        resolve(&self.scripts, profile)
    }

    pub fn resolve_styles(&self, profile: &RuntimeProfile) -> Vec<RemediationDescriptor> {
        resolve(&self.styles, profile)
    }
}

fn resolve(list: &[RemediationDescriptor], profile: &RuntimeProfile) -> Vec<RemediationDescriptor> {
    list.iter().filter(|d| d.is_required(profile)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BrowserFamily;
    use std::collections::BTreeMap;

    fn base() -> Url {
        Url::parse("https://static.test/compat/").unwrap()
    }

    fn profile_missing(missing: &[Feature]) -> RuntimeProfile {
        let features: BTreeMap<Feature, bool> = Feature::all()
            .iter()
            .map(|f| (*f, !missing.contains(f)))
            .collect();
        RuntimeProfile::new(BrowserFamily::Chromium, 70, features)
    }

    #[test]
    fn test_resolve_keeps_catalog_order() {
        let catalog = RemediationCatalog::builtin(&base());
        let profile = profile_missing(&[Feature::IntersectionObserver, Feature::Fetch, Feature::CssGrid]);

        let names: Vec<Feature> = catalog.resolve_required(&profile).iter().map(|d| d.name).collect();
        assert_eq!(names, vec![Feature::Fetch, Feature::IntersectionObserver, Feature::CssGrid]);
    }

    #[test]
    fn test_full_support_requires_nothing() {
        let catalog = RemediationCatalog::builtin(&base());
        assert!(catalog.resolve_required(&profile_missing(&[])).is_empty());
    }

    #[test]
    fn test_style_urls_use_asset_base() {
        let catalog = RemediationCatalog::builtin(&base());
        let grid = catalog.descriptor(Feature::CssGrid).unwrap();
        assert_eq!(grid.remote_url, "https://static.test/compat/css/grid-fallback.css");
        assert_eq!(grid.verify, Probe::ResourcePresent("compat-cssGrid".to_string()));
        assert!(grid.estimated_size_bytes > 0);
    }

    #[test]
    fn test_override_disable_redirect_regate() {
        let mut catalog = RemediationCatalog::builtin(&base());
        let mut overrides = HashMap::new();
        overrides.insert(
            Feature::Fetch,
            RemediationOverride {
                enabled: false,
                ..Default::default()
            },
        );
        overrides.insert(
            Feature::Promises,
            RemediationOverride {
                remote_url: Some("https://mirror.test/promise.js".to_string()),
                condition: Some(ConditionRule::VersionBelow(80)),
                ..Default::default()
            },
        );
        catalog.apply_overrides(&overrides).unwrap();

        assert!(!catalog.contains(Feature::Fetch));
        let promises = catalog.descriptor(Feature::Promises).unwrap();
        assert_eq!(promises.remote_url, "https://mirror.test/promise.js");

        // Promises are present but the version gate now fires
        let profile = profile_missing(&[]);
        let names: Vec<Feature> = catalog.resolve_required(&profile).iter().map(|d| d.name).collect();
        assert_eq!(names, vec![Feature::Promises]);
    }

    #[test]
    fn test_override_rejects_bad_input() {
        let mut catalog = RemediationCatalog::builtin(&base());
        let mut overrides = HashMap::new();
        overrides.insert(Feature::Webp, RemediationOverride::default());
        assert!(matches!(catalog.apply_overrides(&overrides), Err(CompatError::Config(_))));

        let mut overrides = HashMap::new();
        overrides.insert(
            Feature::Fetch,
            RemediationOverride {
                remote_url: Some("not a url".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(catalog.apply_overrides(&overrides), Err(CompatError::InvalidUrl(_))));
    }

    #[test]
    fn test_set_condition_closure() {
        let mut catalog = RemediationCatalog::builtin(&base());
        assert!(catalog.set_condition(Feature::Symbol, Condition::new("always", |_| true)));
        assert!(!catalog.set_condition(Feature::Avif, Condition::new("never", |_| false)));

        let names: Vec<Feature> = catalog
            .resolve_scripts(&profile_missing(&[]))
            .iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec![Feature::Symbol]);
    }

    #[test]
    fn test_tier_aliases() {
        let tier: PriorityTier = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(tier, PriorityTier::Critical);
        assert_eq!(PriorityTier::Optional.js_alias(), "low");
    }
}
