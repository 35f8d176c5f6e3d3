//! Runtime profile of the visiting browser

use super::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Browser engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserFamily {
    Chromium,
    Gecko,
    Webkit,
    EdgeLegacy,
    Unknown,
}

impl BrowserFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Gecko => "gecko",
            Self::Webkit => "webkit",
            Self::EdgeLegacy => "edge-legacy",
            Self::Unknown => "unknown",
        }
    }

    /// Minimum major version considered baseline; `None` for families that
    /// are never baseline
    pub fn baseline_version(&self) -> Option<u32> {
        match self {
            Self::Chromium => Some(baseline::CHROMIUM),
            Self::Gecko => Some(baseline::GECKO),
            Self::Webkit => Some(baseline::WEBKIT),
            Self::EdgeLegacy => Some(baseline::EDGE_LEGACY),
            Self::Unknown => None,
        }
    }
}

/// Minimum versions for baseline support
pub mod baseline {
    pub const CHROMIUM: u32 = 80;
    pub const GECKO: u32 = 78;
    pub const WEBKIT: u32 = 13;
    pub const EDGE_LEGACY: u32 = 79;
}

/// Immutable classification of one page session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeProfile {
    pub browser_family: BrowserFamily,
    pub version: u32,
    pub is_baseline_supported: bool,
    pub features: BTreeMap<Feature, bool>,
    /// False when computed without a document (server rendering)
    #[serde(default = "default_true")]
    pub document_available: bool,
}

fn default_true() -> bool {
    true
}

impl RuntimeProfile {
    /// Build a profile from identity and probe results
    pub fn new(family: BrowserFamily, version: u32, features: BTreeMap<Feature, bool>) -> Self {
        Self {
            browser_family: family,
            version,
            is_baseline_supported: is_baseline(family, version),
            features,
            document_available: true,
        }
    }

    /// Profile used when no document exists: everything assumed supported
    ///
    /// This is the one profile where `is_baseline_supported` does not come
    /// from [`is_baseline`]. The family is `Unknown` because there is no
    /// identity to classify, but a document-less context has nothing to
    /// remediate, so it counts as baseline. `document_available` is false,
    /// which tells it apart from a classified `Unknown` browser.
    pub fn assume_modern() -> Self {
        Self {
            browser_family: BrowserFamily::Unknown,
            version: 0,
            is_baseline_supported: true,
            features: Feature::all().iter().map(|f| (*f, true)).collect(),
            document_available: false,
        }
    }

    /// Whether the feature was detected as present
    pub fn supports(&self, feature: Feature) -> bool {
        self.features.get(&feature).copied().unwrap_or(false)
    }

    /// Whether the feature was probed and found missing
    ///
    /// Features absent from the map were never probed and are not
    /// considered missing.
    pub fn lacks(&self, feature: Feature) -> bool {
        self.features.get(&feature) == Some(&false)
    }

    /// Features probed and found missing
    pub fn missing_features(&self) -> Vec<Feature> {
        self.features
            .iter()
            .filter(|(_, present)| !**present)
            .map(|(f, _)| *f)
            .collect()
    }
}

/// Apply the per-family minimum version table
pub fn is_baseline(family: BrowserFamily, version: u32) -> bool {
    family
        .baseline_version()
        .is_some_and(|min| version >= min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_table() {
        assert!(is_baseline(BrowserFamily::Chromium, 80));
        assert!(!is_baseline(BrowserFamily::Chromium, 79));
        assert!(is_baseline(BrowserFamily::Gecko, 78));
        assert!(is_baseline(BrowserFamily::Webkit, 13));
        assert!(!is_baseline(BrowserFamily::Webkit, 12));
        assert!(!is_baseline(BrowserFamily::EdgeLegacy, 18));
        assert!(!is_baseline(BrowserFamily::Unknown, 500));
    }

    #[test]
    fn test_lacks_only_probed_features() {
        let mut features = BTreeMap::new();
        features.insert(Feature::Fetch, false);
        features.insert(Feature::Promises, true);
        let profile = RuntimeProfile::new(BrowserFamily::Chromium, 70, features);

        assert!(profile.lacks(Feature::Fetch));
        assert!(!profile.lacks(Feature::Promises));
        assert!(!profile.lacks(Feature::Symbol));
        assert!(!profile.supports(Feature::Symbol));
        assert_eq!(profile.missing_features(), vec![Feature::Fetch]);
    }

    #[test]
    fn test_assume_modern() {
        let profile = RuntimeProfile::assume_modern();
        assert!(profile.is_baseline_supported);
        assert!(profile.missing_features().is_empty());
        assert!(!profile.document_available);

        // A classified unknown browser is never baseline
        assert!(!is_baseline(profile.browser_family, profile.version));
        let unknown = RuntimeProfile::new(BrowserFamily::Unknown, 0, profile.features.clone());
        assert!(!unknown.is_baseline_supported);
        assert!(unknown.document_available);
    }
}
