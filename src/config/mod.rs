//! Configuration for the compatibility layer
//!
//! Loaded from JSON; every field has a default, so an empty object is a
//! valid configuration.

use crate::bundle::SriHash;
use crate::catalog::ConditionRule;
use crate::detection::Feature;
use crate::utils::{CompatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default deadline for a remote load
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;

/// Default byte budget of one delivery bundle
pub const DEFAULT_MAX_BUNDLE_SIZE_BYTES: u64 = 48 * 1024;

/// Placeholder origin for bundle endpoints and style sheets; sites override it
pub const DEFAULT_ASSET_BASE_URL: &str = "https://static.example.com/compat/";

/// What happens to members that do not fit a tier's bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Excluded from every bundle
    #[default]
    Drop,
    /// Carried into further bundles of the same tier
    Spill,
}

/// Per-feature adjustments to the built-in catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemediationOverride {
    pub enabled: bool,
    pub remote_url: Option<String>,
    pub integrity: Option<String>,
    pub condition: Option<ConditionRule>,
}

impl Default for RemediationOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            remote_url: None,
            integrity: None,
            condition: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompatConfig {
    /// Deadline for each remote load attempt
    pub remote_timeout_ms: u64,
    /// Byte budget of one delivery bundle
    pub max_bundle_size_bytes: u64,
    pub overflow: OverflowPolicy,
    /// Deliver critical style bundles inline in the head
    pub inline_critical_css: bool,
    /// Base URL for combined bundles and fallback style sheets
    pub asset_base_url: String,
    pub remediations: HashMap<Feature, RemediationOverride>,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            max_bundle_size_bytes: DEFAULT_MAX_BUNDLE_SIZE_BYTES,
            overflow: OverflowPolicy::Drop,
            inline_critical_css: true,
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            remediations: HashMap::new(),
        }
    }
}

impl CompatConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check value ranges and URLs
    pub fn validate(&self) -> Result<()> {
        if self.remote_timeout_ms == 0 {
            return Err(CompatError::Config("remoteTimeoutMs must be positive".to_string()));
        }
        if self.max_bundle_size_bytes == 0 {
            return Err(CompatError::Config("maxBundleSizeBytes must be positive".to_string()));
        }

        let base = Url::parse(&self.asset_base_url)?;
        if base.cannot_be_a_base() {
            return Err(CompatError::Config(format!(
                "assetBaseUrl `{}` cannot be a base",
                self.asset_base_url
            )));
        }

        for (feature, patch) in &self.remediations {
            if let Some(url) = &patch.remote_url {
                Url::parse(url).map_err(|e| {
                    CompatError::InvalidUrl(format!("{} override `{}`: {}", feature, url, e))
                })?;
            }
            if let Some(integrity) = &patch.integrity {
                // An integrity attribute may list several hashes
                let mut hashes = integrity.split_whitespace().peekable();
                if hashes.peek().is_none() || !hashes.all(|h| SriHash::parse(h).is_some()) {
                    return Err(CompatError::Config(format!(
                        "{} override: malformed integrity `{}`",
                        feature, integrity
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn asset_base(&self) -> Result<Url> {
        Ok(Url::parse(&self.asset_base_url)?)
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_bundle_size(mut self, bytes: u64) -> Self {
        self.max_bundle_size_bytes = bytes;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn with_override(mut self, feature: Feature, patch: RemediationOverride) -> Self {
        self.remediations.insert(feature, patch);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        let config = CompatConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CompatConfig::default());
        assert_eq!(config.remote_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_overrides() {
        let json = r#"{
            "maxBundleSizeBytes": 3000,
            "overflow": "spill",
            "remediations": {
                "fetch": { "enabled": false },
                "promises": {
                    "remoteUrl": "https://mirror.test/promise.js",
                    "condition": { "version_below": 90 }
                }
            }
        }"#;
        let config = CompatConfig::from_json_str(json).unwrap();

        assert_eq!(config.max_bundle_size_bytes, 3000);
        assert_eq!(config.overflow, OverflowPolicy::Spill);
        assert!(!config.remediations[&Feature::Fetch].enabled);
        let promises = &config.remediations[&Feature::Promises];
        assert!(promises.enabled);
        assert_eq!(promises.condition, Some(ConditionRule::VersionBelow(90)));
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            CompatConfig::from_json_str(r#"{"remoteTimeoutMs": 0}"#),
            Err(CompatError::Config(_))
        ));
        assert!(matches!(
            CompatConfig::from_json_str(r#"{"assetBaseUrl": "relative/path"}"#),
            Err(CompatError::InvalidUrl(_))
        ));
        assert!(matches!(
            CompatConfig::from_json_str(r#"{"remediations": {"fetch": {"remoteUrl": "::"}}}"#),
            Err(CompatError::InvalidUrl(_))
        ));
        assert!(matches!(
            CompatConfig::from_json_str(r#"{"remediations": {"teleport": {}}}"#),
            Err(CompatError::Json(_))
        ));
    }

    #[test]
    fn test_integrity_overrides_are_checked() {
        let sha384 = SriHash::compute(crate::bundle::SriAlgorithm::Sha384, b"fetch").to_string();
        let json = format!(r#"{{"remediations": {{"fetch": {{"integrity": "{}"}}}}}}"#, sha384);
        let config = CompatConfig::from_json_str(&json).unwrap();
        assert_eq!(config.remediations[&Feature::Fetch].integrity, Some(sha384));

        for bad in ["md5-abc", "sha256-not base64!", "sha256-", "sha512-YWJj", ""] {
            let json = format!(r#"{{"remediations": {{"fetch": {{"integrity": "{}"}}}}}}"#, bad);
            assert!(
                matches!(CompatConfig::from_json_str(&json), Err(CompatError::Config(_))),
                "`{}` should be rejected",
                bad
            );
        }
    }
}
