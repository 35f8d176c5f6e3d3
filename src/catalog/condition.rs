//! Gating predicates over a runtime profile

use crate::detection::{BrowserFamily, Feature, RuntimeProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Declarative condition, usable from configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRule {
    Always,
    Never,
    /// Feature probed and found missing
    Missing(Feature),
    /// Major version strictly below the bound
    VersionBelow(u32),
    /// Browser family equals
    Family(BrowserFamily),
    /// Profile is below the baseline table
    BelowBaseline,
    All(Vec<ConditionRule>),
    Any(Vec<ConditionRule>),
}

impl ConditionRule {
    pub fn evaluate(&self, profile: &RuntimeProfile) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Missing(feature) => profile.lacks(*feature),
            Self::VersionBelow(bound) => profile.version < *bound,
            Self::Family(family) => profile.browser_family == *family,
            Self::BelowBaseline => !profile.is_baseline_supported,
            Self::All(rules) => rules.iter().all(|r| r.evaluate(profile)),
            Self::Any(rules) => rules.iter().any(|r| r.evaluate(profile)),
        }
    }
}

/// Pure predicate deciding whether a remediation is required
#[derive(Clone)]
pub struct Condition {
    predicate: Arc<dyn Fn(&RuntimeProfile) -> bool + Send + Sync>,
    description: String,
}

impl Condition {
    /// Wrap an arbitrary predicate
    pub fn new<F>(description: &str, predicate: F) -> Self
    where
        F: Fn(&RuntimeProfile) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: description.to_string(),
        }
    }

    /// Required when the feature is missing
    pub fn missing(feature: Feature) -> Self {
        ConditionRule::Missing(feature).into()
    }

    pub fn evaluate(&self, profile: &RuntimeProfile) -> bool {
        (self.predicate)(profile)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl From<ConditionRule> for Condition {
    fn from(rule: ConditionRule) -> Self {
        let description = format!("{:?}", rule);
        Self {
            predicate: Arc::new(move |profile| rule.evaluate(profile)),
            description,
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.description).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn profile(version: u32, missing: &[Feature]) -> RuntimeProfile {
        let features: BTreeMap<Feature, bool> = Feature::all()
            .iter()
            .map(|f| (*f, !missing.contains(f)))
            .collect();
        RuntimeProfile::new(BrowserFamily::Webkit, version, features)
    }

    #[test]
    fn test_rules() {
        let p = profile(12, &[Feature::Fetch]);
        assert!(ConditionRule::Missing(Feature::Fetch).evaluate(&p));
        assert!(!ConditionRule::Missing(Feature::Promises).evaluate(&p));
        assert!(ConditionRule::VersionBelow(13).evaluate(&p));
        assert!(ConditionRule::BelowBaseline.evaluate(&p));
        assert!(ConditionRule::All(vec![
            ConditionRule::Family(BrowserFamily::Webkit),
            ConditionRule::VersionBelow(14),
        ])
        .evaluate(&p));
        assert!(!ConditionRule::Any(vec![ConditionRule::Never]).evaluate(&p));
    }

    #[test]
    fn test_rule_from_json() {
        let rule: ConditionRule = serde_json::from_str(
            r#"{"any": [{"missing": "fetch"}, {"version_below": 90}]}"#,
        )
        .unwrap();
        assert_eq!(
            rule,
            ConditionRule::Any(vec![
                ConditionRule::Missing(Feature::Fetch),
                ConditionRule::VersionBelow(90),
            ])
        );
    }

    #[test]
    fn test_closure_condition() {
        let condition = Condition::new("old webkit", |p| p.version < 14);
        assert!(condition.evaluate(&profile(12, &[])));
        assert_eq!(condition.description(), "old webkit");
    }
}
