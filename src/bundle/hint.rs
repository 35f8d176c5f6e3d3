//! Delivery hints for bundles
//!
//! Maps a bundle's kind and tier to loading priority the way Chromium's
//! resource scheduler weighs type, `fetchpriority` and async/defer.

use crate::catalog::PriorityTier;
use crate::environment::ResourceKind;

/// Resource priority levels (similar to Chrome's)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Highest priority (render-blocking styles)
    VeryHigh = 0,
    /// High priority (blocking scripts)
    High = 1,
    /// Medium priority (deferred scripts)
    Medium = 2,
    /// Low priority (async, optional)
    Low = 3,
}

/// Importance hint emitted as `fetchpriority`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportanceHint {
    High,
    Low,
    Auto,
}

impl ImportanceHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
            Self::Auto => "auto",
        }
    }

    fn for_tier(tier: PriorityTier) -> Self {
        match tier {
            PriorityTier::Critical => Self::High,
            PriorityTier::Important => Self::Auto,
            PriorityTier::Optional => Self::Low,
        }
    }
}

/// How the page bootstrap should request a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryHint {
    pub kind: ResourceKind,
    pub priority: Priority,
    pub importance: ImportanceHint,
    /// Emit a `<link rel=preload>` ahead of the element
    pub preload: bool,
    /// Load without blocking the parser
    pub is_async: bool,
    /// Execute after parsing (scripts only)
    pub is_deferred: bool,
}

impl DeliveryHint {
    /// Hint for a bundle of `kind` in `tier`; inline bundles need no fetch
    pub fn for_bundle(kind: ResourceKind, tier: PriorityTier, inline: bool) -> Self {
        let (is_async, is_deferred) = match (kind, tier) {
            (_, PriorityTier::Critical) => (false, false),
            (ResourceKind::Script, PriorityTier::Important) => (false, true),
            (ResourceKind::Script, PriorityTier::Optional) => (true, false),
            (ResourceKind::Stylesheet, _) => (true, false),
        };

        let mut hint = Self {
            kind,
            priority: default_priority(kind),
            importance: ImportanceHint::for_tier(tier),
            preload: tier == PriorityTier::Critical && !inline,
            is_async,
            is_deferred,
        };
        hint.priority = hint.calculate_final_priority();
        hint
    }

    /// Whether the bundle holds up first render
    pub fn is_render_blocking(&self) -> bool {
        !self.is_async && !self.is_deferred
    }

    fn calculate_final_priority(&self) -> Priority {
        let base = default_priority(self.kind);

        let with_hint = match self.importance {
            ImportanceHint::High => match base {
                Priority::Low => Priority::Medium,
                Priority::Medium => Priority::High,
                p => p,
            },
            ImportanceHint::Low => match base {
                Priority::High | Priority::VeryHigh => Priority::Medium,
                Priority::Medium => Priority::Low,
                p => p,
            },
            ImportanceHint::Auto => base,
        };

        // Async/defer loads are lower priority
        if self.is_async || self.is_deferred {
            match with_hint {
                Priority::VeryHigh => Priority::High,
                Priority::High => Priority::Medium,
                Priority::Medium => Priority::Low,
                p => p,
            }
        } else {
            with_hint
        }
    }
}

fn default_priority(kind: ResourceKind) -> Priority {
    match kind {
        ResourceKind::Stylesheet => Priority::VeryHigh,
        ResourceKind::Script => Priority::High,
    }
}
