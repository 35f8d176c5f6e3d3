//! Bundle Optimizer
//!
//! Packs required remediations into size-budgeted delivery units:
//!
//! - members are grouped by kind (scripts, styles) and priority tier
//! - within a tier, smallest first (stable, so equal sizes keep catalog order)
//! - members are accumulated while the running total stays within budget
//!
//! Script bundles become one combined request URL. Style bundles are the
//! concatenated `@supports not (...)` guarded blocks, inlined for the
//! critical tier when configured, otherwise referenced externally.

pub mod css;
mod hint;
pub mod sri;

pub use hint::{DeliveryHint, ImportanceHint, Priority};
pub use sri::{SriAlgorithm, SriHash};

use crate::catalog::{PriorityTier, RemediationDescriptor};
use crate::config::{CompatConfig, OverflowPolicy};
use crate::detection::Feature;
use crate::environment::ResourceKind;
use crate::utils::Result;
use url::Url;

/// How a bundle reaches the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Payload is placed directly in the document head
    Inline,
    /// Payload is fetched from `href`
    External { href: String },
}

/// One delivery unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryBundle {
    pub id: String,
    pub kind: ResourceKind,
    pub member_names: Vec<Feature>,
    /// Combined request URL for scripts, concatenated CSS for styles
    pub payload: String,
    pub total_size_bytes: u64,
    pub priority_tier: PriorityTier,
    pub delivery: Delivery,
    pub hint: DeliveryHint,
    /// Hash of an inline payload, for CSP allow-listing
    pub integrity: Option<SriHash>,
}

impl DeliveryBundle {
    pub fn is_inline(&self) -> bool {
        self.delivery == Delivery::Inline
    }

    /// Markup the page bootstrap can place in the head
    pub fn to_html(&self) -> String {
        let priority = self.hint.importance.as_str();
        match (&self.delivery, self.kind) {
            (Delivery::Inline, ResourceKind::Stylesheet) => {
                format!("<style id=\"{}\">{}</style>", self.id, self.payload)
            }
            // The optimizer never inlines scripts; bundles built by hand may
            (Delivery::Inline, ResourceKind::Script) => {
                format!("<script id=\"{}\">{}</script>", self.id, self.payload)
            }
            (Delivery::External { href }, ResourceKind::Script) => {
                let mut html = String::new();
                if self.hint.preload {
                    html.push_str(&format!(
                        "<link rel=\"preload\" as=\"script\" href=\"{}\" fetchpriority=\"{}\">",
                        href, priority
                    ));
                }
                let mode = if self.hint.is_async {
                    " async"
                } else if self.hint.is_deferred {
                    " defer"
                } else {
                    ""
                };
                html.push_str(&format!(
                    "<script id=\"{}\" src=\"{}\"{} fetchpriority=\"{}\"></script>",
                    self.id, href, mode, priority
                ));
                html
            }
            (Delivery::External { href }, ResourceKind::Stylesheet) => {
                if self.hint.is_async {
                    format!(
                        "<link id=\"{}\" rel=\"preload\" as=\"style\" href=\"{}\" fetchpriority=\"{}\" onload=\"this.rel='stylesheet'\">",
                        self.id, href, priority
                    )
                } else {
                    format!(
                        "<link id=\"{}\" rel=\"stylesheet\" href=\"{}\" fetchpriority=\"{}\">",
                        self.id, href, priority
                    )
                }
            }
        }
    }
}

/// Groups remediations into delivery bundles
#[derive(Debug, Clone)]
pub struct BundleOptimizer {
    js_endpoint: Url,
    css_endpoint: Url,
    overflow: OverflowPolicy,
    inline_critical_css: bool,
}

impl BundleOptimizer {
    /// Optimizer whose combined endpoints live under `asset_base`
    pub fn new(asset_base: &Url) -> Result<Self> {
        Ok(Self {
            js_endpoint: asset_base.join("polyfills.js")?,
            css_endpoint: asset_base.join("fallbacks.css")?,
            overflow: OverflowPolicy::Drop,
            inline_critical_css: true,
        })
    }

    pub fn from_config(config: &CompatConfig) -> Result<Self> {
        Ok(Self::new(&config.asset_base()?)?
            .with_overflow(config.overflow)
            .with_inline_critical_css(config.inline_critical_css))
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn with_inline_critical_css(mut self, inline: bool) -> Self {
        self.inline_critical_css = inline;
        self
    }

    /// Pack `required` into bundles of at most `max_bundle_size_bytes`
    ///
    /// Scripts come before styles, and tiers run critical to optional. Members
    /// that do not fit are excluded (or spilled into a further bundle of the
    /// same tier under [`OverflowPolicy::Spill`]).
    pub fn build_bundles(
        &self,
        required: &[RemediationDescriptor],
        max_bundle_size_bytes: u64,
    ) -> Vec<DeliveryBundle> {
        let mut bundles = Vec::new();

        for kind in [ResourceKind::Script, ResourceKind::Stylesheet] {
            for tier in PriorityTier::all() {
                let mut members: Vec<&RemediationDescriptor> = required
                    .iter()
                    .filter(|d| d.kind == kind && d.priority_tier == *tier)
                    .filter(|d| kind == ResourceKind::Script || self.css_member_is_valid(d))
                    .collect();
                if members.is_empty() {
                    continue;
                }
                // Stable: equal sizes keep their catalog order
                members.sort_by_key(|d| d.estimated_size_bytes);

                let (groups, dropped) = self.pack(&members, max_bundle_size_bytes);
                if !dropped.is_empty() {
                    let names: Vec<&str> = dropped.iter().map(|d| d.name.as_str()).collect();
                    log::warn!(
                        "{} {} bundle: {} left out by the {} byte budget",
                        kind.as_str(),
                        tier.as_str(),
                        names.join(", "),
                        max_bundle_size_bytes
                    );
                }

                for (index, group) in groups.iter().enumerate() {
                    let id = if index == 0 {
                        format!("compat-{}-{}", kind.as_str(), tier.as_str())
                    } else {
                        format!("compat-{}-{}-{}", kind.as_str(), tier.as_str(), index + 1)
                    };
                    bundles.push(self.assemble(id, kind, *tier, group));
                }
            }
        }

        bundles
    }

    /// Greedy accumulation over size-sorted members
    fn pack<'a>(
        &self,
        sorted: &[&'a RemediationDescriptor],
        budget: u64,
    ) -> (Vec<Vec<&'a RemediationDescriptor>>, Vec<&'a RemediationDescriptor>) {
        let mut groups: Vec<Vec<&RemediationDescriptor>> = Vec::new();
        let mut dropped = Vec::new();
        let mut current: Vec<&RemediationDescriptor> = Vec::new();
        let mut total = 0u64;

        for &member in sorted {
            let size = member.estimated_size_bytes;
            if let Some(next) = total.checked_add(size).filter(|t| *t <= budget) {
                current.push(member);
                total = next;
                continue;
            }

            match self.overflow {
                OverflowPolicy::Drop => dropped.push(member),
                OverflowPolicy::Spill if size <= budget => {
                    groups.push(std::mem::take(&mut current));
                    current.push(member);
                    total = size;
                }
                OverflowPolicy::Spill => dropped.push(member),
            }
        }

        if !current.is_empty() {
            groups.push(current);
        }
        groups.retain(|g| !g.is_empty());
        (groups, dropped)
    }

    fn assemble(
        &self,
        id: String,
        kind: ResourceKind,
        tier: PriorityTier,
        members: &[&RemediationDescriptor],
    ) -> DeliveryBundle {
        let member_names: Vec<Feature> = members.iter().map(|d| d.name).collect();
        // Packing keeps the total within budget, so this never saturates
        let total_size_bytes = members
            .iter()
            .fold(0u64, |total, d| total.saturating_add(d.estimated_size_bytes));
        let features = member_names
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let (payload, delivery, integrity) = match kind {
            ResourceKind::Script => {
                let mut url = self.js_endpoint.clone();
                url.set_query(Some(&format!("features={}", features)));
                let href = url.to_string();
                (href.clone(), Delivery::External { href }, None)
            }
            ResourceKind::Stylesheet => {
                let payload: String = members.iter().filter_map(|d| d.css_block()).collect();
                if tier == PriorityTier::Critical && self.inline_critical_css {
                    let hash = SriHash::compute(SriAlgorithm::Sha256, payload.as_bytes());
                    (payload, Delivery::Inline, Some(hash))
                } else {
                    let mut url = self.css_endpoint.clone();
                    url.set_query(Some(&format!("features={}&tier={}", features, tier.as_str())));
                    (payload, Delivery::External { href: url.to_string() }, None)
                }
            }
        };

        let hint = DeliveryHint::for_bundle(kind, tier, delivery == Delivery::Inline);
        DeliveryBundle {
            id,
            kind,
            member_names,
            payload,
            total_size_bytes,
            priority_tier: tier,
            delivery,
            hint,
            integrity,
        }
    }

    fn css_member_is_valid(&self, descriptor: &RemediationDescriptor) -> bool {
        let Some(block) = descriptor.css_block() else {
            log::warn!("{} has no CSS block, skipping", descriptor.name);
            return false;
        };
        match css::check_block(&block) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("{}: {}", descriptor.name, e);
                false
            }
        }
    }
}
