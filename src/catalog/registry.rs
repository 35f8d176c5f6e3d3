//! Built-in remediation tables

use super::{PriorityTier, RemediationDescriptor};
use crate::detection::Feature;
use url::Url;

const JSDELIVR: &str = "https://cdn.jsdelivr.net/npm/";

/// (feature, package path on the CDN, estimated bytes, tier)
const SCRIPT_TABLE: &[(Feature, &str, u64, PriorityTier)] = &[
    (Feature::Fetch, "whatwg-fetch@3.6.20/dist/fetch.umd.min.js", 8_400, PriorityTier::Critical),
    (Feature::Promises, "promise-polyfill@8.3.0/dist/polyfill.min.js", 3_100, PriorityTier::Critical),
    (
        Feature::IntersectionObserver,
        "intersection-observer@0.12.2/intersection-observer.js",
        7_600,
        PriorityTier::Important,
    ),
    (
        Feature::ObjectAssign,
        "es6-object-assign@1.1.0/dist/object-assign-auto.min.js",
        900,
        PriorityTier::Critical,
    ),
    (Feature::ArrayFrom, "array-from@2.1.1/polyfill.js", 1_800, PriorityTier::Important),
    (Feature::ArrayIncludes, "array-includes@3.1.8/auto.js", 1_200, PriorityTier::Important),
    (Feature::Symbol, "es6-symbol@3.1.4/implement.js", 4_200, PriorityTier::Important),
    (
        Feature::UrlSearchParams,
        "url-search-params-polyfill@8.2.5/index.js",
        5_300,
        PriorityTier::Important,
    ),
    (Feature::CustomEvent, "custom-event-polyfill@1.0.7/polyfill.js", 700, PriorityTier::Important),
    (
        Feature::AbortController,
        "abortcontroller-polyfill@1.7.5/dist/abortcontroller-polyfill-only.js",
        2_900,
        PriorityTier::Optional,
    ),
    (
        Feature::ResizeObserver,
        "resize-observer-polyfill@1.5.1/dist/ResizeObserver.js",
        9_800,
        PriorityTier::Optional,
    ),
    (Feature::RequestAnimationFrame, "raf@3.4.1/polyfill.js", 1_100, PriorityTier::Optional),
];

/// (feature, stylesheet file name, tier)
const STYLE_TABLE: &[(Feature, &str, PriorityTier)] = &[
    (Feature::CssGrid, "grid-fallback.css", PriorityTier::Critical),
    (Feature::FlexGap, "flex-gap-fallback.css", PriorityTier::Critical),
    (Feature::CustomProperties, "static-theme.css", PriorityTier::Critical),
    (Feature::ObjectFit, "object-fit-fallback.css", PriorityTier::Important),
    (Feature::StickyPosition, "sticky-fallback.css", PriorityTier::Important),
    (Feature::AspectRatio, "aspect-ratio-fallback.css", PriorityTier::Important),
    (Feature::ClampFunction, "fluid-type-fallback.css", PriorityTier::Optional),
    (Feature::BackdropFilter, "backdrop-fallback.css", PriorityTier::Optional),
];

/// Polyfill descriptors in catalog order
pub fn builtin_scripts() -> Vec<RemediationDescriptor> {
    SCRIPT_TABLE
        .iter()
        .map(|(feature, path, size, tier)| {
            RemediationDescriptor::script(*feature, &format!("{}{}", JSDELIVR, path), *size, *tier)
        })
        .collect()
}

/// Style fallback descriptors in catalog order, served from `asset_base`
pub fn builtin_styles(asset_base: &Url) -> Vec<RemediationDescriptor> {
    STYLE_TABLE
        .iter()
        .map(|(feature, file, tier)| {
            let url = asset_base
                .join(&format!("css/{}", file))
                .map(|u| u.to_string())
                .unwrap_or_else(|_| format!("{}css/{}", asset_base, file));
            RemediationDescriptor::style(*feature, &url, *tier)
        })
        .collect()
}
