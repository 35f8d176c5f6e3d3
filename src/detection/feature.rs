//! Tracked feature names and their detection probes

use crate::environment::{MediaKind, Probe};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the page a feature belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// JavaScript API, remediated by a polyfill
    Script,
    /// Style engine capability, remediated by fallback CSS
    Style,
    /// Media format, detection only
    Media,
}

/// Every optional capability the layer tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Fetch,
    Promises,
    IntersectionObserver,
    ObjectAssign,
    ArrayFrom,
    ArrayIncludes,
    Symbol,
    UrlSearchParams,
    CustomEvent,
    AbortController,
    ResizeObserver,
    RequestAnimationFrame,
    CssGrid,
    FlexGap,
    CustomProperties,
    ObjectFit,
    StickyPosition,
    AspectRatio,
    ClampFunction,
    BackdropFilter,
    Webp,
    Avif,
    WebmVideo,
}

impl Feature {
    /// All tracked features, in catalog order
    pub fn all() -> &'static [Feature] {
        &[
            Self::Fetch,
            Self::Promises,
            Self::IntersectionObserver,
            Self::ObjectAssign,
            Self::ArrayFrom,
            Self::ArrayIncludes,
            Self::Symbol,
            Self::UrlSearchParams,
            Self::CustomEvent,
            Self::AbortController,
            Self::ResizeObserver,
            Self::RequestAnimationFrame,
            Self::CssGrid,
            Self::FlexGap,
            Self::CustomProperties,
            Self::ObjectFit,
            Self::StickyPosition,
            Self::AspectRatio,
            Self::ClampFunction,
            Self::BackdropFilter,
            Self::Webp,
            Self::Avif,
            Self::WebmVideo,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Promises => "promises",
            Self::IntersectionObserver => "intersectionObserver",
            Self::ObjectAssign => "objectAssign",
            Self::ArrayFrom => "arrayFrom",
            Self::ArrayIncludes => "arrayIncludes",
            Self::Symbol => "symbol",
            Self::UrlSearchParams => "urlSearchParams",
            Self::CustomEvent => "customEvent",
            Self::AbortController => "abortController",
            Self::ResizeObserver => "resizeObserver",
            Self::RequestAnimationFrame => "requestAnimationFrame",
            Self::CssGrid => "cssGrid",
            Self::FlexGap => "flexGap",
            Self::CustomProperties => "customProperties",
            Self::ObjectFit => "objectFit",
            Self::StickyPosition => "stickyPosition",
            Self::AspectRatio => "aspectRatio",
            Self::ClampFunction => "clampFunction",
            Self::BackdropFilter => "backdropFilter",
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::WebmVideo => "webmVideo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.as_str() == s)
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::Fetch
            | Self::Promises
            | Self::IntersectionObserver
            | Self::ObjectAssign
            | Self::ArrayFrom
            | Self::ArrayIncludes
            | Self::Symbol
            | Self::UrlSearchParams
            | Self::CustomEvent
            | Self::AbortController
            | Self::ResizeObserver
            | Self::RequestAnimationFrame => FeatureKind::Script,
            Self::CssGrid
            | Self::FlexGap
            | Self::CustomProperties
            | Self::ObjectFit
            | Self::StickyPosition
            | Self::AspectRatio
            | Self::ClampFunction
            | Self::BackdropFilter => FeatureKind::Style,
            Self::Webp | Self::Avif | Self::WebmVideo => FeatureKind::Media,
        }
    }

    /// The probe whose answer fills this feature's flag
    pub fn probe(&self) -> Probe {
        match self {
            Self::Fetch => Probe::ApiPresence("fetch"),
            Self::Promises => Probe::ApiPresence("Promise"),
            Self::IntersectionObserver => Probe::ApiPresence("IntersectionObserver"),
            Self::ObjectAssign => Probe::ApiPresence("Object.assign"),
            Self::ArrayFrom => Probe::ApiPresence("Array.from"),
            Self::ArrayIncludes => Probe::ApiPresence("Array.prototype.includes"),
            Self::Symbol => Probe::ApiPresence("Symbol"),
            Self::UrlSearchParams => Probe::ApiPresence("URLSearchParams"),
            Self::CustomEvent => Probe::ApiPresence("CustomEvent"),
            Self::AbortController => Probe::ApiPresence("AbortController"),
            Self::ResizeObserver => Probe::ApiPresence("ResizeObserver"),
            Self::RequestAnimationFrame => Probe::ApiPresence("requestAnimationFrame"),
            Self::CssGrid => style("display", "grid"),
            Self::FlexGap => style("gap", "1px"),
            Self::CustomProperties => style("--compat-probe", "0"),
            Self::ObjectFit => style("object-fit", "cover"),
            Self::StickyPosition => style("position", "sticky"),
            Self::AspectRatio => style("aspect-ratio", "1 / 1"),
            Self::ClampFunction => style("width", "clamp(1px, 2px, 3px)"),
            Self::BackdropFilter => style("backdrop-filter", "blur(1px)"),
            Self::Webp => Probe::MediaFormat {
                kind: MediaKind::Image,
                format: "image/webp",
            },
            Self::Avif => Probe::MediaFormat {
                kind: MediaKind::Image,
                format: "image/avif",
            },
            Self::WebmVideo => Probe::MediaFormat {
                kind: MediaKind::Video,
                format: "video/webm; codecs=\"vp9\"",
            },
        }
    }
}

fn style(property: &'static str, value: &'static str) -> Probe {
    Probe::StyleSupport { property, value }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for feature in Feature::all() {
            assert_eq!(Feature::from_str(feature.as_str()), Some(*feature));
        }
        assert_eq!(Feature::from_str("teleport"), None);
    }

    #[test]
    fn test_serde_names_match() {
        let json = serde_json::to_string(&Feature::IntersectionObserver).unwrap();
        assert_eq!(json, "\"intersectionObserver\"");
        let parsed: Feature = serde_json::from_str("\"urlSearchParams\"").unwrap();
        assert_eq!(parsed, Feature::UrlSearchParams);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Feature::Fetch.kind(), FeatureKind::Script);
        assert_eq!(Feature::CssGrid.kind(), FeatureKind::Style);
        assert_eq!(Feature::Avif.kind(), FeatureKind::Media);
    }
}
