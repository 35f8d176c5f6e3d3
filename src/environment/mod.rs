//! Host environment capabilities
//!
//! The compatibility layer never binds to a concrete browser API. Everything it
//! needs from the page (identity string, support queries, resource injection)
//! arrives through the [`Environment`] trait, so the same code runs in a real
//! page binding, in server-side planning, and under test.

mod prober;
mod simulated;

pub use prober::{EnvironmentProber, Probe};
pub use simulated::{RemoteBehavior, SimulatedEnvironment};

use crate::utils::Result;
use futures::future::BoxFuture;

/// Kind of resource element injected into the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `<script>` element
    Script,
    /// `<link rel=stylesheet>` or `<style>` element
    Stylesheet,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "style",
        }
    }
}

/// Media element used for format probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Offscreen canvas encode (`toDataURL`)
    Image,
    /// `<video>` `canPlayType`
    Video,
    /// `<audio>` `canPlayType`
    Audio,
}

/// A remote resource to inject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Element id, used to find and remove the element later
    pub id: String,
    /// Absolute URL of the resource
    pub url: String,
    pub kind: ResourceKind,
    /// Subresource Integrity attribute, if known
    pub integrity: Option<String>,
}

/// An inline resource (script text or style text) to inject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineResource {
    pub id: String,
    pub kind: ResourceKind,
    pub source: String,
}

/// Capabilities the hosting page must provide
///
/// Methods returning `Result` may fail for any host-specific reason; callers in
/// this crate treat a failed check as "unsupported" rather than propagating it.
#[cfg_attr(test, mockall::automock)]
pub trait Environment: Send + Sync {
    /// Raw client identity string (user agent)
    fn identify(&self) -> String;

    /// Whether a document/window exists at all
    fn document_available(&self) -> bool;

    /// Whether a global API path (e.g. `fetch`, `Object.assign`) resolves
    fn has_global(&self, path: &str) -> Result<bool>;

    /// Native style-support query (`CSS.supports`)
    fn query_style_support(&self, property: &str, value: &str) -> Result<bool>;

    /// Set the property on a detached style object and read it back
    fn style_roundtrip(&self, property: &str, value: &str) -> Result<bool>;

    /// Encode or query a media format and return the identifier string the
    /// host produced (a data URL prefix for images, a `canPlayType` answer for
    /// audio/video)
    fn probe_media_format(&self, kind: MediaKind, format: &str) -> Result<String>;

    /// Inject a remote resource; resolves once the element fires load or error
    fn inject_remote_resource(&self, request: &ResourceRequest) -> BoxFuture<'static, Result<()>>;

    /// Inject inline script or style text synchronously
    fn inject_inline(&self, resource: &InlineResource) -> Result<()>;

    /// Remove a previously injected element, if still present
    fn remove_resource(&self, id: &str);

    /// Whether an element with the given id is attached
    fn has_resource(&self, id: &str) -> bool;
}
