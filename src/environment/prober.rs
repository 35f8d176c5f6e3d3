//! Environment Prober - atomic yes/no capability checks
//!
//! Every check is side-effect free on the visible document and never fails:
//! an error from the host is logged as a degraded detection and reported as
//! "unsupported". Without a document every check answers `true`, so output
//! rendered on a server is never penalized.

use super::{Environment, MediaKind};
use crate::utils::CompatError;
use std::sync::Arc;

/// A single capability check
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Probe {
    /// A global API path resolves (e.g. `IntersectionObserver`)
    ApiPresence(&'static str),
    /// A property/value pair is accepted by the style engine
    StyleSupport {
        property: &'static str,
        value: &'static str,
    },
    /// A media format is encodable or playable
    MediaFormat {
        kind: MediaKind,
        format: &'static str,
    },
    /// An injected element with this id is attached
    ResourcePresent(String),
}

impl Probe {
    /// Short label used in logs
    pub fn label(&self) -> String {
        match self {
            Self::ApiPresence(path) => format!("api:{}", path),
            Self::StyleSupport { property, value } => format!("style:{}:{}", property, value),
            Self::MediaFormat { format, .. } => format!("media:{}", format),
            Self::ResourcePresent(id) => format!("resource:{}", id),
        }
    }
}

/// Runs probes against an injected environment
#[derive(Clone)]
pub struct EnvironmentProber {
    env: Arc<dyn Environment>,
}

impl EnvironmentProber {
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self { env }
    }

    /// Run a probe, collapsing every failure into `false`
    pub fn check(&self, probe: &Probe) -> bool {
        if !self.env.document_available() {
            return true;
        }

        match probe {
            Probe::ApiPresence(path) => self.api_present(path),
            Probe::StyleSupport { property, value } => self.style_supported(property, value),
            Probe::MediaFormat { kind, format } => self.media_format_supported(*kind, format),
            Probe::ResourcePresent(id) => self.env.has_resource(id),
        }
    }

    /// Global API presence check
    pub fn api_present(&self, path: &str) -> bool {
        match self.env.has_global(path) {
            Ok(present) => present,
            Err(e) => degraded(&format!("api:{}", path), e),
        }
    }

    /// Style support: native query first, detached style object second
    pub fn style_supported(&self, property: &str, value: &str) -> bool {
        match self.env.query_style_support(property, value) {
            Ok(supported) => supported,
            Err(query_err) => {
                log::debug!(
                    "style query for {}:{} unavailable ({}), trying roundtrip",
                    property,
                    value,
                    query_err
                );
                match self.env.style_roundtrip(property, value) {
                    Ok(supported) => supported,
                    Err(e) => degraded(&format!("style:{}:{}", property, value), e),
                }
            }
        }
    }

    /// Media format check based on the identifier string the host returns
    pub fn media_format_supported(&self, kind: MediaKind, format: &str) -> bool {
        let answer = match self.env.probe_media_format(kind, format) {
            Ok(answer) => answer,
            Err(e) => return degraded(&format!("media:{}", format), e),
        };

        match kind {
            // Canvas falls back to image/png for formats it cannot encode
            MediaKind::Image => answer.starts_with(&format!("data:{}", format)),
            MediaKind::Video | MediaKind::Audio => {
                matches!(answer.trim(), "probably" | "maybe")
            }
        }
    }
}

fn degraded(probe: &str, err: CompatError) -> bool {
    let degraded = CompatError::DetectionDegraded {
        probe: probe.to_string(),
        reason: err.to_string(),
    };
    log::debug!("{}", degraded);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MockEnvironment;

    fn browser_mock() -> MockEnvironment {
        let mut env = MockEnvironment::new();
        env.expect_document_available().return_const(true);
        env
    }

    #[test]
    fn test_api_presence() {
        let mut env = browser_mock();
        env.expect_has_global()
            .returning(|path| Ok(path == "fetch"));

        let prober = EnvironmentProber::new(Arc::new(env));
        assert!(prober.check(&Probe::ApiPresence("fetch")));
        assert!(!prober.check(&Probe::ApiPresence("IntersectionObserver")));
    }

    #[test]
    fn test_host_error_is_unsupported() {
        let mut env = browser_mock();
        env.expect_has_global()
            .returning(|_| Err(CompatError::Injection("window access denied".to_string())));

        let prober = EnvironmentProber::new(Arc::new(env));
        assert!(!prober.check(&Probe::ApiPresence("fetch")));
    }

    #[test]
    fn test_style_falls_back_to_roundtrip() {
        let mut env = browser_mock();
        env.expect_query_style_support()
            .returning(|_, _| Err(CompatError::Injection("no CSS.supports".to_string())));
        env.expect_style_roundtrip()
            .times(1)
            .returning(|property, _| Ok(property == "position"));

        let prober = EnvironmentProber::new(Arc::new(env));
        assert!(prober.check(&Probe::StyleSupport {
            property: "position",
            value: "sticky",
        }));
    }

    #[test]
    fn test_style_query_skips_roundtrip_when_available() {
        let mut env = browser_mock();
        env.expect_query_style_support().returning(|_, _| Ok(false));
        env.expect_style_roundtrip().never();

        let prober = EnvironmentProber::new(Arc::new(env));
        assert!(!prober.style_supported("display", "grid"));
    }

    #[test]
    fn test_image_format_checks_identifier() {
        let mut env = browser_mock();
        env.expect_probe_media_format()
            .returning(|_, format| {
                if format == "image/webp" {
                    Ok("data:image/webp;base64,UklGR".to_string())
                } else {
                    Ok("data:image/png;base64,iVBOR".to_string())
                }
            });

        let prober = EnvironmentProber::new(Arc::new(env));
        assert!(prober.media_format_supported(MediaKind::Image, "image/webp"));
        assert!(!prober.media_format_supported(MediaKind::Image, "image/avif"));
    }

    #[test]
    fn test_video_format_answers() {
        let mut env = browser_mock();
        env.expect_probe_media_format()
            .returning(|_, format| Ok(if format.contains("webm") { "maybe" } else { "" }.to_string()));

        let prober = EnvironmentProber::new(Arc::new(env));
        assert!(prober.media_format_supported(MediaKind::Video, "video/webm"));
        assert!(!prober.media_format_supported(MediaKind::Video, "video/ogg"));
    }

    #[test]
    fn test_no_document_assumes_supported() {
        let mut env = MockEnvironment::new();
        env.expect_document_available().return_const(false);
        env.expect_has_global().never();

        let prober = EnvironmentProber::new(Arc::new(env));
        assert!(prober.check(&Probe::ApiPresence("fetch")));
        assert!(prober.check(&Probe::StyleSupport {
            property: "display",
            value: "grid",
        }));
    }
}
