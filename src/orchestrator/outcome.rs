//! Per-descriptor load states and outcomes

use crate::detection::Feature;
use crate::utils::CompatError;

/// States a single remediation passes through
///
/// `Idle -> LoadingRemote -> {VerifiedRemote | LoadingFallback}`,
/// `LoadingFallback -> {FallbackSuccess | Failed}`. `AlreadyLoaded` is reported
/// when the registry short-circuits the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    Idle,
    LoadingRemote,
    LoadingFallback,
    VerifiedRemote,
    FallbackSuccess,
    Failed,
    AlreadyLoaded,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LoadingRemote => "loading-remote",
            Self::LoadingFallback => "loading-fallback",
            Self::VerifiedRemote => "verified-remote-success",
            Self::FallbackSuccess => "fallback-success",
            Self::Failed => "failed",
            Self::AlreadyLoaded => "already-loaded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::VerifiedRemote | Self::FallbackSuccess | Self::Failed | Self::AlreadyLoaded
        )
    }
}

/// Result of loading one remediation
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub name: Feature,
    pub loaded: bool,
    pub used_fallback: bool,
    pub error: Option<CompatError>,
    /// Terminal state reached
    pub state: LoadState,
}

impl LoadOutcome {
    pub fn already_loaded(name: Feature) -> Self {
        Self {
            name,
            loaded: true,
            used_fallback: false,
            error: None,
            state: LoadState::AlreadyLoaded,
        }
    }

    pub fn remote(name: Feature) -> Self {
        Self {
            name,
            loaded: true,
            used_fallback: false,
            error: None,
            state: LoadState::VerifiedRemote,
        }
    }

    pub fn fallback(name: Feature) -> Self {
        Self {
            name,
            loaded: true,
            used_fallback: true,
            error: None,
            state: LoadState::FallbackSuccess,
        }
    }

    pub fn failed(name: Feature, error: CompatError) -> Self {
        Self {
            name,
            loaded: false,
            used_fallback: false,
            error: Some(error),
            state: LoadState::Failed,
        }
    }
}
