//! Polyfill Orchestrator
//!
//! Loads the remediations a profile needs. Each descriptor runs its own
//! remote -> verify -> fallback -> verify chain; all chains run concurrently
//! and the call resolves once every one has settled. Concurrent requests for
//! the same feature share a single attempt through the [`LoadRegistry`].

mod outcome;
mod registry;

pub use outcome::{LoadOutcome, LoadState};
pub use registry::{Claim, LoadRegistry, SharedLoad};

use crate::catalog::RemediationDescriptor;
use crate::environment::{Environment, EnvironmentProber, InlineResource, ResourceRequest};
use crate::utils::{CompatError, LoadStage, Result};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use std::sync::Arc;
use std::time::Duration;

/// Deadline for a remote load unless configured otherwise
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads remediations with dedup, timeout and fallback
pub struct PolyfillOrchestrator {
    env: Arc<dyn Environment>,
    prober: EnvironmentProber,
    registry: Arc<LoadRegistry>,
    timeout: Duration,
}

impl PolyfillOrchestrator {
    pub fn new(env: Arc<dyn Environment>, registry: Arc<LoadRegistry>) -> Self {
        let prober = EnvironmentProber::new(Arc::clone(&env));
        Self {
            env,
            prober,
            registry,
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<LoadRegistry> {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load every requested remediation
    ///
    /// Returns exactly one outcome per descriptor, in input order. Failures
    /// are reported inside the outcomes and never abort the other loads.
    pub async fn load(&self, requested: &[RemediationDescriptor]) -> Vec<LoadOutcome> {
        let pending: Vec<BoxFuture<'static, LoadOutcome>> =
            requested.iter().map(|d| self.load_one(d)).collect();
        future::join_all(pending).await
    }

    fn load_one(&self, descriptor: &RemediationDescriptor) -> BoxFuture<'static, LoadOutcome> {
        let name = descriptor.name;
        let claim = self.registry.claim(name, |generation| {
            let attempt = LoadAttempt {
                env: Arc::clone(&self.env),
                prober: self.prober.clone(),
                registry: Arc::clone(&self.registry),
                descriptor: descriptor.clone(),
                timeout: self.timeout,
                generation,
            };
            attempt.run().boxed()
        });

        match claim {
            Claim::Loaded => {
                log::debug!("{}: already loaded", name);
                future::ready(LoadOutcome::already_loaded(name)).boxed()
            }
            Claim::Join(shared) => {
                log::debug!("{}: joining in-flight load", name);
                shared.boxed()
            }
            Claim::Started(shared) => shared.boxed(),
        }
    }
}

/// One run of a descriptor's state machine
struct LoadAttempt {
    env: Arc<dyn Environment>,
    prober: EnvironmentProber,
    registry: Arc<LoadRegistry>,
    descriptor: RemediationDescriptor,
    timeout: Duration,
    generation: u64,
}

impl LoadAttempt {
    async fn run(self) -> LoadOutcome {
        let name = self.descriptor.name;
        self.transition(LoadState::Idle, LoadState::LoadingRemote);

        let cause = match self.load_remote().await {
            Ok(()) if self.verify() => {
                self.transition(LoadState::LoadingRemote, LoadState::VerifiedRemote);
                self.registry.settle(name, true, self.generation);
                return LoadOutcome::remote(name);
            }
            Ok(()) => {
                self.env.remove_resource(&self.descriptor.element_id());
                CompatError::VerificationFailed {
                    feature: name.to_string(),
                    stage: LoadStage::Remote,
                }
            }
            Err(e) => e,
        };

        log::info!("{}: remote copy unusable ({}), trying local fallback", name, cause);
        self.transition(LoadState::LoadingRemote, LoadState::LoadingFallback);

        let outcome = self.apply_fallback();
        self.transition(LoadState::LoadingFallback, outcome.state);
        if let Some(error) = &outcome.error {
            log::warn!("{}: left unremediated: {}", name, error);
        }

        self.registry.settle(name, outcome.loaded, self.generation);
        outcome
    }

    /// Inject the remote copy, racing it against the deadline
    async fn load_remote(&self) -> Result<()> {
        let request = ResourceRequest {
            id: self.descriptor.element_id(),
            url: self.descriptor.remote_url.clone(),
            kind: self.descriptor.kind,
            integrity: self.descriptor.integrity.clone(),
        };

        let result = match tokio::time::timeout(self.timeout, self.env.inject_remote_resource(&request)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(CompatError::RemoteLoadNetworkFailure { url, reason })) => {
                Err(CompatError::RemoteLoadNetworkFailure { url, reason })
            }
            Ok(Err(other)) => Err(CompatError::RemoteLoadNetworkFailure {
                url: request.url.clone(),
                reason: other.to_string(),
            }),
            Err(_) => Err(CompatError::RemoteLoadTimeout {
                url: request.url.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        self.env.remove_resource(&request.id);
        result
    }

    fn apply_fallback(&self) -> LoadOutcome {
        let name = self.descriptor.name;
        let Some(fallback) = self.descriptor.fallback else {
            return LoadOutcome::failed(
                name,
                CompatError::FallbackUnavailable {
                    feature: name.to_string(),
                },
            );
        };

        let inline = InlineResource {
            id: self.descriptor.element_id(),
            kind: self.descriptor.kind,
            source: fallback.inline_source(),
        };
        if let Err(e) = self.env.inject_inline(&inline) {
            return LoadOutcome::failed(name, e);
        }

        if self.verify() {
            log::info!("{}: installed local fallback", name);
            LoadOutcome::fallback(name)
        } else {
            self.env.remove_resource(&inline.id);
            LoadOutcome::failed(
                name,
                CompatError::VerificationFailed {
                    feature: name.to_string(),
                    stage: LoadStage::Fallback,
                },
            )
        }
    }

    fn verify(&self) -> bool {
        let verified = self.prober.check(&self.descriptor.verify);
        log::debug!(
            "{}: verify {} -> {}",
            self.descriptor.name,
            self.descriptor.verify.label(),
            verified
        );
        verified
    }

    fn transition(&self, from: LoadState, to: LoadState) {
        log::debug!("{}: {} -> {}", self.descriptor.name, from.as_str(), to.as_str());
    }
}
