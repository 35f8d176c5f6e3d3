//! In-memory host environment
//!
//! Used for server-side planning (where a document never exists), by the CLI,
//! and throughout the tests. Inline scripts install globals listed in their
//! `/*! provides: ... */` banner, which every shim in the catalog carries.

use super::{Environment, InlineResource, MediaKind, ResourceKind, ResourceRequest};
use crate::detection::Feature;
use crate::environment::Probe;
use crate::utils::{CompatError, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How the simulated network answers a remote resource URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteBehavior {
    /// Loads and installs the given globals
    Serve(Vec<String>),
    /// Loads but installs nothing
    Broken,
    /// Fires the error event
    Fail,
    /// Never settles
    Hang,
}

#[derive(Debug, Default)]
struct State {
    globals: HashSet<String>,
    styles: HashSet<(String, String)>,
    media: HashMap<String, String>,
    remote: HashMap<String, RemoteBehavior>,
    attached: HashSet<String>,
    injections: HashMap<String, usize>,
}

/// Configurable stand-in for a browser page
#[derive(Clone)]
pub struct SimulatedEnvironment {
    user_agent: String,
    document: bool,
    style_query_api: bool,
    latency: Duration,
    state: Arc<Mutex<State>>,
}

impl SimulatedEnvironment {
    /// A page with the given identity string and no capabilities
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            document: true,
            style_query_api: true,
            latency: Duration::ZERO,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// A context without any document, as during server rendering
    pub fn server() -> Self {
        let mut env = Self::new("");
        env.document = false;
        env
    }

    /// Satisfy the detection probe of every listed feature
    pub fn supporting(self, features: &[Feature]) -> Self {
        {
            let mut state = self.lock();
            for feature in features {
                match feature.probe() {
                    Probe::ApiPresence(path) => {
                        state.globals.insert(path.to_string());
                    }
                    Probe::StyleSupport { property, value } => {
                        state.styles.insert((property.to_string(), value.to_string()));
                    }
                    Probe::MediaFormat { kind, format } => {
                        let answer = match kind {
                            MediaKind::Image => format!("data:{};base64,AAAA", format),
                            MediaKind::Video | MediaKind::Audio => "probably".to_string(),
                        };
                        state.media.insert(format.to_string(), answer);
                    }
                    Probe::ResourcePresent(id) => {
                        state.attached.insert(id);
                    }
                }
            }
        }
        self
    }

    /// Define a global API path
    pub fn with_global(self, path: &str) -> Self {
        self.lock().globals.insert(path.to_string());
        self
    }

    /// Hide `CSS.supports`, forcing the detached style roundtrip
    pub fn without_style_query(mut self) -> Self {
        self.style_query_api = false;
        self
    }

    /// Route a remote URL to a behavior
    pub fn with_remote(self, url: &str, behavior: RemoteBehavior) -> Self {
        self.lock().remote.insert(url.to_string(), behavior);
        self
    }

    /// Delay every remote load by a fixed latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of remote injections attempted for a URL
    pub fn injection_count(&self, url: &str) -> usize {
        self.lock().injections.get(url).copied().unwrap_or(0)
    }

    /// Total remote injections attempted
    pub fn total_injections(&self) -> usize {
        self.lock().injections.values().sum()
    }

    /// Ids of all attached elements
    pub fn attached_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().attached.iter().cloned().collect();
        ids.sort();
        ids
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Globals listed in a shim's `/*! provides: a b c */` banner
fn provided_globals(source: &str) -> Vec<String> {
    source
        .lines()
        .next()
        .and_then(|line| line.trim().strip_prefix("/*! provides:"))
        .and_then(|rest| rest.strip_suffix("*/"))
        .map(|list| list.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

impl Environment for SimulatedEnvironment {
    fn identify(&self) -> String {
        self.user_agent.clone()
    }

    fn document_available(&self) -> bool {
        self.document
    }

    fn has_global(&self, path: &str) -> Result<bool> {
        Ok(self.lock().globals.contains(path))
    }

    fn query_style_support(&self, property: &str, value: &str) -> Result<bool> {
        if !self.style_query_api {
            return Err(CompatError::Injection("CSS.supports is not defined".to_string()));
        }
        Ok(self.lock().styles.contains(&(property.to_string(), value.to_string())))
    }

    fn style_roundtrip(&self, property: &str, value: &str) -> Result<bool> {
        Ok(self.lock().styles.contains(&(property.to_string(), value.to_string())))
    }

    fn probe_media_format(&self, kind: MediaKind, format: &str) -> Result<String> {
        let state = self.lock();
        Ok(match state.media.get(format) {
            Some(answer) => answer.clone(),
            None => match kind {
                MediaKind::Image => "data:image/png;base64,AAAA".to_string(),
                MediaKind::Video | MediaKind::Audio => String::new(),
            },
        })
    }

    fn inject_remote_resource(&self, request: &ResourceRequest) -> BoxFuture<'static, Result<()>> {
        let behavior = {
            let mut state = self.lock();
            *state.injections.entry(request.url.clone()).or_insert(0) += 1;
            state.attached.insert(request.id.clone());
            state.remote.get(&request.url).cloned().unwrap_or(RemoteBehavior::Fail)
        };

        let state = Arc::clone(&self.state);
        let latency = self.latency;
        let request = request.clone();

        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            match behavior {
                RemoteBehavior::Serve(globals) => {
                    {
                        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                        state.globals.extend(globals);
                    }
                    Ok(())
                }
                RemoteBehavior::Broken => Ok(()),
                RemoteBehavior::Fail => Err(CompatError::RemoteLoadNetworkFailure {
                    url: request.url,
                    reason: "error event fired".to_string(),
                }),
                RemoteBehavior::Hang => futures::future::pending().await,
            }
        }
        .boxed()
    }

    fn inject_inline(&self, resource: &InlineResource) -> Result<()> {
        if !self.document {
            return Err(CompatError::Injection("no document to inject into".to_string()));
        }
        let mut state = self.lock();
        if resource.kind == ResourceKind::Script {
            state.globals.extend(provided_globals(&resource.source));
        }
        state.attached.insert(resource.id.clone());
        Ok(())
    }

    fn remove_resource(&self, id: &str) {
        self.lock().attached.remove(id);
    }

    fn has_resource(&self, id: &str) -> bool {
        self.lock().attached.contains(id)
    }
}
