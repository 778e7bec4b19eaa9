use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::backend::Backend;
use crate::caller::Caller;
use crate::combiner::Combiner;
use crate::component::Component;
use crate::dispatcher::Dispatcher;
use crate::error::FiberError;
use crate::protocol::Protocol;
use crate::proxy::Proxy;
use crate::registry;
use crate::router::{EagerRouter, LazyRouter};

/// Default HTTP client timeout applied to a `PROXY` node that omits
/// `timeout`, matching `config.DefaultClientTimeout` in the original.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(1);

/// One node of the config tree, tagged by its `type` field. Unknown `type`
/// values fail deserialization rather than silently falling through to a
/// default variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ConfigNode {
    #[serde(rename = "PROXY")]
    Proxy(ProxyConfig),
    #[serde(rename = "EAGER_ROUTER")]
    EagerRouter(RouterConfig),
    #[serde(rename = "LAZY_ROUTER")]
    LazyRouter(RouterConfig),
    #[serde(rename = "COMBINER")]
    Combiner(CombinerConfig),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigProtocol {
    #[default]
    Http,
    Grpc,
}

impl From<ConfigProtocol> for Protocol {
    fn from(value: ConfigProtocol) -> Self {
        match value {
            ConfigProtocol::Http => Protocol::Http,
            ConfigProtocol::Grpc => Protocol::Grpc,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub id: String,
    pub endpoint: String,
    #[serde(default, with = "humantime_serde::option")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub protocol: ConfigProtocol,
    pub service: Option<String>,
    pub method: Option<String>,
    pub service_method: Option<String>,
}

impl ProxyConfig {
    pub fn timeout_or_default(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_CLIENT_TIMEOUT)
    }
}

/// A plugin reference: a registry name plus opaque properties passed
/// through to whatever the registered constructor needs. This crate's
/// registry constructors are zero-argument (see `registry.rs`); properties
/// are carried here for forward compatibility with plugins that parse
/// their own configuration out of it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    pub id: String,
    pub routes: Vec<ConfigNode>,
    pub strategy: PluginConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CombinerConfig {
    pub id: String,
    pub routes: Vec<ConfigNode>,
    pub fan_in: PluginConfig,
}

/// Builds a live [`Component`] graph out of a [`ConfigNode`] tree.
///
/// Wire dispatchers (the HTTP/gRPC client a `PROXY` leaf ultimately calls)
/// stay out of this crate's scope, so the caller supplies `dispatcher_for`
/// to construct one from a `ProxyConfig` — mirroring how the original's
/// `config.go` reaches for `grpc.NewDispatcher`/`fiberHTTP.NewDispatcher`,
/// just injected here instead of hard-coded.
pub fn build_component(
    node: &ConfigNode,
    dispatcher_for: &dyn Fn(&ProxyConfig) -> Result<Arc<dyn Dispatcher>, FiberError>,
) -> Result<Arc<dyn Component>, FiberError> {
    match node {
        ConfigNode::Proxy(cfg) => build_proxy(cfg, dispatcher_for),
        ConfigNode::EagerRouter(cfg) => {
            let routes = build_routes(&cfg.routes, dispatcher_for)?;
            let strategy = registry::routing_strategy(&cfg.strategy.kind)
                .ok_or_else(|| FiberError::invalid_input(Protocol::Http, format!("unknown routing strategy: {}", cfg.strategy.kind)))?;
            Ok(Arc::new(EagerRouter::new(cfg.id.clone(), routes, strategy)))
        }
        ConfigNode::LazyRouter(cfg) => {
            let routes = build_routes(&cfg.routes, dispatcher_for)?;
            let strategy = registry::routing_strategy(&cfg.strategy.kind)
                .ok_or_else(|| FiberError::invalid_input(Protocol::Http, format!("unknown routing strategy: {}", cfg.strategy.kind)))?;
            Ok(Arc::new(LazyRouter::new(cfg.id.clone(), routes, strategy)))
        }
        ConfigNode::Combiner(cfg) => {
            let routes = build_routes(&cfg.routes, dispatcher_for)?;
            let fan_in = registry::fan_in(&cfg.fan_in.kind)
                .ok_or_else(|| FiberError::invalid_input(Protocol::Http, format!("unknown fan-in: {}", cfg.fan_in.kind)))?;
            Ok(Arc::new(Combiner::new(cfg.id.clone(), routes, fan_in)))
        }
    }
}

fn build_proxy(
    cfg: &ProxyConfig,
    dispatcher_for: &dyn Fn(&ProxyConfig) -> Result<Arc<dyn Dispatcher>, FiberError>,
) -> Result<Arc<dyn Component>, FiberError> {
    let dispatcher = dispatcher_for(cfg)?;
    let caller = Arc::new(Caller::new(cfg.id.clone(), dispatcher));
    let backend = Backend::new(cfg.id.clone(), cfg.endpoint.clone());
    Ok(Arc::new(Proxy::new(backend, caller)))
}

fn build_routes(
    nodes: &[ConfigNode],
    dispatcher_for: &dyn Fn(&ProxyConfig) -> Result<Arc<dyn Dispatcher>, FiberError>,
) -> Result<IndexMap<String, Arc<dyn Component>>, FiberError> {
    let mut routes = IndexMap::with_capacity(nodes.len());
    for node in nodes {
        let component = build_component(node, dispatcher_for)?;
        routes.insert(component.id().to_string(), component);
    }
    Ok(routes)
}
