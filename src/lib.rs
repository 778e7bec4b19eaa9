//! An embeddable request-routing and response-aggregation library: proxies,
//! fan-out, combiners, and lazy/eager routers composed into a dispatch
//! graph that turns one incoming request into a replayable stream of
//! responses.
//!
//! The core abstraction is [`Component::dispatch`]: every node in the graph
//! — a [`Caller`] wrapping a backend client, a [`Proxy`] retargeting a
//! request, a [`FanOut`]/[`Combiner`] scattering across children, a
//! [`router::LazyRouter`]/[`router::EagerRouter`] picking among them —
//! exposes the same `dispatch(ctx, req) -> ResponseQueue` operation, and
//! composition is just nesting components inside one another.

mod backend;
mod caller;
mod combiner;
mod component;
mod config;
mod context;
mod dispatcher;
mod error;
mod extras;
mod fan_in;
mod fan_out;
mod interceptor;
mod labels;
mod multi_route;
mod protocol;
mod proxy;
mod queue;
mod registry;
mod request;
mod requests;
mod response;
mod router;
mod routing_strategy;

pub use backend::Backend;
pub use caller::Caller;
pub use combiner::Combiner;
pub use component::{BaseComponent, Component, ComponentKind};
pub use config::{build_component, CombinerConfig, ConfigNode, ConfigProtocol, PluginConfig, ProxyConfig, RouterConfig};
pub use context::DispatchContext;
pub use dispatcher::Dispatcher;
pub use error::{ErrorKind, FiberError};
pub use extras::{register_builtins, LoggingInterceptor, MetricsInterceptor, RandomRoutingStrategy, TracingInterceptor};
pub use fan_in::{FanIn, FastestResponseFanIn};
pub use fan_out::FanOut;
pub use interceptor::Interceptor;
pub use labels::Labels;
pub use multi_route::MultiRouteComponent;
pub use protocol::Protocol;
pub use proxy::Proxy;
pub use queue::ResponseQueue;
pub use registry::{fan_in, register_fan_in, register_routing_strategy, routing_strategy};
pub use request::{HeaderMap, Request};
pub use requests::GenericRequest;
pub use response::Response;
pub use router::{EagerRouter, LazyRouter};
pub use routing_strategy::{resolve_route_order, ResolvedOrder, RouteSelection, RoutingStrategy};
