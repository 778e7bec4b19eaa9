mod interceptors;
mod random_strategy;

pub use interceptors::{LoggingInterceptor, MetricsInterceptor, TracingInterceptor};
pub use random_strategy::RandomRoutingStrategy;

use std::sync::Arc;

use crate::fan_in::FastestResponseFanIn;
use crate::registry;

/// Registers every reference `RoutingStrategy`/`FanIn` this crate ships
/// under their config-facing names. Embedders that only build component
/// graphs in code, never from `Config`, never need to call this.
pub fn register_builtins() {
    registry::register_routing_strategy("random", || Arc::new(RandomRoutingStrategy));
    registry::register_fan_in("fastest_response", || Arc::new(FastestResponseFanIn));
}
