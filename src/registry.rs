use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::fan_in::FanIn;
use crate::routing_strategy::RoutingStrategy;

type StrategyCtor = Arc<dyn Fn() -> Arc<dyn RoutingStrategy> + Send + Sync>;
type FanInCtor = Arc<dyn Fn() -> Arc<dyn FanIn> + Send + Sync>;

static STRATEGIES: Lazy<Mutex<HashMap<String, StrategyCtor>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static FAN_INS: Lazy<Mutex<HashMap<String, FanInCtor>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Registers a named constructor for a [`RoutingStrategy`]. Config-driven
/// component construction resolves `strategy.type` through this registry
/// rather than the router logic hard-coding concrete types, mirroring
/// `types.go` in the original.
pub fn register_routing_strategy(
    name: impl Into<String>,
    ctor: impl Fn() -> Arc<dyn RoutingStrategy> + Send + Sync + 'static,
) {
    STRATEGIES.lock().insert(name.into(), Arc::new(ctor));
}

/// Registers a named constructor for a [`FanIn`].
pub fn register_fan_in(name: impl Into<String>, ctor: impl Fn() -> Arc<dyn FanIn> + Send + Sync + 'static) {
    FAN_INS.lock().insert(name.into(), Arc::new(ctor));
}

pub fn routing_strategy(name: &str) -> Option<Arc<dyn RoutingStrategy>> {
    STRATEGIES.lock().get(name).map(|ctor| ctor())
}

pub fn fan_in(name: &str) -> Option<Arc<dyn FanIn>> {
    FAN_INS.lock().get(name).map(|ctor| ctor())
}
