use std::sync::Arc;

use indexmap::IndexMap;

use crate::component::Component;

/// The structural sub-kind every route-owning component implements:
/// [`crate::FanOut`], [`crate::Combiner`] (via its inner `FanOut`), and the
/// Lazy/Eager routers. Exists for introspection — enumerating a graph's
/// route-ids without downcasting to a concrete component type.
pub trait MultiRouteComponent: Component {
    fn routes(&self) -> &IndexMap<String, Arc<dyn Component>>;
}
