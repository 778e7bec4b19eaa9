use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use rand::Rng;

use crate::component::Component;
use crate::context::DispatchContext;
use crate::error::FiberError;
use crate::labels::Labels;
use crate::request::Request;
use crate::routing_strategy::{RouteSelection, RoutingStrategy};

/// Reference [`RoutingStrategy`]: picks one route at random as primary, the
/// rest become fallbacks in map-iteration order. No labels are published.
pub struct RandomRoutingStrategy;

#[async_trait]
impl RoutingStrategy for RandomRoutingStrategy {
    async fn select_route(
        &self,
        _ctx: &DispatchContext,
        _req: &Arc<dyn Request>,
        routes: &IndexMap<String, Arc<dyn Component>>,
    ) -> Result<RouteSelection, FiberError> {
        if routes.is_empty() {
            return Ok(RouteSelection::new(None, Vec::new(), Labels::new()));
        }

        let pick = rand::rng().random_range(0..routes.len());
        let mut primary = None;
        let mut fallbacks = Vec::with_capacity(routes.len().saturating_sub(1));
        for (idx, route_id) in routes.keys().enumerate() {
            if idx == pick {
                primary = Some(route_id.clone());
            } else {
                fallbacks.push(route_id.clone());
            }
        }

        Ok(RouteSelection::new(primary, fallbacks, Labels::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::Caller;
    use crate::dispatcher::Dispatcher;
    use crate::protocol::Protocol;
    use crate::requests::GenericRequest;
    use crate::response::Response;
    use bytes::Bytes;

    struct NoopDispatcher;

    #[async_trait]
    impl Dispatcher for NoopDispatcher {
        async fn do_dispatch(&self, _req: Arc<dyn Request>) -> Response {
            Response::success(Vec::new())
        }
    }

    #[tokio::test]
    async fn selects_exactly_one_primary_and_the_rest_as_fallbacks() {
        let mut routes: IndexMap<String, Arc<dyn Component>> = IndexMap::new();
        for name in ["a", "b", "c"] {
            routes.insert(name.into(), Arc::new(Caller::new(name, Arc::new(NoopDispatcher))));
        }

        let ctx = DispatchContext::new("router", crate::component::ComponentKind::MultiRoute);
        let req: Arc<dyn Request> = Arc::new(GenericRequest::new(Protocol::Http, "op", Bytes::new()));

        let selection = RandomRoutingStrategy.select_route(&ctx, &req, &routes).await.unwrap();
        assert!(selection.primary.is_some());
        assert_eq!(selection.fallbacks.len(), 2);
        assert!(!selection.fallbacks.contains(selection.primary.as_ref().unwrap()));
    }

    #[tokio::test]
    async fn empty_routes_yields_empty_selection() {
        let routes: IndexMap<String, Arc<dyn Component>> = IndexMap::new();
        let ctx = DispatchContext::new("router", crate::component::ComponentKind::MultiRoute);
        let req: Arc<dyn Request> = Arc::new(GenericRequest::new(Protocol::Http, "op", Bytes::new()));

        let selection = RandomRoutingStrategy.select_route(&ctx, &req, &routes).await.unwrap();
        assert!(selection.primary.is_none());
        assert!(selection.ordered_routes().is_empty());
    }
}
