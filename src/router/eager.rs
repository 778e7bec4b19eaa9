use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::FusedFuture;
use futures::{FutureExt, StreamExt};
use indexmap::IndexMap;

use crate::component::{BaseComponent, Component, ComponentKind};
use crate::context::DispatchContext;
use crate::error::FiberError;
use crate::fan_out::FanOut;
use crate::queue::ResponseQueue;
use crate::request::Request;
use crate::response::Response;
use crate::routing_strategy::{resolve_route_order, RoutingStrategy};

/// Concurrent scatter + ranked-pick fan-in: every route is dispatched at
/// once, and the first strategy-preferred route to succeed wins even if a
/// lower-priority fallback answers sooner, as long as the preferred route's
/// upstream hasn't closed yet.
pub struct EagerRouter {
    base: BaseComponent,
    fan_out: FanOut,
    routes: IndexMap<String, Arc<dyn Component>>,
    strategy: Arc<dyn RoutingStrategy>,
}

impl EagerRouter {
    pub fn new(
        id: impl Into<String>,
        routes: IndexMap<String, Arc<dyn Component>>,
        strategy: Arc<dyn RoutingStrategy>,
    ) -> Self {
        let id = id.into();
        Self {
            base: BaseComponent::new(id.clone(), ComponentKind::MultiRoute),
            fan_out: FanOut::new(id, routes.clone()),
            routes,
            strategy,
        }
    }

    pub fn with_interceptor(self, interceptor: Arc<dyn crate::interceptor::Interceptor>) -> Self {
        self.base.add_interceptor(interceptor);
        self
    }
}

#[async_trait]
impl Component for EagerRouter {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn kind(&self) -> ComponentKind {
        self.base.kind()
    }

    async fn dispatch(&self, ctx: DispatchContext, req: Arc<dyn Request>) -> Arc<ResponseQueue> {
        let ctx = self.base.before_dispatch(ctx, &req).await;

        let fan_out_queue = self.fan_out.dispatch(ctx.clone(), Arc::clone(&req)).await;
        let result = run_eager_select(
            ctx.clone(),
            Arc::clone(&req),
            Arc::clone(&self.strategy),
            self.routes.clone(),
            fan_out_queue,
        )
        .await;

        let queue = Arc::new(ResponseQueue::from_responses(vec![result]));

        self.base.after_dispatch(&ctx, &req, &queue);
        self.base.after_completion(&ctx, &req, &queue);
        queue
    }
}

impl crate::multi_route::MultiRouteComponent for EagerRouter {
    fn routes(&self) -> &IndexMap<String, Arc<dyn Component>> {
        &self.routes
    }
}

async fn run_eager_select(
    ctx: DispatchContext,
    req: Arc<dyn Request>,
    strategy: Arc<dyn RoutingStrategy>,
    routes: IndexMap<String, Arc<dyn Component>>,
    fan_out_queue: Arc<ResponseQueue>,
) -> Response {
    let protocol = req.protocol();
    let mut response_stream = Box::pin(fan_out_queue.iter());
    let mut responses: HashMap<String, Response> = HashMap::new();
    let mut responses_open = true;

    let mut order_fut = Box::pin(resolve_route_order(strategy, ctx.clone(), req.clone_request(), routes).fuse());
    let mut order: Option<Vec<String>> = None;
    let mut idx = 0usize;

    loop {
        if let Some(ord) = &order {
            loop {
                if idx >= ord.len() {
                    return if ord.is_empty() {
                        Response::from_error(&FiberError::router_strategy_returned_empty_routes(protocol))
                    } else {
                        Response::from_error(&FiberError::service_unavailable(protocol))
                    };
                }
                let route_id = &ord[idx];
                match responses.get(route_id) {
                    Some(resp) if resp.is_success() => {
                        // The master response is known; any fan-out children
                        // still in flight are no longer useful.
                        ctx.cancel();
                        return resp.clone();
                    }
                    Some(_) => {
                        idx += 1;
                        continue;
                    }
                    None => {
                        if responses_open {
                            break;
                        } else {
                            idx += 1;
                            continue;
                        }
                    }
                }
            }
        }

        tokio::select! {
            biased;
            _ = ctx.cancellation_token().cancelled() => {
                return Response::from_error(&FiberError::request_failed(protocol, "context cancelled"));
            }
            _ = ctx.sleep_until_deadline() => {
                if order.is_none() {
                    return Response::from_error(&FiberError::router_strategy_timeout_exceeded(protocol));
                }
                responses_open = false;
            }
            maybe_resp = response_stream.next(), if responses_open => {
                match maybe_resp {
                    Some(resp) => {
                        if let Some(name) = resp.backend_name() {
                            responses.insert(name.to_string(), resp);
                        }
                    }
                    None => responses_open = false,
                }
            }
            result = &mut order_fut, if !order_fut.is_terminated() => {
                match result {
                    Ok(Ok(resolved)) => order = Some(resolved.order),
                    Ok(Err(err)) => return Response::from_error(&err),
                    Err(_) => return Response::from_error(&FiberError::request_failed(protocol, "routing strategy task dropped")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::Caller;
    use crate::dispatcher::Dispatcher;
    use crate::labels::Labels;
    use crate::protocol::Protocol;
    use crate::requests::GenericRequest;
    use crate::routing_strategy::RouteSelection;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;

    struct DelayedDispatcher {
        delay: Duration,
        succeed: bool,
        payload: &'static str,
    }

    #[async_trait]
    impl Dispatcher for DelayedDispatcher {
        async fn do_dispatch(&self, _req: Arc<dyn Request>) -> Response {
            tokio::time::sleep(self.delay).await;
            if self.succeed {
                Response::success(self.payload.as_bytes().to_vec())
            } else {
                Response::from_error(&FiberError::request_failed(Protocol::Http, "down"))
            }
        }
    }

    struct FixedOrderStrategy(Vec<String>);

    #[async_trait]
    impl RoutingStrategy for FixedOrderStrategy {
        async fn select_route(
            &self,
            _ctx: &DispatchContext,
            _req: &Arc<dyn Request>,
            _routes: &IndexMap<String, Arc<dyn Component>>,
        ) -> Result<RouteSelection, FiberError> {
            Ok(RouteSelection::new(None, self.0.clone(), Labels::new()))
        }
    }

    fn test_req() -> Arc<dyn Request> {
        Arc::new(GenericRequest::new(Protocol::Http, "op", Bytes::new()))
    }

    #[tokio::test]
    async fn preferred_route_wins_even_when_slower() {
        let mut routes: IndexMap<String, Arc<dyn Component>> = IndexMap::new();
        routes.insert(
            "route-a".into(),
            Arc::new(Caller::new(
                "route-a",
                Arc::new(DelayedDispatcher {
                    delay: Duration::from_millis(30),
                    succeed: true,
                    payload: "A-OK",
                }),
            )),
        );
        routes.insert(
            "route-b".into(),
            Arc::new(Caller::new(
                "route-b",
                Arc::new(DelayedDispatcher {
                    delay: Duration::from_millis(1),
                    succeed: true,
                    payload: "B-OK",
                }),
            )),
        );

        let strategy = Arc::new(FixedOrderStrategy(vec!["route-a".into(), "route-b".into()]));
        let router = EagerRouter::new("eager", routes, strategy);
        let ctx = DispatchContext::new("eager", ComponentKind::MultiRoute)
            .with_timeout(Duration::from_millis(200));

        let queue = router.dispatch(ctx, test_req()).await;
        let responses: Vec<_> = futures::StreamExt::collect(queue.iter()).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].payload(), b"A-OK");
    }

    #[tokio::test]
    async fn falls_back_when_preferred_route_fails() {
        let mut routes: IndexMap<String, Arc<dyn Component>> = IndexMap::new();
        routes.insert(
            "route-a".into(),
            Arc::new(Caller::new(
                "route-a",
                Arc::new(DelayedDispatcher {
                    delay: Duration::from_millis(1),
                    succeed: false,
                    payload: "",
                }),
            )),
        );
        routes.insert(
            "route-b".into(),
            Arc::new(Caller::new(
                "route-b",
                Arc::new(DelayedDispatcher {
                    delay: Duration::from_millis(1),
                    succeed: true,
                    payload: "B-OK",
                }),
            )),
        );

        let strategy = Arc::new(FixedOrderStrategy(vec!["route-a".into(), "route-b".into()]));
        let router = EagerRouter::new("eager", routes, strategy);
        let ctx = DispatchContext::new("eager", ComponentKind::MultiRoute)
            .with_timeout(Duration::from_millis(200));

        let queue = router.dispatch(ctx, test_req()).await;
        let responses: Vec<_> = futures::StreamExt::collect(queue.iter()).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].payload(), b"B-OK");
    }
}
