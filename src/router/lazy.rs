use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use indexmap::IndexMap;
use tokio::sync::mpsc;

use crate::component::{BaseComponent, Component, ComponentKind};
use crate::context::DispatchContext;
use crate::error::FiberError;
use crate::queue::{ResponseQueue, DEFAULT_BUFFER_SIZE};
use crate::request::Request;
use crate::response::Response;
use crate::routing_strategy::{resolve_route_order, RoutingStrategy};

/// Sequential try-primary-then-fallbacks router: abandons a route at its
/// first non-successful response and advances, emitting only the first
/// route's responses whose entire queue was successful.
pub struct LazyRouter {
    base: BaseComponent,
    routes: IndexMap<String, Arc<dyn Component>>,
    strategy: Arc<dyn RoutingStrategy>,
}

impl LazyRouter {
    pub fn new(
        id: impl Into<String>,
        routes: IndexMap<String, Arc<dyn Component>>,
        strategy: Arc<dyn RoutingStrategy>,
    ) -> Self {
        Self {
            base: BaseComponent::new(id, ComponentKind::MultiRoute),
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
impl Component for LazyRouter {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn kind(&self) -> ComponentKind {
        self.base.kind()
    }

    async fn dispatch(&self, ctx: DispatchContext, req: Arc<dyn Request>) -> Arc<ResponseQueue> {
        let ctx = self.base.before_dispatch(ctx, &req).await;

        let (tx, rx) = mpsc::channel(DEFAULT_BUFFER_SIZE);
        let queue = Arc::new(ResponseQueue::from_receiver(rx));

        let strategy = Arc::clone(&self.strategy);
        let routes = self.routes.clone();
        let task_ctx = ctx.clone();
        let task_req = Arc::clone(&req);
        let interceptors = self.base.interceptors_snapshot();
        let task_queue = Arc::clone(&queue);

        tokio::spawn(async move {
            run_lazy(strategy, task_ctx.clone(), task_req.clone(), routes, tx).await;
            for interceptor in &interceptors {
                interceptor.after_completion(&task_ctx, &task_req, &task_queue).await;
            }
        });

        self.base.after_dispatch(&ctx, &req, &queue);
        queue
    }
}

impl crate::multi_route::MultiRouteComponent for LazyRouter {
    fn routes(&self) -> &IndexMap<String, Arc<dyn Component>> {
        &self.routes
    }
}

async fn run_lazy(
    strategy: Arc<dyn RoutingStrategy>,
    ctx: DispatchContext,
    req: Arc<dyn Request>,
    routes: IndexMap<String, Arc<dyn Component>>,
    tx: mpsc::Sender<Response>,
) {
    let protocol = req.protocol();

    let order_rx = resolve_route_order(Arc::clone(&strategy), ctx.clone(), req.clone_request(), routes.clone());

    let resolved = tokio::select! {
        biased;
        _ = ctx.sleep_until_deadline() => {
            let _ = tx.send(Response::from_error(&FiberError::router_strategy_timeout_exceeded(protocol))).await;
            return;
        }
        result = order_rx => {
            match result {
                Ok(Ok(resolved)) => resolved,
                Ok(Err(err)) => {
                    let resp = Response::from_error(&err).with_labels(ctx.labels().clone());
                    let _ = tx.send(resp).await;
                    return;
                }
                Err(_) => {
                    let resp = Response::from_error(&FiberError::request_failed(protocol, "routing strategy task dropped"));
                    let _ = tx.send(resp).await;
                    return;
                }
            }
        }
    };

    if resolved.order.is_empty() {
        let _ = tx
            .send(Response::from_error(&FiberError::router_strategy_returned_empty_routes(protocol)))
            .await;
        return;
    }

    let accumulated_labels = ctx.labels().clone().with_labels(resolved.labels);

    for route_id in &resolved.order {
        let Some(child) = routes.get(route_id) else {
            continue;
        };

        let child_req = req.clone_request();
        let child_ctx = ctx.child(route_id.clone(), child.kind());
        let child_queue = child.dispatch(child_ctx.clone(), child_req).await;

        let mut stream = Box::pin(child_queue.iter());
        let mut collected = Vec::new();
        let mut route_failed = false;

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancellation_token().cancelled() => {
                    return;
                }
                _ = ctx.sleep_until_deadline() => {
                    let _ = tx.send(Response::from_error(&FiberError::request_timeout(protocol))).await;
                    return;
                }
                next = stream.next() => {
                    match next {
                        Some(response) => {
                            if !response.is_success() {
                                route_failed = true;
                                break;
                            }
                            collected.push(response);
                        }
                        None => break,
                    }
                }
            }
        }

        if !route_failed && !collected.is_empty() {
            for response in collected {
                let tagged = response
                    .with_backend_name(route_id.clone())
                    .with_labels(accumulated_labels.clone());
                if tx.send(tagged).await.is_err() {
                    return;
                }
            }
            return;
        }
    }

    let _ = tx
        .send(Response::from_error(&FiberError::service_unavailable(protocol)).with_labels(accumulated_labels))
        .await;
}
