use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use indexmap::IndexMap;
use tokio::sync::mpsc;

use crate::component::{BaseComponent, Component, ComponentKind};
use crate::context::DispatchContext;
use crate::queue::ResponseQueue;
use crate::request::Request;

/// An ordered route-id → child mapping, dispatched concurrently.
///
/// Every child gets its own clone of the request and its own child
/// `DispatchContext` (a linked cancellation token derived from the parent),
/// so no mutable state is shared between children. Responses are tagged
/// with their originating route-id and appended to the output queue in
/// completion order, not route order.
pub struct FanOut {
    base: BaseComponent,
    routes: IndexMap<String, Arc<dyn Component>>,
}

impl FanOut {
    pub fn new(id: impl Into<String>, routes: IndexMap<String, Arc<dyn Component>>) -> Self {
        Self {
            base: BaseComponent::new(id, ComponentKind::MultiRoute),
            routes,
        }
    }

    pub fn with_interceptor(self, interceptor: Arc<dyn crate::interceptor::Interceptor>) -> Self {
        self.base.add_interceptor(interceptor);
        self
    }

    pub fn routes(&self) -> &IndexMap<String, Arc<dyn Component>> {
        &self.routes
    }
}

#[async_trait]
impl Component for FanOut {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn kind(&self) -> ComponentKind {
        self.base.kind()
    }

    async fn dispatch(&self, ctx: DispatchContext, req: Arc<dyn Request>) -> Arc<ResponseQueue> {
        let ctx = self.base.before_dispatch(ctx, &req).await;

        let (tx, rx) = mpsc::channel(self.routes.len().max(1));
        let queue = Arc::new(ResponseQueue::from_receiver(rx));

        let mut children = Vec::with_capacity(self.routes.len());
        for (route_id, child) in &self.routes {
            children.push((route_id.clone(), Arc::clone(child)));
        }

        let supervisor_ctx = ctx.clone();
        let supervisor_req = Arc::clone(&req);
        let completion_interceptors = self.base.interceptors_snapshot();
        let completion_ctx = ctx.clone();
        let completion_req = Arc::clone(&req);
        let completion_queue = Arc::clone(&queue);
        tokio::spawn(async move {
            let mut join_set = tokio::task::JoinSet::new();
            for (route_id, child) in children {
                let tx = tx.clone();
                let child_req = supervisor_req.clone_request();
                let child_ctx = supervisor_ctx.child(route_id.clone(), child.kind());
                join_set.spawn(async move {
                    if child_ctx.is_cancelled() {
                        return;
                    }
                    let child_queue = child.dispatch(child_ctx.clone(), child_req).await;
                    let mut stream = Box::pin(child_queue.iter());
                    loop {
                        tokio::select! {
                            biased;
                            _ = child_ctx.cancellation_token().cancelled() => break,
                            next = stream.next() => {
                                match next {
                                    Some(response) => {
                                        let tagged = response.with_backend_name(route_id.clone());
                                        if tx.send(tagged).await.is_err() {
                                            break;
                                        }
                                    }
                                    None => break,
                                }
                            }
                        }
                    }
                });
            }
            while join_set.join_next().await.is_some() {}
            drop(tx);
            for interceptor in &completion_interceptors {
                interceptor
                    .after_completion(&completion_ctx, &completion_req, &completion_queue)
                    .await;
            }
        });

        self.base.after_dispatch(&ctx, &req, &queue);
        queue
    }
}

impl crate::multi_route::MultiRouteComponent for FanOut {
    fn routes(&self) -> &IndexMap<String, Arc<dyn Component>> {
        &self.routes
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
    use async_trait::async_trait;
    use bytes::Bytes;

    struct FixedDispatcher(&'static str);

    #[async_trait]
    impl Dispatcher for FixedDispatcher {
        async fn do_dispatch(&self, _req: Arc<dyn Request>) -> Response {
            Response::success(self.0.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn responses_are_tagged_with_route_id_and_bounded_by_route_count() {
        let mut routes: IndexMap<String, Arc<dyn Component>> = IndexMap::new();
        routes.insert(
            "route-a".into(),
            Arc::new(Caller::new("a", Arc::new(FixedDispatcher("A")))),
        );
        routes.insert(
            "route-b".into(),
            Arc::new(Caller::new("b", Arc::new(FixedDispatcher("B")))),
        );

        let fan_out = FanOut::new("fo", routes);
        let ctx = DispatchContext::new("fo", ComponentKind::MultiRoute);
        let req: Arc<dyn Request> =
            Arc::new(GenericRequest::new(Protocol::Http, "op", Bytes::new()));

        let queue = fan_out.dispatch(ctx, req).await;
        let mut responses: Vec<_> = queue.iter().collect().await;
        responses.sort_by(|a, b| a.backend_name().cmp(&b.backend_name()));

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].backend_name(), Some("route-a"));
        assert_eq!(responses[1].backend_name(), Some("route-b"));
    }
}
