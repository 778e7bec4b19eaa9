use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use crate::backend::Backend;
use crate::component::{BaseComponent, Component, ComponentKind};
use crate::context::DispatchContext;
use crate::queue::ResponseQueue;
use crate::request::Request;
use crate::response::Response;

/// Retargets a request at a [`Backend`] via `Request::transform`, then
/// delegates to an inner `Component`. Transparent: its `id`/`kind` pass
/// through to the inner component so the graph's structural shape isn't
/// obscured by the retargeting step.
pub struct Proxy {
    base: BaseComponent,
    backend: Backend,
    inner: Arc<dyn Component>,
}

impl Proxy {
    pub fn new(backend: Backend, inner: Arc<dyn Component>) -> Self {
        let id = inner.id().to_string();
        Self {
            base: BaseComponent::new(id, ComponentKind::Proxy),
            backend,
            inner,
        }
    }

    pub fn with_interceptor(self, interceptor: Arc<dyn crate::interceptor::Interceptor>) -> Self {
        self.base.add_interceptor(interceptor);
        self
    }
}

#[async_trait]
impl Component for Proxy {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn kind(&self) -> ComponentKind {
        self.inner.kind()
    }

    async fn dispatch(&self, ctx: DispatchContext, req: Arc<dyn Request>) -> Arc<ResponseQueue> {
        let ctx = self.base.before_dispatch(ctx, &req).await;

        let queue = match req.transform(&self.backend) {
            Ok(transformed) => self.inner.dispatch(ctx.clone(), transformed).await,
            Err(err) => Arc::new(ResponseQueue::from_responses(vec![Response::from_error(&err)])),
        };

        self.base.after_dispatch(&ctx, &req, &queue);

        let interceptors = self.base.interceptors_snapshot();
        if !interceptors.is_empty() {
            let watch_ctx = ctx.clone();
            let watch_req = Arc::clone(&req);
            let watch_queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let mut stream = Box::pin(watch_queue.iter());
                while stream.next().await.is_some() {}
                for interceptor in &interceptors {
                    interceptor.after_completion(&watch_ctx, &watch_req, &watch_queue).await;
                }
            });
        }

        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use crate::context::DispatchContext;
    use crate::dispatcher::Dispatcher;
    use crate::protocol::Protocol;
    use crate::requests::GenericRequest;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;

    struct EchoDispatcher;

    #[async_trait]
    impl Dispatcher for EchoDispatcher {
        async fn do_dispatch(&self, req: Arc<dyn Request>) -> Response {
            Response::success(req.payload().to_vec())
        }
    }

    #[tokio::test]
    async fn successful_transform_delegates_to_inner_component() {
        use crate::caller::Caller;

        let caller = Arc::new(Caller::new("backend-1", Arc::new(EchoDispatcher)));
        let proxy = Proxy::new(Backend::new("b1", "http://upstream"), caller);

        let ctx = DispatchContext::new("proxy", ComponentKind::Proxy);
        let req: Arc<dyn Request> = Arc::new(
            GenericRequest::new(Protocol::Http, "GET /x", Bytes::from_static(b"hi"))
                .with_request_path("/x"),
        );

        let queue = proxy.dispatch(ctx, req).await;
        let responses: Vec<_> = queue.iter().collect().await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].payload(), b"hi");
    }
}
