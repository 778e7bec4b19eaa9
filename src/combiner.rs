use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::component::{BaseComponent, Component, ComponentKind};
use crate::context::DispatchContext;
use crate::fan_in::FanIn;
use crate::fan_out::FanOut;
use crate::queue::ResponseQueue;
use crate::request::Request;

/// A [`FanOut`] composed with a [`FanIn`]: dispatches every route
/// concurrently and reduces the resulting queue to a single response.
pub struct Combiner {
    base: BaseComponent,
    fan_out: FanOut,
    fan_in: Arc<dyn FanIn>,
}

impl Combiner {
    pub fn new(id: impl Into<String>, routes: IndexMap<String, Arc<dyn Component>>, fan_in: Arc<dyn FanIn>) -> Self {
        let id = id.into();
        Self {
            base: BaseComponent::new(id.clone(), ComponentKind::Combiner),
            fan_out: FanOut::new(id, routes),
            fan_in,
        }
    }

    pub fn with_interceptor(self, interceptor: Arc<dyn crate::interceptor::Interceptor>) -> Self {
        self.base.add_interceptor(interceptor);
        self
    }
}

#[async_trait]
impl Component for Combiner {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn kind(&self) -> ComponentKind {
        self.base.kind()
    }

    async fn dispatch(&self, ctx: DispatchContext, req: Arc<dyn Request>) -> Arc<ResponseQueue> {
        let ctx = self.base.before_dispatch(ctx, &req).await;

        let fan_out_queue = self.fan_out.dispatch(ctx.clone(), Arc::clone(&req)).await;
        let result = self.fan_in.aggregate(&ctx, &req, &fan_out_queue).await;
        let queue = Arc::new(ResponseQueue::from_responses(vec![result]));

        self.base.after_dispatch(&ctx, &req, &queue);
        self.base.after_completion(&ctx, &req, &queue);
        queue
    }
}

impl crate::multi_route::MultiRouteComponent for Combiner {
    fn routes(&self) -> &IndexMap<String, Arc<dyn Component>> {
        self.fan_out.routes()
    }
}
