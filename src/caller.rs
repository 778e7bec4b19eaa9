use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::component::{BaseComponent, Component, ComponentKind};
use crate::context::DispatchContext;
use crate::dispatcher::Dispatcher;
use crate::queue::ResponseQueue;
use crate::request::Request;

/// Wraps a [`Dispatcher`] as a leaf [`Component`]: at most one response,
/// produced by a single spawned task that never blocks on a subscriber.
pub struct Caller {
    base: BaseComponent,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Caller {
    pub fn new(id: impl Into<String>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            base: BaseComponent::new(id, ComponentKind::Caller),
            dispatcher,
        }
    }

    pub fn with_interceptor(self, interceptor: Arc<dyn crate::interceptor::Interceptor>) -> Self {
        self.base.add_interceptor(interceptor);
        self
    }
}

#[async_trait]
impl Component for Caller {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn kind(&self) -> ComponentKind {
        self.base.kind()
    }

    async fn dispatch(&self, ctx: DispatchContext, req: Arc<dyn Request>) -> Arc<ResponseQueue> {
        let ctx = self.base.before_dispatch(ctx, &req).await;

        let (tx, rx) = mpsc::channel(1);
        let queue = Arc::new(ResponseQueue::from_receiver(rx));

        let dispatcher = Arc::clone(&self.dispatcher);
        let task_req = Arc::clone(&req);
        let task_ctx = ctx.clone();
        let task_queue = Arc::clone(&queue);
        let interceptors = self.base.interceptors_snapshot();

        tokio::spawn(async move {
            let response = dispatcher.do_dispatch(Arc::clone(&task_req)).await;
            let _ = tx.send(response).await;
            drop(tx);
            for interceptor in &interceptors {
                interceptor.after_completion(&task_ctx, &task_req, &task_queue).await;
            }
        });

        self.base.after_dispatch(&ctx, &req, &queue);
        queue
    }
}
