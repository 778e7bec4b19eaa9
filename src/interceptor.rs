use std::sync::Arc;

use async_trait::async_trait;

use crate::context::DispatchContext;
use crate::queue::ResponseQueue;
use crate::request::Request;

/// Observes or augments a dispatch without being part of the routing
/// decision itself.
///
/// `before_dispatch` runs sequentially and its returned context replaces the
/// propagated one, so an interceptor can attach labels or a tighter
/// deadline before the component acts. `after_dispatch`/`after_completion`
/// are fired by the component as spawned tasks and never awaited by the
/// caller; implementations that need to block on the queue do so inside
/// their own task via `queue.iter()`.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn before_dispatch(&self, ctx: DispatchContext, _req: &Arc<dyn Request>) -> DispatchContext {
        ctx
    }

    async fn after_dispatch(&self, _ctx: &DispatchContext, _req: &Arc<dyn Request>, _queue: &Arc<ResponseQueue>) {}

    async fn after_completion(&self, _ctx: &DispatchContext, _req: &Arc<dyn Request>, _queue: &Arc<ResponseQueue>) {}
}
