use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::context::DispatchContext;
use crate::interceptor::Interceptor;
use crate::queue::ResponseQueue;
use crate::request::Request;

/// The structural tag on every [`Component`]. `MultiRoute` covers both
/// `FanOut` and the Lazy/Eager routers since both own an ordered
/// route-id-to-child mapping; routers are distinguished by owning a
/// `RoutingStrategy` on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Caller,
    Proxy,
    Combiner,
    MultiRoute,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComponentKind::Caller => "Caller",
            ComponentKind::Proxy => "Proxy",
            ComponentKind::Combiner => "Combiner",
            ComponentKind::MultiRoute => "MultiRoute",
        };
        f.write_str(s)
    }
}

/// A node in the dispatch graph: stable identity, a structural kind, and the
/// one operation every node supports.
#[async_trait]
pub trait Component: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> ComponentKind;

    async fn dispatch(&self, ctx: DispatchContext, req: Arc<dyn Request>) -> Arc<ResponseQueue>;
}

/// Shared plumbing every concrete [`Component`] embeds: id, kind, and the
/// append-only interceptor list. Mirrors the original's embedding of a
/// common base struct in every component type rather than duplicating the
/// bookkeeping.
pub struct BaseComponent {
    id: String,
    kind: ComponentKind,
    interceptors: Mutex<Vec<Arc<dyn Interceptor>>>,
}

impl BaseComponent {
    pub fn new(id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            kind,
            interceptors: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Registers an interceptor. Legal only during setup, before the
    /// component is shared across concurrent requests; nothing in this
    /// type enforces that beyond the contract documented on `Interceptor`.
    pub fn add_interceptor(&self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.lock().push(interceptor);
    }

    /// A clone of the current interceptor list, for components that need to
    /// carry it into a spawned task rather than borrowing `self`.
    pub fn interceptors_snapshot(&self) -> Vec<Arc<dyn Interceptor>> {
        self.interceptors.lock().clone()
    }

    /// Runs the sequential BeforeDispatch chain, returning the context each
    /// interceptor may have replaced.
    pub async fn before_dispatch(&self, mut ctx: DispatchContext, req: &Arc<dyn Request>) -> DispatchContext {
        let interceptors = self.interceptors.lock().clone();
        for interceptor in interceptors {
            ctx = interceptor.before_dispatch(ctx, req).await;
        }
        ctx
    }

    /// Fires AfterDispatch for every registered interceptor without
    /// awaiting them, per the "fired and not awaited" contract.
    pub fn after_dispatch(&self, ctx: &DispatchContext, req: &Arc<dyn Request>, queue: &Arc<ResponseQueue>) {
        for interceptor in self.interceptors.lock().clone() {
            let ctx = ctx.clone();
            let req = Arc::clone(req);
            let queue = Arc::clone(queue);
            tokio::spawn(async move {
                interceptor.after_dispatch(&ctx, &req, &queue).await;
            });
        }
    }

    /// Fires AfterCompletion for every registered interceptor without
    /// awaiting them.
    pub fn after_completion(&self, ctx: &DispatchContext, req: &Arc<dyn Request>, queue: &Arc<ResponseQueue>) {
        for interceptor in self.interceptors.lock().clone() {
            let ctx = ctx.clone();
            let req = Arc::clone(req);
            let queue = Arc::clone(queue);
            tokio::spawn(async move {
                interceptor.after_completion(&ctx, &req, &queue).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_matches_go_string_form() {
        assert_eq!(ComponentKind::Caller.to_string(), "Caller");
        assert_eq!(ComponentKind::MultiRoute.to_string(), "MultiRoute");
    }

    #[test]
    fn add_interceptor_is_append_only_visible_via_before_dispatch_count() {
        let base = BaseComponent::new("c1", ComponentKind::Caller);
        assert_eq!(base.interceptors.lock().len(), 0);
    }
}
