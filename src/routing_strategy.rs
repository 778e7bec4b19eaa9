use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::oneshot;

use crate::component::Component;
use crate::context::DispatchContext;
use crate::error::FiberError;
use crate::labels::Labels;
use crate::request::Request;

/// `SelectRoute`'s answer: an optional primary route-id, an ordered list of
/// fallback route-ids, and any labels the strategy wants published on
/// outgoing responses.
pub struct RouteSelection {
    pub primary: Option<String>,
    pub fallbacks: Vec<String>,
    pub labels: Labels,
}

impl RouteSelection {
    pub fn new(primary: Option<String>, fallbacks: Vec<String>, labels: Labels) -> Self {
        Self {
            primary,
            fallbacks,
            labels,
        }
    }

    /// Primary prepended to fallbacks, deduplicated by first occurrence.
    pub fn ordered_routes(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut order = Vec::with_capacity(self.fallbacks.len() + 1);
        if let Some(primary) = &self.primary {
            if seen.insert(primary.clone()) {
                order.push(primary.clone());
            }
        }
        for fallback in &self.fallbacks {
            if seen.insert(fallback.clone()) {
                order.push(fallback.clone());
            }
        }
        order
    }
}

/// Decides which routes a [`crate::router::LazyRouter`] or
/// [`crate::router::EagerRouter`] should try, and in what order.
#[async_trait]
pub trait RoutingStrategy: Send + Sync {
    async fn select_route(
        &self,
        ctx: &DispatchContext,
        req: &Arc<dyn Request>,
        routes: &IndexMap<String, Arc<dyn Component>>,
    ) -> Result<RouteSelection, FiberError>;
}

/// One resolved route order, ready for a router's trying/scanning loop.
pub struct ResolvedOrder {
    pub order: Vec<String>,
    pub labels: Labels,
}

/// Runs `strategy.select_route` in a background task and delivers its
/// result on a oneshot channel, letting the router consume it under a
/// `tokio::select!` alongside its deadline and cancellation.
///
/// A panicking strategy is caught by `tokio::spawn`'s own `JoinHandle`
/// error and converted into a generic `RequestFailed`, matching the "no
/// error is ever silently dropped" contract.
pub fn resolve_route_order(
    strategy: Arc<dyn RoutingStrategy>,
    ctx: DispatchContext,
    req: Arc<dyn Request>,
    routes: IndexMap<String, Arc<dyn Component>>,
) -> oneshot::Receiver<Result<ResolvedOrder, FiberError>> {
    let (tx, rx) = oneshot::channel();
    let protocol = req.protocol();
    tokio::spawn(async move {
        let handle = tokio::spawn(async move { strategy.select_route(&ctx, &req, &routes).await });
        let result = match handle.await {
            Ok(Ok(selection)) => Ok(ResolvedOrder {
                order: selection.ordered_routes(),
                labels: selection.labels,
            }),
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(FiberError::request_failed(protocol, join_err)),
        };
        let _ = tx.send(result);
    });
    rx
}
