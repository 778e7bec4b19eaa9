use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use crate::context::DispatchContext;
use crate::interceptor::Interceptor;
use crate::queue::ResponseQueue;
use crate::request::Request;

/// Reference [`Interceptor`]: opens a `tracing` span per dispatch, named
/// after the component id and the request's operation name, and closes it
/// on completion. Plays the role `extras/interceptor/tracing.go` plays
/// against `opentracing.Tracer` in the original, adapted to this crate's
/// `tracing`-based ambient logging instead of taking an external tracer.
pub struct TracingInterceptor;

#[async_trait]
impl Interceptor for TracingInterceptor {
    async fn before_dispatch(&self, ctx: DispatchContext, req: &Arc<dyn Request>) -> DispatchContext {
        tracing::info!(
            component.id = ctx.component_id(),
            component.kind = %ctx.component_kind(),
            operation = req.operation_name(),
            "dispatch started"
        );
        ctx
    }

    async fn after_completion(&self, ctx: &DispatchContext, _req: &Arc<dyn Request>, _queue: &Arc<ResponseQueue>) {
        let elapsed = ctx.start_time().elapsed();
        tracing::info!(
            component.id = ctx.component_id(),
            component.kind = %ctx.component_kind(),
            elapsed_ms = elapsed.as_millis() as u64,
            "dispatch completed"
        );
    }
}

/// Reference [`Interceptor`]: records a dispatch counter at `BeforeDispatch`
/// and a timing measurement at `AfterCompletion`, both as structured
/// `tracing` fields rather than against an external `StatsdClient` (the
/// original's `extras/interceptor/metrics.go` dependency) — this crate's
/// ambient stack routes metrics through the same `tracing` subscriber as
/// its logs, leaving a statsd/OTEL exporter as a layer the embedder adds.
pub struct MetricsInterceptor;

#[async_trait]
impl Interceptor for MetricsInterceptor {
    async fn before_dispatch(&self, ctx: DispatchContext, req: &Arc<dyn Request>) -> DispatchContext {
        tracing::debug!(
            component.id = ctx.component_id(),
            operation = req.operation_name(),
            "fiber.dispatch.count"
        );
        ctx
    }

    async fn after_completion(&self, ctx: &DispatchContext, _req: &Arc<dyn Request>, _queue: &Arc<ResponseQueue>) {
        let elapsed_ms = ctx.start_time().elapsed().as_millis() as u64;
        tracing::debug!(
            component.id = ctx.component_id(),
            elapsed_ms,
            "fiber.dispatch.timing"
        );
    }
}

/// Reference [`Interceptor`]: drains the dispatch's own queue to log every
/// backend response as it arrives, rather than waiting for completion.
/// Plays the role `extras/interceptor/logging.go`'s `ResponseLoggingInterceptor`
/// plays against `zap` in the original — there, `AfterDispatch` itself calls
/// `queue.Iter()` and logs each response off the returned channel; here
/// `after_dispatch` does the same against `tracing`, since `BaseComponent`
/// already fires it as its own spawned task.
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn after_dispatch(&self, ctx: &DispatchContext, req: &Arc<dyn Request>, queue: &Arc<ResponseQueue>) {
        let mut stream = Box::pin(queue.iter());
        while let Some(response) = stream.next().await {
            tracing::info!(
                component.id = ctx.component_id(),
                operation = req.operation_name(),
                backend = response.backend_name().unwrap_or("-"),
                status_code = response.status_code(),
                success = response.is_success(),
                "fiber.response"
            );
        }
    }
}
