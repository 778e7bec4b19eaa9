use async_trait::async_trait;
use futures::StreamExt;

use crate::context::DispatchContext;
use crate::error::FiberError;
use crate::queue::ResponseQueue;
use crate::request::Request;
use crate::response::Response;

/// Reduces a [`ResponseQueue`] into a single [`Response`].
#[async_trait]
pub trait FanIn: Send + Sync {
    async fn aggregate(&self, ctx: &DispatchContext, req: &std::sync::Arc<dyn Request>, queue: &ResponseQueue) -> Response;
}

/// Emits the first successful response observed on the queue; if the queue
/// closes without ever producing one, emits a "no responses received"
/// error, reusing `FiberError::service_unavailable` the same way
/// `extras/fastest_response_fan_in.go` does.
pub struct FastestResponseFanIn;

#[async_trait]
impl FanIn for FastestResponseFanIn {
    async fn aggregate(&self, _ctx: &DispatchContext, req: &std::sync::Arc<dyn Request>, queue: &ResponseQueue) -> Response {
        let mut stream = Box::pin(queue.iter());
        while let Some(response) = stream.next().await {
            if response.is_success() {
                return response;
            }
        }
        Response::from_error(&FiberError::service_unavailable(req.protocol()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DispatchContext;
    use crate::component::ComponentKind;
    use crate::protocol::Protocol;
    use crate::requests::GenericRequest;
    use bytes::Bytes;
    use std::sync::Arc;

    fn test_req() -> Arc<dyn Request> {
        Arc::new(GenericRequest::new(Protocol::Http, "op", Bytes::new()))
    }

    #[tokio::test]
    async fn picks_first_success_ignoring_prior_failures() {
        let failed = Response::from_error(&FiberError::request_failed(Protocol::Http, "boom"));
        let queue = ResponseQueue::from_responses(vec![failed, Response::success(b"ok".to_vec())]);
        let ctx = DispatchContext::new("c", ComponentKind::Combiner);

        let result = FastestResponseFanIn.aggregate(&ctx, &test_req(), &queue).await;
        assert!(result.is_success());
        assert_eq!(result.payload(), b"ok");
    }

    #[tokio::test]
    async fn no_success_yields_service_unavailable() {
        let failed = Response::from_error(&FiberError::request_failed(Protocol::Http, "boom"));
        let queue = ResponseQueue::from_responses(vec![failed]);
        let ctx = DispatchContext::new("c", ComponentKind::Combiner);

        let result = FastestResponseFanIn.aggregate(&ctx, &test_req(), &queue).await;
        assert!(!result.is_success());
        assert_eq!(result.status_code(), 503);
    }
}
