use std::sync::Arc;

use async_trait::async_trait;

use crate::request::Request;
use crate::response::Response;

/// The leaf operation a [`crate::Caller`] wraps: a pure, single-shot
/// request/response call against a backend client. Implementations own
/// whatever transport client they need; this crate treats the call itself
/// as opaque, matching spec.md's explicit exclusion of wire codecs.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn do_dispatch(&self, req: Arc<dyn Request>) -> Response;
}
