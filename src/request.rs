use std::sync::Arc;

use indexmap::IndexMap;

use crate::backend::Backend;
use crate::error::FiberError;
use crate::protocol::Protocol;

/// Header/metadata multimap: string key to an ordered list of string values.
pub type HeaderMap = IndexMap<String, Vec<String>>;

/// A protocol-neutral request flowing through the dispatch graph.
///
/// `clone_request` produces an independent copy suitable for handing to a
/// fan-out child without racing other children's retargeting; `transform`
/// returns a new request retargeted at `backend`, leaving `self` untouched.
pub trait Request: Send + Sync + std::any::Any {
    fn payload(&self) -> &[u8];
    fn headers(&self) -> &HeaderMap;
    fn operation_name(&self) -> &str;
    fn protocol(&self) -> Protocol;

    fn clone_request(&self) -> Arc<dyn Request>;
    fn transform(&self, backend: &Backend) -> Result<Arc<dyn Request>, FiberError>;

    /// Downcast support so a protocol-specific caller can recover its
    /// concrete `Request` implementation out of a `dyn Request`.
    fn as_any(&self) -> &dyn std::any::Any;
}

impl std::fmt::Debug for dyn Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("operation_name", &self.operation_name())
            .field("protocol", &self.protocol())
            .finish()
    }
}
