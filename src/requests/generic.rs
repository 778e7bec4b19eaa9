use std::sync::Arc;

use bytes::Bytes;

use crate::backend::Backend;
use crate::error::FiberError;
use crate::protocol::Protocol;
use crate::request::{HeaderMap, Request};

/// The reference [`Request`] implementation: a bytes payload, a header
/// multimap and an operation name tagged with a protocol. Plays the role
/// `http/request.go` and `grpc/request.go` play in the original without
/// implementing an actual wire codec — this crate treats transport clients
/// as opaque [`crate::Dispatcher`]s.
#[derive(Debug, Clone)]
pub struct GenericRequest {
    payload: Bytes,
    headers: HeaderMap,
    operation_name: String,
    protocol: Protocol,
    /// Set by `transform`; the fully qualified destination a `Dispatcher`
    /// should send this request to.
    destination: Option<String>,
    /// The path component `Backend::url` is joined against on `transform`.
    /// Ignored for `Protocol::Grpc`, matching the original's gRPC request
    /// treating the backend endpoint alone as `host:port`.
    request_path: String,
}

impl GenericRequest {
    pub fn new(protocol: Protocol, operation_name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            headers: HeaderMap::new(),
            operation_name: operation_name.into(),
            protocol,
            destination: None,
            request_path: String::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.headers.insert(key.into(), values);
        self
    }

    pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = path.into();
        self
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }
}

impl Request for GenericRequest {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn operation_name(&self) -> &str {
        &self.operation_name
    }

    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn clone_request(&self) -> Arc<dyn Request> {
        Arc::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn transform(&self, backend: &Backend) -> Result<Arc<dyn Request>, FiberError> {
        let path = match self.protocol {
            Protocol::Http => self.request_path.as_str(),
            Protocol::Grpc => "",
        };
        let mut copy = self.clone();
        copy.destination = Some(backend.url(path));
        Ok(Arc::new(copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_then_transform_matches_transform_on_fresh_clone() {
        let req = GenericRequest::new(Protocol::Http, "GET /items", Bytes::new())
            .with_request_path("/items");
        let backend = Backend::new("b1", "http://upstream");

        let via_clone = req.clone_request().transform(&backend).unwrap();
        let direct = req.transform(&backend).unwrap();

        assert_eq!(via_clone.payload(), direct.payload());
        assert_eq!(
            via_clone.as_any().downcast_ref::<GenericRequest>().unwrap().destination(),
            direct.as_any().downcast_ref::<GenericRequest>().unwrap().destination()
        );

        let via_clone = via_clone
            .clone_request()
            .transform(&backend)
            .unwrap();
        assert!(via_clone.payload().is_empty());
    }

    #[test]
    fn grpc_transform_ignores_request_path() {
        let req = GenericRequest::new(Protocol::Grpc, "svc.Method", Bytes::new())
            .with_request_path("/ignored");
        let backend = Backend::new("b1", "grpc-host:9000");

        let transformed = req.transform(&backend).unwrap();
        let transformed = transformed
            .as_any()
            .downcast_ref::<GenericRequest>()
            .unwrap();

        assert_eq!(transformed.destination(), Some("grpc-host:9000"));
    }
}
