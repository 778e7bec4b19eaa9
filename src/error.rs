use serde::Serialize;

use crate::protocol::Protocol;

/// gRPC status code numbers this crate cares about (a subset of
/// `google.golang.org/grpc/codes`). Kept local rather than depending on
/// `tonic` since the wire codec itself is out of scope here.
mod grpc_code {
    pub const INVALID_ARGUMENT: i64 = 3;
    pub const DEADLINE_EXCEEDED: i64 = 4;
    pub const UNAVAILABLE: i64 = 14;
    pub const INTERNAL: i64 = 13;
    pub const UNIMPLEMENTED: i64 = 12;
}

/// The closed set of error kinds this library ever produces. Each maps to
/// both an HTTP status and a gRPC status, per spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RouterStrategyTimeoutExceeded,
    RouterStrategyReturnedEmptyRoutes,
    ServiceUnavailable,
    RequestTimeout,
    ReadRequestFailed,
    RequestFailed,
    InvalidInput,
}

impl ErrorKind {
    fn http_status(self) -> i64 {
        use ErrorKind::*;
        match self {
            RouterStrategyTimeoutExceeded => 500,
            RouterStrategyReturnedEmptyRoutes => 501,
            ServiceUnavailable => 503,
            RequestTimeout => 408,
            ReadRequestFailed => 500,
            RequestFailed => 500,
            InvalidInput => 400,
        }
    }

    fn grpc_status(self) -> i64 {
        use ErrorKind::*;
        match self {
            RouterStrategyTimeoutExceeded => grpc_code::INTERNAL,
            RouterStrategyReturnedEmptyRoutes => grpc_code::UNIMPLEMENTED,
            ServiceUnavailable => grpc_code::UNAVAILABLE,
            RequestTimeout => grpc_code::DEADLINE_EXCEEDED,
            ReadRequestFailed => grpc_code::INTERNAL,
            RequestFailed => grpc_code::INTERNAL,
            InvalidInput => grpc_code::INVALID_ARGUMENT,
        }
    }
}

/// A typed, protocol-aware error. Never unwinds the task graph: routers and
/// callers convert it into an error [`crate::Response`] via [`FiberError::into_response`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct FiberError {
    pub kind: ErrorKind,
    pub protocol: Protocol,
    pub message: String,
}

impl FiberError {
    pub fn new(kind: ErrorKind, protocol: Protocol, message: impl Into<String>) -> Self {
        Self {
            kind,
            protocol,
            message: message.into(),
        }
    }

    pub fn router_strategy_timeout_exceeded(protocol: Protocol) -> Self {
        Self::new(
            ErrorKind::RouterStrategyTimeoutExceeded,
            protocol,
            "fiber: routing strategy failed to respond within given timeout",
        )
    }

    pub fn router_strategy_returned_empty_routes(protocol: Protocol) -> Self {
        Self::new(
            ErrorKind::RouterStrategyReturnedEmptyRoutes,
            protocol,
            "fiber: routing strategy returned empty routes list",
        )
    }

    pub fn service_unavailable(protocol: Protocol) -> Self {
        Self::new(
            ErrorKind::ServiceUnavailable,
            protocol,
            "fiber: no responses received",
        )
    }

    pub fn request_timeout(protocol: Protocol) -> Self {
        Self::new(
            ErrorKind::RequestTimeout,
            protocol,
            "fiber: failed to receive a response within configured timeout",
        )
    }

    pub fn read_request_failed(protocol: Protocol, cause: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::ReadRequestFailed,
            protocol,
            format!("fiber: failed to read incoming request: {cause}"),
        )
    }

    pub fn request_failed(protocol: Protocol, cause: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::RequestFailed,
            protocol,
            format!("fiber: request cannot be completed: {cause}"),
        )
    }

    pub fn invalid_input(protocol: Protocol, cause: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidInput,
            protocol,
            format!("fiber: invalid input: {cause}"),
        )
    }

    /// The protocol-aware status code: an HTTP status for `Protocol::Http`,
    /// a gRPC status number for `Protocol::Grpc`.
    pub fn status_code(&self) -> i64 {
        match self.protocol {
            Protocol::Http => self.kind.http_status(),
            Protocol::Grpc => self.kind.grpc_status(),
        }
    }

    /// `{"code": <int>, "error": <string>}`, two-space indented.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        #[derive(Serialize)]
        struct Payload {
            code: i64,
            error: String,
        }
        serde_json::to_vec_pretty(&Payload {
            code: self.status_code(),
            error: self.message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_payload_is_two_space_indented() {
        let err = FiberError::router_strategy_returned_empty_routes(Protocol::Http);
        let json = String::from_utf8(err.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            "{\n  \"code\": 501,\n  \"error\": \"fiber: routing strategy returned empty routes list\"\n}"
        );
    }

    #[test]
    fn grpc_status_uses_grpc_codes() {
        let err = FiberError::request_timeout(Protocol::Grpc);
        assert_eq!(err.status_code(), 4);
    }
}
