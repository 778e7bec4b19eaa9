use crate::error::FiberError;
use crate::labels::Labels;

/// A single reply flowing out of a [`crate::Component`] into a
/// [`crate::queue::ResponseQueue`].
///
/// Unlike [`crate::Request`], a `Response` never needs to be shared behind a
/// trait object: every component produces this concrete type, so there is no
/// analogue to `Request`'s clone/transform split here.
#[derive(Debug, Clone)]
pub struct Response {
    success: bool,
    payload: Vec<u8>,
    status_code: i64,
    backend_name: Option<String>,
    labels: Labels,
}

impl Response {
    /// A successful response carrying `payload`. Defaults to HTTP 200 and no
    /// backend name; callers attach both via the builder methods below.
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            payload: payload.into(),
            status_code: 200,
            backend_name: None,
            labels: Labels::new(),
        }
    }

    /// Builds a failed `Response` from a `FiberError`, using the error's own
    /// protocol-aware status code and JSON payload.
    pub fn from_error(err: &FiberError) -> Self {
        let payload = err.to_json().unwrap_or_else(|_| err.message.as_bytes().to_vec());
        Self {
            success: false,
            payload,
            status_code: err.status_code(),
            backend_name: None,
            labels: Labels::new(),
        }
    }

    pub fn with_status_code(mut self, status_code: i64) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_backend_name(mut self, backend_name: impl Into<String>) -> Self {
        self.backend_name = Some(backend_name.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.labels = self.labels.with_label(key, values);
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = self.labels.with_labels(labels);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn status_code(&self) -> i64 {
        self.status_code
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.backend_name.as_deref()
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }
}
