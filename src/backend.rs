/// Addressing information a [`crate::Proxy`] retargets a request at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    id: String,
    endpoint: String,
}

impl Backend {
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fully qualified destination for `request_path`. Protocol-specific
    /// `Request` implementations interpret this: HTTP joins it onto the
    /// endpoint, gRPC ignores `request_path` and treats the endpoint alone
    /// as `host:port`.
    pub fn url(&self, request_path: &str) -> String {
        format!("{}{}", self.endpoint, request_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_endpoint_and_path() {
        let backend = Backend::new("b1", "http://upstream:8080");
        assert_eq!(backend.url("/v1/items"), "http://upstream:8080/v1/items");
    }
}
