/// Transport protocol a [`crate::Request`] belongs to. Status-code mapping for
/// [`crate::error::FiberError`] is keyed on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Grpc,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Grpc => write!(f, "GRPC"),
        }
    }
}
