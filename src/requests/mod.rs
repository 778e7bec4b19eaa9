mod generic;

pub use generic::GenericRequest;
