mod eager;
mod lazy;

pub use eager::EagerRouter;
pub use lazy::LazyRouter;
