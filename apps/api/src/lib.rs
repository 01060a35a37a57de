pub mod router;
pub mod store;

pub use router::create_router;
pub use store::{build_store, unique_indexes};
