//! Collection engine, request dispatcher, and the cloneable handle clients
//! hold onto.

pub mod dispatcher;
pub mod engine;
pub mod handle;

pub use engine::Engine;
pub use handle::CollectionHandle;
