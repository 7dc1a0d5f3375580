//! Document store boundary and the embedded in-memory backend.

pub mod filter;
pub mod memory;
pub mod traits;

pub use filter::Filter;
pub use memory::{MemoryCollection, MemoryStore};
pub use traits::{DocumentStore, StoreCollection};
